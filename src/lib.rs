#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod core;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod quality;

pub use config::Config;
pub use core::{AnalysisResponse, CalibrationCurve, InputMeta, Pipeline, RequestContext};
pub use error::{GaugeError, PipelineError, Result};
