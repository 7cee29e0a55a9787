//! The score-calibration and potential-delta pipeline.
//!
//! Deterministic post-processing applied to non-deterministic model output:
//! ingest (validate/coerce) → calibrate (compress inflated ratings) →
//! potential (bounded achievable gain) → annotate (confidence/limitations) →
//! assemble (defaults + schema enforcement). Every stage is pure and
//! in-memory; one invocation per inbound request with no shared mutable
//! state besides the read-only lever registry.

pub mod annotate;
pub mod assemble;
pub mod calibrate;
pub mod fallback;
pub mod ingest;
pub mod levers;
pub mod potential;
pub mod types;

pub use annotate::{AngleQuality, InputMeta, LightingQuality};
pub use calibrate::CalibrationCurve;
pub use fallback::fallback_response;
pub use types::AnalysisResponse;

use crate::error::PipelineError;
use serde_json::Value;

/// Per-request context the pipeline trusts over anything upstream claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    pub premium_enabled: bool,
    pub input: InputMeta,
}

/// The assembled pipeline. Cheap to clone; holds only the calibration
/// constants.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    curve: CalibrationCurve,
}

impl Pipeline {
    pub fn new(curve: CalibrationCurve) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &CalibrationCurve {
        &self.curve
    }

    /// Run the full pipeline over the model's text output.
    pub fn run_text(
        &self,
        text: &str,
        ctx: &RequestContext,
    ) -> Result<AnalysisResponse, PipelineError> {
        let payload = ingest::parse_payload(text)?;
        self.run(&payload, ctx)
    }

    /// Run the full pipeline over an already-parsed payload.
    pub fn run(&self, payload: &Value, ctx: &RequestContext) -> Result<AnalysisResponse, PipelineError> {
        let mut raw = ingest::parse(payload)?;

        calibrate::calibrate_features(&mut raw.features, &self.curve);
        for composite in [&mut raw.harmony, &mut raw.symmetry, &mut raw.hair] {
            if let Some(rating) = composite.rating10 {
                composite.rating10 = Some(calibrate::calibrate_single(rating, &self.curve));
            }
        }

        let current = raw
            .overall
            .current_score10
            .map(|r| calibrate::calibrate_single(r, &self.curve))
            .unwrap_or(self.curve.anchor);
        let upstream_potential = raw
            .overall
            .potential_score10
            .map(|p| calibrate::calibrate_single(p, &self.curve));

        let outcome = potential::compute(
            current,
            std::mem::take(&mut raw.deltas),
            upstream_potential,
            raw.potential_range.take(),
        );

        let meta = ctx.input.refine_from_issues(&raw.photo_quality.issues);
        annotate::annotate(&mut raw, &meta);

        assemble::assemble(raw, current, outcome, ctx.premium_enabled, &self.curve)
    }
}
