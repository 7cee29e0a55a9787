//! Immutable registry of improvement levers.
//!
//! Each lever is a named, bounded category of realistic improvement with a
//! registered minimum/maximum achievable score delta. The registry is pure
//! reference data: defined once at process start, read-only thereafter, safe
//! to share across concurrent requests without locking.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use strum::{Display, EnumIter, EnumString};

/// Closed identifier set for improvement levers. Upstream output naming
/// anything outside this set is dropped at ingest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeverId {
    Skin,
    Hair,
    UnderEye,
    Brows,
    BodyFat,
    Posture,
    Nose,
}

/// One registry entry: a human label and the permitted delta range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lever {
    pub id: LeverId,
    pub label: &'static str,
    pub min_delta: f64,
    pub max_delta: f64,
}

impl Lever {
    /// Whether `delta` lies within this lever's registered range.
    pub fn admits(&self, delta: f64) -> bool {
        delta >= self.min_delta && delta <= self.max_delta
    }
}

static REGISTRY: LazyLock<HashMap<LeverId, Lever>> = LazyLock::new(|| {
    [
        (LeverId::Skin, "Skin improvement", 0.2, 1.0),
        (LeverId::Hair, "Hair fix", 0.2, 0.8),
        (LeverId::UnderEye, "Under-eye treatment", 0.1, 0.6),
        (LeverId::Brows, "Brow grooming", 0.1, 0.5),
        (LeverId::BodyFat, "Body composition (face)", 0.2, 0.8),
        (LeverId::Posture, "Posture correction", 0.1, 0.4),
        (LeverId::Nose, "Nose presentation", 0.1, 0.2),
    ]
    .into_iter()
    .map(|(id, label, min_delta, max_delta)| {
        (
            id,
            Lever {
                id,
                label,
                min_delta,
                max_delta,
            },
        )
    })
    .collect()
});

/// Look up the registry entry for a lever.
pub fn lever(id: LeverId) -> &'static Lever {
    &REGISTRY[&id]
}
