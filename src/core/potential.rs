//! Potential calculator: bounded achievable gain from validated levers.
//!
//! Pure function of its inputs and the immutable lever registry. Upstream
//! deltas are untrusted, so magnitude validation is a defensive drop rather
//! than a hard failure: the offending delta is logged and the pipeline
//! continues with the remaining valid ones.

use crate::core::calibrate::round1;
use crate::core::ingest::RawRange;
use crate::core::levers;
use crate::core::types::{Confidence, ImprovementDelta, PotentialRange, RankedLever};

const RANGE_NOTE: &str =
    "Based on modifiable levers (hair, skin, brows, posture, photo optimization)";

/// Result of the potential computation, consumed by the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialOutcome {
    pub total_gain: f64,
    pub potential: f64,
    pub range: PotentialRange,
    pub top3: Vec<RankedLever>,
    pub retained: Vec<ImprovementDelta>,
}

/// Compute the potential score, the top-3 lever ranking and the
/// current→potential range.
///
/// Guarantees `current <= range.min <= potential <= range.max <= 10`; inputs
/// that would violate this are clamped back into shape.
pub fn compute(
    current: f64,
    deltas: Vec<ImprovementDelta>,
    upstream_potential: Option<f64>,
    upstream_range: Option<RawRange>,
) -> PotentialOutcome {
    let retained: Vec<ImprovementDelta> = deltas
        .into_iter()
        .filter(|d| {
            let lever = levers::lever(d.lever);
            if lever.admits(d.delta) {
                true
            } else {
                tracing::warn!(
                    lever = %d.lever,
                    delta = d.delta,
                    min = lever.min_delta,
                    max = lever.max_delta,
                    "lever range violation, dropping delta"
                );
                false
            }
        })
        .collect();

    let total_gain = round1(retained.iter().map(|d| d.delta).sum());

    let potential = if retained.is_empty() {
        // No validated levers: fall back to the upstream estimate, bounded
        // by the envelope invariant.
        upstream_potential
            .map(|p| round1(p.clamp(current, 10.0)))
            .unwrap_or(current)
    } else {
        round1((current + total_gain).min(10.0))
    };

    let top3 = rank_top3(&retained);
    let range = build_range(current, potential, upstream_range);

    PotentialOutcome {
        total_gain,
        potential,
        range,
        top3,
        retained,
    }
}

/// The 3 largest-magnitude deltas, priority 1..3. Stable sort: ties rank in
/// declaration order, so re-running on the same list always returns the same
/// ranking.
fn rank_top3(retained: &[ImprovementDelta]) -> Vec<RankedLever> {
    let mut ordered: Vec<&ImprovementDelta> = retained.iter().collect();
    ordered.sort_by(|a, b| b.delta.partial_cmp(&a.delta).unwrap_or(std::cmp::Ordering::Equal));

    ordered
        .into_iter()
        .take(3)
        .enumerate()
        .map(|(i, d)| RankedLever {
            lever: d.lever,
            delta: d.delta,
            timeline: d.timeline.clone(),
            priority: i as u8 + 1,
        })
        .collect()
}

/// Use the upstream-supplied range when present; otherwise derive the
/// widened fallback band. Either way the bounds are clamped so the ordering
/// invariant holds.
fn build_range(current: f64, potential: f64, upstream: Option<RawRange>) -> PotentialRange {
    let (min, max, confidence, note) = match upstream {
        Some(range) => (
            range.min,
            range.max,
            range.confidence.unwrap_or(Confidence::Medium),
            range.note.unwrap_or_else(|| RANGE_NOTE.to_string()),
        ),
        None => (
            (current + 0.5).min(potential - 0.3),
            (potential + 0.5).min(10.0),
            Confidence::Medium,
            RANGE_NOTE.to_string(),
        ),
    };

    PotentialRange {
        min: round1(min.clamp(current, potential)),
        max: round1(max.clamp(potential, 10.0)),
        confidence,
        note,
    }
}
