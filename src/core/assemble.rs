//! Response assembler: the single defaulting/normalization step.
//!
//! Converts the partial, pipeline-processed record into the complete
//! `AnalysisResponse` exactly once, so downstream consumers never branch on
//! absence. Tier metadata is rebuilt from the caller's request context here:
//! the upstream model must not be able to self-grant premium depth.

use crate::core::calibrate::CalibrationCurve;
use crate::core::ingest::{RawAnalysis, RawComposite, RawFeature};
use crate::core::potential::PotentialOutcome;
use crate::core::types::{
    AnalysisResponse, CompositeRating, Confidence, Feature, Overall, PhotoQuality,
    PotentialBlock, Safety, SubRating, Tier, Tone,
};
use crate::error::PipelineError;

/// Default photo-quality score when the model omitted the block entirely.
const DEFAULT_QUALITY_SCORE: u8 = 50;

/// Assemble the validated response.
///
/// `current` is the already-calibrated overall current score. Fails with
/// `SchemaViolation` when no record satisfying the output schema can be
/// produced even after defaulting.
pub fn assemble(
    raw: RawAnalysis,
    current: f64,
    outcome: PotentialOutcome,
    premium: bool,
    curve: &CalibrationCurve,
) -> Result<AnalysisResponse, PipelineError> {
    if raw.features.is_empty() {
        return Err(PipelineError::schema("features", "empty feature list"));
    }

    let tone = match raw.safety.tone.as_deref() {
        None | Some("neutral") => Tone::Neutral,
        Some(other) => {
            return Err(PipelineError::schema(
                "safety.tone",
                format!("unrecognized value `{other}`, expected `neutral`"),
            ));
        }
    };

    let features = raw
        .features
        .into_iter()
        .map(|f| complete_feature(f, premium, curve))
        .collect::<Result<Vec<_>, _>>()?;

    let potential_score10 = outcome.potential;
    if current > potential_score10 {
        return Err(PipelineError::schema(
            "overall",
            format!("current {current} exceeds potential {potential_score10}"),
        ));
    }

    // Ceiling is expanded-depth only; clamping restores the envelope
    // invariant current <= potential <= ceiling <= 10.
    let ceiling_score10 = premium
        .then_some(raw.overall.ceiling_score10)
        .flatten()
        .map(|c| c.clamp(potential_score10, 10.0));

    let overall = Overall {
        current_score10: current,
        potential_score10,
        ceiling_score10,
        confidence: raw.overall.confidence.unwrap_or(Confidence::Medium),
        summary: raw.overall.summary.unwrap_or_default(),
        calibration_note: raw
            .overall
            .calibration_note
            .unwrap_or_else(|| Safety::DEFAULT_SCORING_CONTEXT.to_string()),
    };

    let photo_quality = PhotoQuality {
        score: raw
            .photo_quality
            .score
            .map(|s| s.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(DEFAULT_QUALITY_SCORE),
        issues: raw.photo_quality.issues,
        assessment_limitations: raw.photo_quality.assessment_limitations,
    };

    Ok(AnalysisResponse {
        photo_quality,
        overall,
        potential_range: outcome.range,
        potential: PotentialBlock {
            total_possible_gain: outcome.total_gain,
            deltas: outcome.retained,
            top3_levers: outcome.top3,
        },
        features,
        harmony: complete_composite(raw.harmony, curve),
        symmetry: complete_composite(raw.symmetry, curve),
        hair: complete_composite(raw.hair, curve),
        safety: Safety {
            disclaimer: raw
                .safety
                .disclaimer
                .unwrap_or_else(|| Safety::DEFAULT_DISCLAIMER.to_string()),
            tone,
            scoring_context: raw
                .safety
                .scoring_context
                .unwrap_or_else(|| Safety::DEFAULT_SCORING_CONTEXT.to_string()),
        },
        tier: Tier::from_premium(premium),
    })
}

fn complete_feature(
    raw: RawFeature,
    premium: bool,
    curve: &CalibrationCurve,
) -> Result<Feature, PipelineError> {
    let rating10 = raw.rating10.unwrap_or(curve.anchor);
    if !(0.0..=10.0).contains(&rating10) {
        return Err(PipelineError::schema(
            format!("features.{}", raw.key),
            format!("rating {rating10} outside [0,10]"),
        ));
    }

    // Sub-ratings are expanded-depth content regardless of what upstream
    // volunteered.
    let sub_features = if premium {
        raw.sub_features
            .into_iter()
            .map(|s| SubRating {
                name: s.name,
                rating10: s.rating10.unwrap_or(curve.anchor),
                confidence: s.confidence.unwrap_or(Confidence::Medium),
                note: s.note.unwrap_or_default(),
                is_strength: s.is_strength,
            })
            .collect()
    } else {
        Vec::new()
    };

    let label = raw.label.unwrap_or_else(|| humanize(&raw.key));

    Ok(Feature {
        key: raw.key,
        label,
        rating10,
        confidence: raw.confidence.unwrap_or(Confidence::Medium),
        photo_limitations: raw.photo_limitations,
        strengths: raw.strengths,
        holding_back: raw.holding_back,
        sub_features,
        fixes: raw.fixes,
    })
}

fn complete_composite(raw: RawComposite, curve: &CalibrationCurve) -> CompositeRating {
    CompositeRating {
        rating10: raw.rating10.unwrap_or(curve.anchor),
        confidence: raw.confidence.unwrap_or(Confidence::Medium),
        notes: raw.notes,
        suggestions: raw.suggestions,
    }
}

/// Display label from a snake_case key: `eye_area` -> `Eye Area`.
fn humanize(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::RawSafety;
    use crate::core::potential;
    use crate::core::types::Depth;

    fn outcome(current: f64) -> PotentialOutcome {
        potential::compute(current, vec![], None, None)
    }

    fn raw_with_feature() -> RawAnalysis {
        RawAnalysis {
            features: vec![RawFeature {
                key: "eye_area".into(),
                rating10: Some(5.8),
                ..RawFeature::default()
            }],
            ..RawAnalysis::default()
        }
    }

    #[test]
    fn empty_feature_list_is_schema_violation() {
        let err = assemble(
            RawAnalysis::default(),
            5.5,
            outcome(5.5),
            false,
            &CalibrationCurve::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaViolation { .. }));
    }

    #[test]
    fn non_neutral_tone_is_schema_violation() {
        let mut raw = raw_with_feature();
        raw.safety = RawSafety {
            tone: Some("brutal".into()),
            ..RawSafety::default()
        };
        let err = assemble(raw, 5.5, outcome(5.5), false, &CalibrationCurve::default())
            .unwrap_err();
        assert!(err.to_string().contains("safety.tone"));
    }

    #[test]
    fn defaults_fill_every_optional_field() {
        let response = assemble(
            raw_with_feature(),
            5.5,
            outcome(5.5),
            false,
            &CalibrationCurve::default(),
        )
        .unwrap();

        let feature = &response.features[0];
        assert_eq!(feature.label, "Eye Area");
        assert_eq!(feature.confidence, Confidence::Medium);
        assert!(feature.strengths.is_empty());
        assert!(feature.photo_limitations.is_empty());
        assert_eq!(response.safety.disclaimer, Safety::DEFAULT_DISCLAIMER);
        assert_eq!(response.safety.tone, Tone::Neutral);
        assert_eq!(response.photo_quality.score, DEFAULT_QUALITY_SCORE);
        assert_eq!(response.harmony.rating10, 5.5);
    }

    #[test]
    fn tier_comes_from_request_context_not_upstream() {
        let response = assemble(
            raw_with_feature(),
            5.5,
            outcome(5.5),
            true,
            &CalibrationCurve::default(),
        )
        .unwrap();
        assert!(response.tier.is_premium);
        assert_eq!(response.tier.depth, Depth::Premium);

        let response = assemble(
            raw_with_feature(),
            5.5,
            outcome(5.5),
            false,
            &CalibrationCurve::default(),
        )
        .unwrap();
        assert!(!response.tier.is_premium);
        assert_eq!(response.tier.depth, Depth::Free);
    }

    #[test]
    fn free_tier_strips_expanded_depth_content() {
        let mut raw = raw_with_feature();
        raw.features[0].sub_features.push(crate::core::ingest::RawSubRating {
            name: "texture".into(),
            rating10: Some(6.0),
            confidence: None,
            note: None,
            is_strength: true,
        });
        raw.overall.ceiling_score10 = Some(9.0);

        let response = assemble(
            raw.clone(),
            5.5,
            outcome(5.5),
            false,
            &CalibrationCurve::default(),
        )
        .unwrap();
        assert!(response.features[0].sub_features.is_empty());
        assert_eq!(response.overall.ceiling_score10, None);

        let response = assemble(raw, 5.5, outcome(5.5), true, &CalibrationCurve::default())
            .unwrap();
        assert_eq!(response.features[0].sub_features.len(), 1);
        assert_eq!(response.overall.ceiling_score10, Some(9.0));
    }

    #[test]
    fn ceiling_is_clamped_into_the_envelope() {
        let mut raw = raw_with_feature();
        raw.overall.ceiling_score10 = Some(2.0);
        let response = assemble(raw, 5.5, outcome(5.5), true, &CalibrationCurve::default())
            .unwrap();
        // current <= potential <= ceiling must survive a nonsense upstream
        // ceiling.
        assert_eq!(response.overall.ceiling_score10, Some(5.5));
    }

    #[test]
    fn quality_score_clamps_to_percent_range() {
        let mut raw = raw_with_feature();
        raw.photo_quality.score = Some(180.0);
        let response = assemble(raw, 5.5, outcome(5.5), false, &CalibrationCurve::default())
            .unwrap();
        assert_eq!(response.photo_quality.score, 100);
    }

    #[test]
    fn humanize_builds_display_labels() {
        assert_eq!(humanize("skin"), "Skin");
        assert_eq!(humanize("eye_area"), "Eye Area");
        assert_eq!(humanize("nose-projection"), "Nose Projection");
    }
}
