//! Confidence / limitation annotator.
//!
//! A deterministic rule table maps input-quality deficiencies to the subset
//! of ratings they affect. Annotation is additive and idempotent: notes are
//! deduplicated, confidence is only ever downgraded, and numeric ratings are
//! never modified — keeping "what the score is" separate from "how much to
//! trust it".

use crate::core::ingest::RawAnalysis;
use crate::core::types::{Confidence, PhotoQualityIssue};
use serde::{Deserialize, Serialize};

const SIDE_MISSING_GLOBAL: &str =
    "Chin projection cannot be accurately assessed without side profile";
const SIDE_MISSING_FEATURE: &str =
    "Projection cannot be accurately assessed without a side profile photo";
const SELFIE_DISTORTION: &str = "Selfie angle creates 10-15% distortion";
const UNEVEN_LIGHTING: &str = "Uneven lighting limits shading cues for contour assessment";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleQuality {
    EyeLevel,
    Selfie,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingQuality {
    Even,
    Uneven,
    #[default]
    Unknown,
}

/// Structured metadata about input completeness, assembled by the caller
/// from the request (was a profile photo supplied?) and refined from the
/// model's own photo-quality report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMeta {
    pub has_secondary_photo: bool,
    pub angle: AngleQuality,
    pub lighting: LightingQuality,
}

impl InputMeta {
    /// The request body carries no capture metadata, so angle and lighting
    /// fall back to what the model itself reported about the photo.
    pub fn refine_from_issues(mut self, issues: &[PhotoQualityIssue]) -> Self {
        if self.angle == AngleQuality::Unknown
            && issues.contains(&PhotoQualityIssue::AngleDistortion)
        {
            self.angle = AngleQuality::Selfie;
        }
        if self.lighting == LightingQuality::Unknown
            && issues.contains(&PhotoQualityIssue::InconsistentLighting)
        {
            self.lighting = LightingQuality::Uneven;
        }
        self
    }
}

/// Apply the rule table. Safe to re-run: a second pass adds nothing.
pub fn annotate(raw: &mut RawAnalysis, meta: &InputMeta) {
    if !meta.has_secondary_photo {
        for feature in raw
            .features
            .iter_mut()
            .filter(|f| depends_on_projection(&f.key))
        {
            downgrade(&mut feature.confidence, Confidence::Low);
            push_unique(&mut feature.photo_limitations, SIDE_MISSING_FEATURE);
        }
        if !raw.photo_quality.issues.contains(&PhotoQualityIssue::SideMissing) {
            raw.photo_quality.issues.push(PhotoQualityIssue::SideMissing);
        }
        push_unique(
            &mut raw.photo_quality.assessment_limitations,
            SIDE_MISSING_GLOBAL,
        );
    }

    if meta.angle == AngleQuality::Selfie {
        for feature in raw.features.iter_mut().filter(|f| is_symmetry_key(&f.key)) {
            downgrade(&mut feature.confidence, Confidence::Low);
            push_unique(&mut feature.photo_limitations, SELFIE_DISTORTION);
        }
        downgrade(&mut raw.symmetry.confidence, Confidence::Low);
        push_unique(&mut raw.symmetry.notes, SELFIE_DISTORTION);
    }

    if meta.lighting == LightingQuality::Uneven {
        for feature in raw
            .features
            .iter_mut()
            .filter(|f| depends_on_shading(&f.key))
        {
            downgrade(&mut feature.confidence, Confidence::Medium);
            push_unique(&mut feature.photo_limitations, UNEVEN_LIGHTING);
        }
    }
}

/// Features whose assessment needs depth information from a profile view.
fn depends_on_projection(key: &str) -> bool {
    key == "chin" || key.starts_with("nose")
}

fn is_symmetry_key(key: &str) -> bool {
    key.contains("symmetry")
}

/// Features read from shadow and contour cues.
fn depends_on_shading(key: &str) -> bool {
    key == "cheekbones" || key == "jawline"
}

fn downgrade(confidence: &mut Option<Confidence>, at_most: Confidence) {
    *confidence = Some(confidence.map_or(at_most, |current| current.min(at_most)));
}

fn push_unique(notes: &mut Vec<String>, note: &str) {
    if !notes.iter().any(|existing| existing == note) {
        notes.push(note.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::RawFeature;

    fn feature(key: &str, confidence: Option<Confidence>) -> RawFeature {
        RawFeature {
            key: key.to_string(),
            rating10: Some(5.0),
            confidence,
            ..RawFeature::default()
        }
    }

    fn analysis(features: Vec<RawFeature>) -> RawAnalysis {
        RawAnalysis {
            features,
            ..RawAnalysis::default()
        }
    }

    #[test]
    fn missing_side_photo_forces_low_on_projection_features() {
        let mut raw = analysis(vec![
            feature("chin", Some(Confidence::High)),
            feature("nose_projection", Some(Confidence::Medium)),
            feature("skin", Some(Confidence::High)),
        ]);
        annotate(&mut raw, &InputMeta::default());

        assert_eq!(raw.features[0].confidence, Some(Confidence::Low));
        assert_eq!(raw.features[1].confidence, Some(Confidence::Low));
        assert!(!raw.features[0].photo_limitations.is_empty());
        assert!(raw.features[0].photo_limitations[0].contains("side profile"));
        // Unrelated features stay untouched.
        assert_eq!(raw.features[2].confidence, Some(Confidence::High));
        assert!(raw.photo_quality.issues.contains(&PhotoQualityIssue::SideMissing));
        assert!(!raw.photo_quality.assessment_limitations.is_empty());
    }

    #[test]
    fn side_photo_present_adds_nothing() {
        let mut raw = analysis(vec![feature("chin", Some(Confidence::High))]);
        let meta = InputMeta {
            has_secondary_photo: true,
            ..InputMeta::default()
        };
        annotate(&mut raw, &meta);
        assert_eq!(raw.features[0].confidence, Some(Confidence::High));
        assert!(raw.photo_quality.issues.is_empty());
    }

    #[test]
    fn selfie_angle_hits_symmetry_only() {
        let mut raw = analysis(vec![
            feature("symmetry", Some(Confidence::High)),
            feature("skin", Some(Confidence::High)),
        ]);
        raw.symmetry.confidence = Some(Confidence::High);
        let meta = InputMeta {
            has_secondary_photo: true,
            angle: AngleQuality::Selfie,
            ..InputMeta::default()
        };
        annotate(&mut raw, &meta);

        assert_eq!(raw.features[0].confidence, Some(Confidence::Low));
        assert_eq!(raw.features[1].confidence, Some(Confidence::High));
        assert_eq!(raw.symmetry.confidence, Some(Confidence::Low));
        assert!(raw.symmetry.notes.iter().any(|n| n.contains("distortion")));
    }

    #[test]
    fn uneven_lighting_downgrades_to_medium_not_low() {
        let mut raw = analysis(vec![
            feature("cheekbones", Some(Confidence::High)),
            feature("jawline", Some(Confidence::Low)),
        ]);
        let meta = InputMeta {
            has_secondary_photo: true,
            lighting: LightingQuality::Uneven,
            ..InputMeta::default()
        };
        annotate(&mut raw, &meta);

        assert_eq!(raw.features[0].confidence, Some(Confidence::Medium));
        // Already-lower confidence is never upgraded.
        assert_eq!(raw.features[1].confidence, Some(Confidence::Low));
    }

    #[test]
    fn annotation_is_idempotent() {
        let mut raw = analysis(vec![
            feature("chin", Some(Confidence::High)),
            feature("symmetry", Some(Confidence::High)),
            feature("cheekbones", Some(Confidence::High)),
        ]);
        let meta = InputMeta {
            has_secondary_photo: false,
            angle: AngleQuality::Selfie,
            lighting: LightingQuality::Uneven,
        };
        annotate(&mut raw, &meta);
        let once = raw.clone();
        annotate(&mut raw, &meta);
        assert_eq!(raw, once);
    }

    #[test]
    fn ratings_are_never_modified() {
        let mut raw = analysis(vec![feature("chin", Some(Confidence::High))]);
        raw.features[0].rating10 = Some(6.7);
        annotate(&mut raw, &InputMeta::default());
        assert_eq!(raw.features[0].rating10, Some(6.7));
    }

    #[test]
    fn meta_refines_from_reported_issues() {
        let meta = InputMeta {
            has_secondary_photo: true,
            ..InputMeta::default()
        }
        .refine_from_issues(&[
            PhotoQualityIssue::AngleDistortion,
            PhotoQualityIssue::InconsistentLighting,
        ]);
        assert_eq!(meta.angle, AngleQuality::Selfie);
        assert_eq!(meta.lighting, LightingQuality::Uneven);
    }

    #[test]
    fn explicit_meta_wins_over_reported_issues() {
        let meta = InputMeta {
            has_secondary_photo: true,
            angle: AngleQuality::EyeLevel,
            lighting: LightingQuality::Even,
        }
        .refine_from_issues(&[PhotoQualityIssue::AngleDistortion]);
        assert_eq!(meta.angle, AngleQuality::EyeLevel);
        assert_eq!(meta.lighting, LightingQuality::Even);
    }
}
