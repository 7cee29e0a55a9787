//! Pre-flight photo-quality checks.
//!
//! Cheap heuristics run before spending a model call: resolution, aspect
//! ratio, and presence of the two capture angles. These only gate or warn;
//! the authoritative photo-quality report comes back from the model and is
//! validated by the pipeline.

use crate::core::types::PhotoQualityIssue;
use serde::{Deserialize, Serialize};

const MIN_WIDTH: u32 = 300;
const MIN_HEIGHT: u32 = 400;
/// Portrait orientation, 3:4.
const IDEAL_ASPECT: f64 = 0.75;
const ASPECT_TOLERANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Result of the pre-flight checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheck {
    pub is_valid: bool,
    pub score: u8,
    pub issues: Vec<PhotoQualityIssue>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QualityInput {
    pub dimensions: Option<ImageDimensions>,
    pub has_front_photo: bool,
    pub has_side_photo: bool,
}

/// Whether the resolution clears the minimum for a usable analysis.
pub fn check_resolution(dimensions: ImageDimensions) -> Option<PhotoQualityIssue> {
    (dimensions.width < MIN_WIDTH || dimensions.height < MIN_HEIGHT)
        .then_some(PhotoQualityIssue::LowResolution)
}

/// Non-portrait aspect ratios still pass, with a warning.
pub fn check_aspect_ratio(dimensions: ImageDimensions) -> Option<String> {
    let aspect = f64::from(dimensions.width) / f64::from(dimensions.height);
    ((aspect - IDEAL_ASPECT).abs() > ASPECT_TOLERANCE)
        .then(|| "Image aspect ratio may affect analysis accuracy".to_string())
}

/// Composite quality score: base 50, plus 20 for resolution, 10 each for
/// aspect, front photo, side photo. Capped at 100.
pub fn quality_score(
    has_resolution: bool,
    has_good_aspect: bool,
    has_front_photo: bool,
    has_side_photo: bool,
) -> u8 {
    let mut score: u32 = 50;
    if has_resolution {
        score += 20;
    }
    if has_good_aspect {
        score += 10;
    }
    if has_front_photo {
        score += 10;
    }
    if has_side_photo {
        score += 10;
    }
    score.min(100) as u8
}

/// Run every check. A missing side photo is recorded but does not
/// invalidate the capture.
pub fn run_quality_checks(input: &QualityInput) -> QualityCheck {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut has_good_aspect = true;

    if let Some(dimensions) = input.dimensions {
        if let Some(issue) = check_resolution(dimensions) {
            issues.push(issue);
        }
        if let Some(warning) = check_aspect_ratio(dimensions) {
            has_good_aspect = false;
            warnings.push(warning);
        }
    }

    if !input.has_side_photo {
        issues.push(PhotoQualityIssue::SideMissing);
        warnings.push("Side photo recommended for better accuracy".to_string());
    }

    let score = quality_score(
        !issues.contains(&PhotoQualityIssue::LowResolution),
        has_good_aspect,
        input.has_front_photo,
        input.has_side_photo,
    );

    let is_valid = issues
        .iter()
        .all(|issue| *issue == PhotoQualityIssue::SideMissing);

    QualityCheck {
        is_valid,
        score,
        issues,
        warnings,
    }
}

/// User-facing message for a detected issue.
pub fn issue_message(issue: PhotoQualityIssue) -> &'static str {
    match issue {
        PhotoQualityIssue::TooDark => "Image is too dark. Try better lighting.",
        PhotoQualityIssue::TooBright => "Image is overexposed. Reduce brightness.",
        PhotoQualityIssue::NotCentered => "Face is not centered in frame.",
        PhotoQualityIssue::LowResolution => "Image resolution is too low.",
        PhotoQualityIssue::MultipleFaces => "Multiple faces detected.",
        PhotoQualityIssue::NoFaceDetected => "No face detected in image.",
        PhotoQualityIssue::SideMissing => "Side profile photo recommended.",
        PhotoQualityIssue::Blurry => "Image is blurry.",
        PhotoQualityIssue::HeavyFilter => "Heavy filter detected. Use unfiltered photo.",
        PhotoQualityIssue::AngleDistortion => {
            "Selfie angle detected. Symmetry may be affected."
        }
        PhotoQualityIssue::InconsistentLighting => "Uneven lighting on face.",
        PhotoQualityIssue::PartialFace => "Part of face is cropped out.",
    }
}
