//! Calibration engine: mean-triggered compression of inflated ratings.
//!
//! The upstream model tends toward flattering scores. When the sample mean of
//! the top-level feature ratings exceeds the inflation threshold, every
//! rating (top-level and nested) is pulled toward the anchor by the same
//! affine transform, which preserves relative ordering and spread. Means at
//! or below the threshold are left untouched, so genuinely low scores are
//! never suppressed.

use crate::core::ingest::RawFeature;
use serde::{Deserialize, Serialize};

/// Named calibration constants. The defaults are fixed constants of the
/// core; the struct exists so the engine can be tuned and tested
/// independently of the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CalibrationCurve {
    /// Sample mean above which compression engages.
    pub inflation_threshold: f64,
    /// Fixed "true average" reference point ratings are pulled toward.
    pub anchor: f64,
    /// Mean the compression factor aims the distribution at.
    pub target_mean: f64,
    /// Lower clamp for compressed ratings.
    pub floor: f64,
    /// Upper clamp for compressed ratings.
    pub cap: f64,
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        Self {
            inflation_threshold: 6.5,
            anchor: 5.5,
            target_mean: 6.0,
            floor: 1.0,
            cap: 9.5,
        }
    }
}

impl CalibrationCurve {
    /// Compression factor for a sample mean, or `None` when the mean does
    /// not exceed the inflation threshold.
    pub fn compression_factor(&self, mean: f64) -> Option<f64> {
        (mean > self.inflation_threshold).then(|| self.target_mean / mean)
    }

    /// Apply the affine compression to one rating: pull toward the anchor by
    /// `factor`, clamp into `[floor, cap]`, round to one decimal.
    pub fn compress(&self, rating: f64, factor: f64) -> f64 {
        round1((self.anchor + (rating - self.anchor) * factor).clamp(self.floor, self.cap))
    }

    /// Sanity-check the curve constants.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.floor < self.anchor && self.anchor < self.cap) {
            return Err(format!(
                "curve must satisfy floor < anchor < cap (got {} / {} / {})",
                self.floor, self.anchor, self.cap
            ));
        }
        if self.target_mean > self.inflation_threshold {
            return Err(format!(
                "target_mean {} must not exceed inflation_threshold {}",
                self.target_mean, self.inflation_threshold
            ));
        }
        Ok(())
    }
}

/// Round to one decimal, matching the wire format's precision.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Calibrate the top-level feature ratings and their nested sub-ratings.
///
/// The mean is computed over features that carry a numeric rating; features
/// without one are ignored for the mean and left untouched. Fewer than two
/// numeric ratings is insufficient signal and skips compression entirely.
pub fn calibrate_features(features: &mut [RawFeature], curve: &CalibrationCurve) {
    let ratings: Vec<f64> = features.iter().filter_map(|f| f.rating10).collect();
    if ratings.len() < 2 {
        return;
    }

    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    let Some(factor) = curve.compression_factor(mean) else {
        return;
    };
    tracing::debug!(mean, factor, "inflated feature ratings, compressing");

    for feature in features.iter_mut() {
        if let Some(rating) = feature.rating10 {
            feature.rating10 = Some(curve.compress(rating, factor));
        }
        for sub in &mut feature.sub_features {
            if let Some(rating) = sub.rating10 {
                sub.rating10 = Some(curve.compress(rating, factor));
            }
        }
    }
}

/// Calibrate a standalone composite score (harmony, symmetry, hair, overall
/// current). Each composite is a single-value sample evaluated independently
/// against the same threshold: its own value is the mean that both triggers
/// and parameterizes the compression.
pub fn calibrate_single(rating: f64, curve: &CalibrationCurve) -> f64 {
    match curve.compression_factor(rating) {
        Some(factor) => curve.compress(rating, factor),
        None => rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::{RawFeature, RawSubRating};

    fn feature(key: &str, rating: Option<f64>) -> RawFeature {
        RawFeature {
            key: key.to_string(),
            rating10: rating,
            ..RawFeature::default()
        }
    }

    #[test]
    fn inflated_set_is_compressed_order_preserved() {
        // Mean 8.05 exceeds the 6.5 threshold, so compression engages.
        let mut features = vec![
            feature("skin", Some(7.8)),
            feature("eye_area", Some(8.1)),
            feature("nose", Some(7.9)),
            feature("jawline", Some(8.4)),
        ];
        calibrate_features(&mut features, &CalibrationCurve::default());

        let calibrated: Vec<f64> = features.iter().map(|f| f.rating10.unwrap()).collect();
        assert_eq!(calibrated, vec![7.2, 7.4, 7.3, 7.7]);

        let mean = calibrated.iter().sum::<f64>() / calibrated.len() as f64;
        assert!(mean < 8.05, "compression must lower the mean");
        // Relative order: 8.4 > 8.1 > 7.9 > 7.8 survives the transform.
        assert!(calibrated[3] > calibrated[1]);
        assert!(calibrated[1] > calibrated[2]);
        assert!(calibrated[2] > calibrated[0]);
    }

    #[test]
    fn mean_at_or_below_threshold_is_untouched() {
        let mut features = vec![
            feature("skin", Some(4.0)),
            feature("nose", Some(5.5)),
            feature("jawline", Some(6.0)),
        ];
        calibrate_features(&mut features, &CalibrationCurve::default());
        let ratings: Vec<f64> = features.iter().map(|f| f.rating10.unwrap()).collect();
        assert_eq!(ratings, vec![4.0, 5.5, 6.0]);
    }

    #[test]
    fn single_numeric_rating_skips_compression() {
        let mut features = vec![feature("skin", Some(9.8)), feature("nose", None)];
        calibrate_features(&mut features, &CalibrationCurve::default());
        assert_eq!(features[0].rating10, Some(9.8));
    }

    #[test]
    fn unratable_features_are_ignored_but_kept() {
        let mut features = vec![
            feature("skin", Some(8.0)),
            feature("nose", None),
            feature("jawline", Some(9.0)),
        ];
        calibrate_features(&mut features, &CalibrationCurve::default());
        assert!(features[0].rating10.unwrap() < 8.0);
        assert_eq!(features[1].rating10, None);
    }

    #[test]
    fn sub_ratings_compress_with_the_same_factor() {
        let mut inflated = feature("skin", Some(8.0));
        inflated.sub_features.push(RawSubRating {
            name: "texture".into(),
            rating10: Some(9.0),
            confidence: None,
            note: None,
            is_strength: true,
        });
        let mut features = vec![inflated, feature("nose", Some(8.0))];
        calibrate_features(&mut features, &CalibrationCurve::default());

        // factor = 6.0 / 8.0 = 0.75; 5.5 + 3.5 * 0.75 = 8.125 -> 8.1
        assert_eq!(features[0].sub_features[0].rating10, Some(8.1));
        assert_eq!(features[0].rating10, Some(7.4));
    }

    #[test]
    fn outputs_stay_within_floor_and_cap() {
        let curve = CalibrationCurve::default();
        let mut features = vec![
            feature("a", Some(10.0)),
            feature("b", Some(10.0)),
            feature("c", Some(0.0)),
        ];
        calibrate_features(&mut features, &curve);
        for f in &features {
            let r = f.rating10.unwrap();
            assert!((curve.floor..=curve.cap).contains(&r), "out of range: {r}");
        }
    }

    #[test]
    fn monotonic_over_random_pairs() {
        let curve = CalibrationCurve::default();
        let inputs = [9.7, 8.3, 7.1, 6.9, 8.3, 9.9];
        let mut features: Vec<RawFeature> = inputs
            .iter()
            .map(|r| feature("f", Some(*r)))
            .collect();
        calibrate_features(&mut features, &curve);
        let out: Vec<f64> = features.iter().map(|f| f.rating10.unwrap()).collect();
        for i in 0..inputs.len() {
            for j in 0..inputs.len() {
                if inputs[i] >= inputs[j] {
                    assert!(out[i] >= out[j], "order broken at ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn calibration_is_deterministic() {
        let curve = CalibrationCurve::default();
        let build = || {
            vec![
                feature("a", Some(8.8)),
                feature("b", Some(7.2)),
                feature("c", Some(9.1)),
            ]
        };
        let mut first = build();
        let mut second = build();
        calibrate_features(&mut first, &curve);
        calibrate_features(&mut second, &curve);
        let ratings = |fs: &[RawFeature]| fs.iter().map(|f| f.rating10).collect::<Vec<_>>();
        assert_eq!(ratings(&first), ratings(&second));
    }

    #[test]
    fn composite_above_threshold_compresses_independently() {
        let curve = CalibrationCurve::default();
        // 9.0 is its own mean: factor 6/9, 5.5 + 3.5 * 2/3 = 7.833 -> 7.8
        assert_eq!(calibrate_single(9.0, &curve), 7.8);
        assert_eq!(calibrate_single(6.5, &curve), 6.5);
        assert_eq!(calibrate_single(4.2, &curve), 4.2);
    }

    #[test]
    fn default_curve_validates() {
        assert!(CalibrationCurve::default().validate().is_ok());
    }

    #[test]
    fn inverted_curve_fails_validation() {
        let curve = CalibrationCurve {
            floor: 9.0,
            ..CalibrationCurve::default()
        };
        assert!(curve.validate().is_err());
    }
}
