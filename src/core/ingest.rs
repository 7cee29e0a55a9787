//! Parse-and-validate boundary for untrusted model output.
//!
//! The upstream model returns semi-structured JSON: field types drift
//! (numbers arrive as strings), enum values drift, whole sections go
//! missing. This module walks the payload once and produces partial `Raw*`
//! types for the pipeline stages. Two failures are fatal
//! (`MalformedUpstream`): an unparsable payload, or one lacking the
//! `features` list / `overall` object. Everything else is coerced, defaulted
//! or dropped with a diagnostic — never retried.

use crate::core::levers::LeverId;
use crate::core::types::{Confidence, Difficulty, Fix, ImprovementDelta, PhotoQualityIssue};
use crate::error::PipelineError;
use serde_json::Value;
use std::str::FromStr;

// ─── Partial record types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnalysis {
    pub photo_quality: RawPhotoQuality,
    pub overall: RawOverall,
    pub features: Vec<RawFeature>,
    pub deltas: Vec<ImprovementDelta>,
    pub potential_range: Option<RawRange>,
    pub harmony: RawComposite,
    pub symmetry: RawComposite,
    pub hair: RawComposite,
    pub safety: RawSafety,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPhotoQuality {
    pub score: Option<f64>,
    pub issues: Vec<PhotoQualityIssue>,
    pub assessment_limitations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOverall {
    pub current_score10: Option<f64>,
    pub potential_score10: Option<f64>,
    pub ceiling_score10: Option<f64>,
    pub confidence: Option<Confidence>,
    pub summary: Option<String>,
    pub calibration_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeature {
    pub key: String,
    pub label: Option<String>,
    pub rating10: Option<f64>,
    pub confidence: Option<Confidence>,
    pub photo_limitations: Vec<String>,
    pub strengths: Vec<String>,
    pub holding_back: Vec<String>,
    pub sub_features: Vec<RawSubRating>,
    pub fixes: Vec<Fix>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSubRating {
    pub name: String,
    pub rating10: Option<f64>,
    pub confidence: Option<Confidence>,
    pub note: Option<String>,
    pub is_strength: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawComposite {
    pub rating10: Option<f64>,
    pub confidence: Option<Confidence>,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRange {
    pub min: f64,
    pub max: f64,
    pub confidence: Option<Confidence>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSafety {
    pub disclaimer: Option<String>,
    /// Kept as the raw string: the assembler decides whether a present but
    /// unrecognized tone is a schema violation.
    pub tone: Option<String>,
    pub scoring_context: Option<String>,
}

// ─── Entry points ───────────────────────────────────────────────────────────

/// Parse the model's text output into JSON, tolerating markdown code fences
/// around the payload.
pub fn parse_payload(text: &str) -> Result<Value, PipelineError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned)
        .map_err(|e| PipelineError::malformed(format!("payload is not valid JSON: {e}")))
}

/// Validate and coerce an untrusted payload into the pipeline's partial
/// types.
pub fn parse(raw: &Value) -> Result<RawAnalysis, PipelineError> {
    let root = raw
        .as_object()
        .ok_or_else(|| PipelineError::malformed("payload is not a JSON object"))?;

    let features_value = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::malformed("missing `features` array"))?;

    let overall_value = root
        .get("overall")
        .and_then(Value::as_object)
        .ok_or_else(|| PipelineError::malformed("missing `overall` object"))?;

    Ok(RawAnalysis {
        photo_quality: parse_photo_quality(root.get("photoQuality")),
        overall: parse_overall(overall_value),
        features: features_value.iter().filter_map(parse_feature).collect(),
        deltas: parse_deltas(root.get("potential")),
        potential_range: parse_range(root.get("potentialRange")),
        harmony: parse_composite(root.get("harmony")),
        symmetry: parse_composite(root.get("symmetry")),
        hair: parse_composite(root.get("hair")),
        safety: parse_safety(root.get("safety")),
    })
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

// ─── Section parsers ────────────────────────────────────────────────────────

fn parse_photo_quality(value: Option<&Value>) -> RawPhotoQuality {
    let Some(obj) = value.and_then(Value::as_object) else {
        return RawPhotoQuality::default();
    };

    let issues = obj
        .get("issues")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| match PhotoQualityIssue::from_str(s) {
                    Ok(issue) => Some(issue),
                    Err(_) => {
                        tracing::warn!(issue = s, "dropping unrecognized photo-quality issue");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    RawPhotoQuality {
        score: number(obj.get("score")),
        issues,
        assessment_limitations: strings(obj.get("assessmentLimitations")),
    }
}

fn parse_overall(obj: &serde_json::Map<String, Value>) -> RawOverall {
    RawOverall {
        current_score10: rating(obj.get("currentScore10"), "overall.current"),
        potential_score10: rating(obj.get("potentialScore10"), "overall.potential"),
        ceiling_score10: rating(obj.get("ceilingScore10"), "overall.ceiling"),
        confidence: confidence(obj.get("confidence"), "overall"),
        summary: text(obj.get("summary")),
        calibration_note: text(obj.get("calibrationNote")),
    }
}

fn parse_feature(value: &Value) -> Option<RawFeature> {
    let obj = value.as_object()?;
    let key = text(obj.get("key"))?;

    // Older payload revisions named the weakness list differently.
    let holding_back = [obj.get("holdingBack"), obj.get("whatLimitsIt"), obj.get("imperfections")]
        .into_iter()
        .find_map(|v| v.filter(|v| v.is_array()))
        .map(|v| strings(Some(v)))
        .unwrap_or_default();

    Some(RawFeature {
        label: text(obj.get("label")),
        rating10: rating(obj.get("rating10"), &key),
        confidence: confidence(obj.get("confidence"), &key),
        photo_limitations: strings(obj.get("photoLimitations")),
        strengths: strings(obj.get("strengths")),
        holding_back,
        sub_features: obj
            .get("subFeatures")
            .and_then(Value::as_array)
            .map(|subs| subs.iter().filter_map(parse_sub_rating).collect())
            .unwrap_or_default(),
        fixes: obj
            .get("fixes")
            .and_then(Value::as_array)
            .map(|fixes| fixes.iter().filter_map(parse_fix).collect())
            .unwrap_or_default(),
        key,
    })
}

fn parse_sub_rating(value: &Value) -> Option<RawSubRating> {
    let obj = value.as_object()?;
    let name = text(obj.get("name"))?;
    Some(RawSubRating {
        rating10: rating(obj.get("rating10"), &name),
        confidence: confidence(obj.get("confidence"), &name),
        note: text(obj.get("note")),
        is_strength: obj.get("isStrength").and_then(Value::as_bool).unwrap_or(false),
        name,
    })
}

fn parse_fix(value: &Value) -> Option<Fix> {
    let obj = value.as_object()?;
    Some(Fix {
        title: text(obj.get("title"))?,
        difficulty: difficulty(obj.get("difficulty")),
        timeline: text(obj.get("timeline"))
            .or_else(|| text(obj.get("timeToSeeChange")))
            .unwrap_or_default(),
        steps: strings(obj.get("steps")),
    })
}

fn parse_deltas(value: Option<&Value>) -> Vec<ImprovementDelta> {
    let Some(items) = value
        .and_then(Value::as_object)
        .and_then(|p| p.get("deltas"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let lever_name = text(obj.get("lever"))?;
            let Ok(lever) = LeverId::from_str(&lever_name) else {
                tracing::warn!(lever = lever_name, "dropping delta for unknown lever");
                return None;
            };
            let Some(delta) = number(obj.get("delta")) else {
                tracing::warn!(lever = %lever, "dropping delta without a numeric magnitude");
                return None;
            };
            Some(ImprovementDelta {
                lever,
                current_issue: text(obj.get("currentIssue")).unwrap_or_default(),
                delta,
                timeline: text(obj.get("timeline")).unwrap_or_default(),
                difficulty: difficulty(obj.get("difficulty")),
                steps: strings(obj.get("steps")),
            })
        })
        .collect()
}

fn parse_range(value: Option<&Value>) -> Option<RawRange> {
    let obj = value.and_then(Value::as_object)?;
    Some(RawRange {
        min: number(obj.get("min"))?,
        max: number(obj.get("max"))?,
        confidence: confidence(obj.get("confidence"), "potentialRange"),
        note: text(obj.get("note")),
    })
}

fn parse_composite(value: Option<&Value>) -> RawComposite {
    let Some(obj) = value.and_then(Value::as_object) else {
        return RawComposite::default();
    };

    let mut notes = strings(obj.get("notes"));
    if let Some(limitation) = text(obj.get("photoLimitation")) {
        notes.push(limitation);
    }

    RawComposite {
        rating10: rating(obj.get("rating10"), "composite"),
        confidence: confidence(obj.get("confidence"), "composite"),
        notes,
        suggestions: strings(obj.get("suggestions")),
    }
}

fn parse_safety(value: Option<&Value>) -> RawSafety {
    let Some(obj) = value.and_then(Value::as_object) else {
        return RawSafety::default();
    };
    RawSafety {
        disclaimer: text(obj.get("disclaimer")),
        tone: text(obj.get("tone")),
        scoring_context: text(obj.get("scoringContext")),
    }
}

// ─── Field coercion ─────────────────────────────────────────────────────────

/// Numeric field: accepts a JSON number or a numeric string (`"7.5"`).
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Rating field: numeric coercion plus the [0,10] domain check. Out-of-range
/// ratings are treated as absent so the assembler defaults them.
fn rating(value: Option<&Value>, subject: &str) -> Option<f64> {
    let n = number(value)?;
    if !(0.0..=10.0).contains(&n) {
        tracing::warn!(subject, rating = n, "discarding rating outside [0,10]");
        return None;
    }
    Some(n)
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn confidence(value: Option<&Value>, subject: &str) -> Option<Confidence> {
    let s = value?.as_str()?;
    match Confidence::from_str(s) {
        Ok(c) => Some(c),
        Err(_) => {
            tracing::warn!(subject, value = s, "unrecognized confidence, defaulting later");
            None
        }
    }
}

fn difficulty(value: Option<&Value>) -> Difficulty {
    value
        .and_then(Value::as_str)
        .and_then(|s| Difficulty::from_str(s).ok())
        .unwrap_or(Difficulty::Moderate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "features": [
                { "key": "skin", "rating10": 5.2, "confidence": "high" }
            ],
            "overall": { "currentScore10": 5.4 }
        })
    }

    #[test]
    fn minimal_payload_parses() {
        let raw = parse(&minimal()).unwrap();
        assert_eq!(raw.features.len(), 1);
        assert_eq!(raw.features[0].rating10, Some(5.2));
        assert_eq!(raw.features[0].confidence, Some(Confidence::High));
        assert_eq!(raw.overall.current_score10, Some(5.4));
    }

    #[test]
    fn missing_features_is_malformed() {
        let err = parse(&json!({ "overall": {} })).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedUpstream { .. }));
        assert!(err.to_string().contains("features"));
    }

    #[test]
    fn missing_overall_is_malformed() {
        let err = parse(&json!({ "features": [] })).unwrap_err();
        assert!(err.to_string().contains("overall"));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        assert!(parse(&json!([1, 2, 3])).is_err());
        assert!(parse(&json!("text")).is_err());
    }

    #[test]
    fn fenced_payload_parses() {
        let text = "```json\n{\"overall\": {}, \"features\": []}\n```";
        let value = parse_payload(text).unwrap();
        assert!(value.get("overall").is_some());
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let err = parse_payload("I am unable to analyze this image.").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedUpstream { .. }));
    }

    #[test]
    fn string_encoded_rating_coerces() {
        let payload = json!({
            "features": [{ "key": "skin", "rating10": "6.3" }],
            "overall": { "currentScore10": "5.1" }
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.features[0].rating10, Some(6.3));
        assert_eq!(raw.overall.current_score10, Some(5.1));
    }

    #[test]
    fn out_of_range_rating_becomes_absent() {
        let payload = json!({
            "features": [{ "key": "skin", "rating10": 14.0 }],
            "overall": {}
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.features[0].rating10, None);
    }

    #[test]
    fn out_of_range_overall_scores_become_absent() {
        let payload = json!({
            "features": [],
            "overall": { "currentScore10": -5.0, "potentialScore10": 22.0 }
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.overall.current_score10, None);
        assert_eq!(raw.overall.potential_score10, None);
    }

    #[test]
    fn unknown_confidence_becomes_absent() {
        let payload = json!({
            "features": [{ "key": "skin", "rating10": 5.0, "confidence": "absolutely" }],
            "overall": {}
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.features[0].confidence, None);
    }

    #[test]
    fn unknown_lever_delta_is_dropped() {
        let payload = json!({
            "features": [],
            "overall": {},
            "potential": { "deltas": [
                { "lever": "jaw_implant", "delta": 0.5 },
                { "lever": "skin", "delta": 0.4 }
            ]}
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.deltas.len(), 1);
        assert_eq!(raw.deltas[0].lever, LeverId::Skin);
    }

    #[test]
    fn unknown_photo_issue_is_dropped() {
        let payload = json!({
            "features": [],
            "overall": {},
            "photoQuality": { "score": 80, "issues": ["blurry", "haunted"] }
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.photo_quality.issues, vec![PhotoQualityIssue::Blurry]);
    }

    #[test]
    fn legacy_weakness_field_names_are_read() {
        let payload = json!({
            "features": [{ "key": "skin", "whatLimitsIt": ["texture unevenness"] }],
            "overall": {}
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.features[0].holding_back, vec!["texture unevenness"]);
    }

    #[test]
    fn symmetry_photo_limitation_folds_into_notes() {
        let payload = json!({
            "features": [],
            "overall": {},
            "symmetry": {
                "rating10": 6.1,
                "notes": ["mild deviation"],
                "photoLimitation": "Selfie angle creates 10-15% distortion"
            }
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.symmetry.notes.len(), 2);
    }

    #[test]
    fn feature_without_key_is_skipped() {
        let payload = json!({
            "features": [{ "rating10": 5.0 }, { "key": "nose", "rating10": 4.8 }],
            "overall": {}
        });
        let raw = parse(&payload).unwrap();
        assert_eq!(raw.features.len(), 1);
        assert_eq!(raw.features[0].key, "nose");
    }
}
