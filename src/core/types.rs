//! Record types for the scoring pipeline.
//!
//! These are the *complete* internal types: every field is concrete, every
//! list is a real vector. The only place partial data exists is the ingest
//! boundary (`ingest::RawAnalysis`); the assembler converts raw to complete
//! exactly once, so downstream consumers never branch on absence.
//!
//! Serialization is camelCase to match the wire format the mobile client
//! already speaks (`rating10`, `currentScore10`, `top3Levers`, …).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Qualitative enums ──────────────────────────────────────────────────────

/// Trust label attached to a rating. Reflects input-quality limitations,
/// never the rating's magnitude. Ordering matters: `Low < Medium < High`,
/// so a downgrade is a plain `min`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Difficult,
}

/// Analysis depth. Standard requests get the core feature set; expanded
/// (premium) requests get sub-ratings and the ceiling score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Depth {
    Free,
    Premium,
}

/// The only tone the schema admits. Upstream output claiming anything else
/// is a schema violation, not a defaultable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
}

/// Closed set of detectable photo-quality problems. Unknown strings from
/// upstream are dropped at ingest with a diagnostic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhotoQualityIssue {
    TooDark,
    TooBright,
    NotCentered,
    LowResolution,
    MultipleFaces,
    NoFaceDetected,
    SideMissing,
    Blurry,
    HeavyFilter,
    AngleDistortion,
    InconsistentLighting,
    PartialFace,
}

// ─── Ratings and features ───────────────────────────────────────────────────

/// Nested sub-rating under a feature (expanded tier only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRating {
    pub name: String,
    pub rating10: f64,
    pub confidence: Confidence,
    pub note: String,
    pub is_strength: bool,
}

/// One remediation action attached to a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub title: String,
    pub difficulty: Difficulty,
    pub timeline: String,
    pub steps: Vec<String>,
}

/// A rated feature: the rating itself plus its supporting material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub key: String,
    pub label: String,
    pub rating10: f64,
    pub confidence: Confidence,
    pub photo_limitations: Vec<String>,
    pub strengths: Vec<String>,
    pub holding_back: Vec<String>,
    pub sub_features: Vec<SubRating>,
    pub fixes: Vec<Fix>,
}

/// Composite rating evaluated independently of the feature list
/// (harmony, symmetry, hair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRating {
    pub rating10: f64,
    pub confidence: Confidence,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

// ─── Potential ──────────────────────────────────────────────────────────────

/// A specific magnitude of improvement attributed to one lever for one
/// analysis. Immutable after creation; the potential calculator checks the
/// magnitude against the lever's registered range before retaining it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementDelta {
    pub lever: crate::core::levers::LeverId,
    pub current_issue: String,
    pub delta: f64,
    pub timeline: String,
    pub difficulty: Difficulty,
    pub steps: Vec<String>,
}

/// One of the ranked top-N levers. Priority is 1-based; ties rank in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedLever {
    pub lever: crate::core::levers::LeverId,
    pub delta: f64,
    pub timeline: String,
    pub priority: u8,
}

/// Achievable-gain block of the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialBlock {
    pub total_possible_gain: f64,
    pub deltas: Vec<ImprovementDelta>,
    pub top3_levers: Vec<RankedLever>,
}

/// Widened band around the single-point potential estimate.
/// Invariant: `current <= min <= potential <= max <= 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialRange {
    pub min: f64,
    pub max: f64,
    pub confidence: Confidence,
    pub note: String,
}

/// Overall score envelope. Invariant: `current <= potential <= ceiling <= 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overall {
    pub current_score10: f64,
    pub potential_score10: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling_score10: Option<f64>,
    pub confidence: Confidence,
    pub summary: String,
    pub calibration_note: String,
}

// ─── Input quality, safety, tier ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoQuality {
    /// 0..=100
    pub score: u8,
    pub issues: Vec<PhotoQualityIssue>,
    pub assessment_limitations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Safety {
    pub disclaimer: String,
    pub tone: Tone,
    pub scoring_context: String,
}

impl Safety {
    pub const DEFAULT_DISCLAIMER: &'static str =
        "Scores reflect aesthetic guidelines, not personal worth. Beauty is subjective.";
    pub const DEFAULT_SCORING_CONTEXT: &'static str = "We use honest calibration: 5.5 is \
         average, most people score 4.5-6.5. A 7+ is notably above average.";
}

impl Default for Safety {
    fn default() -> Self {
        Self {
            disclaimer: Self::DEFAULT_DISCLAIMER.to_string(),
            tone: Tone::Neutral,
            scoring_context: Self::DEFAULT_SCORING_CONTEXT.to_string(),
        }
    }
}

/// Depth metadata. Always rebuilt from the caller's request context — the
/// upstream model must not be able to self-grant premium depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub is_premium: bool,
    pub depth: Depth,
}

impl Tier {
    pub fn from_premium(premium: bool) -> Self {
        Self {
            is_premium: premium,
            depth: if premium { Depth::Premium } else { Depth::Free },
        }
    }
}

// ─── Root aggregate ─────────────────────────────────────────────────────────

/// The validated analysis result. Created per request, never mutated after
/// assembly, discarded after delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub photo_quality: PhotoQuality,
    pub overall: Overall,
    pub potential_range: PotentialRange,
    pub potential: PotentialBlock,
    pub features: Vec<Feature>,
    pub harmony: CompositeRating,
    pub symmetry: CompositeRating,
    pub hair: CompositeRating,
    pub safety: Safety,
    pub tier: Tier,
}
