use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `facegauge`.
///
/// Each subsystem defines its own error variant. The gateway matches on these
/// to decide recovery strategy (any core failure is substituted with the
/// canned fallback response); internal code continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum GaugeError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Model provider ──────────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Scoring pipeline ────────────────────────────────────────────────
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Provider errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("gemini request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("gemini api key not configured")]
    Auth,

    #[error("empty response from gemini")]
    EmptyResponse,

    #[error("transport: {0}")]
    Transport(String),
}

// ─── Pipeline errors ────────────────────────────────────────────────────────

/// Hard failures of the scoring pipeline.
///
/// Lever-range violations are deliberately NOT represented here: an
/// out-of-range delta is dropped with a warn-level diagnostic and the
/// pipeline continues with the remaining valid deltas.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The model output cannot be parsed or lacks the minimally required
    /// shape (no `features` list, no `overall` object).
    #[error("malformed upstream output: {reason}")]
    MalformedUpstream { reason: String },

    /// The assembler cannot produce a record satisfying the output schema
    /// even after defaulting.
    #[error("schema violation in `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },
}

impl PipelineError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedUpstream {
            reason: reason.into(),
        }
    }

    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GaugeError>;
