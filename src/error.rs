use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `recallkey`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum RecallError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Report pipeline ─────────────────────────────────────────────────
    #[error("report: {0}")]
    Report(#[from] ReportError),

    // ── Code/Asset store ────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

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

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} authentication failed")]
    Auth { provider: String },

    #[error("provider {provider} returned an empty completion")]
    EmptyCompletion { provider: String },
}

// ─── Report pipeline errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReportError {
    /// The extraction call to the model failed outright (network or
    /// provider error). Malformed model output is NOT an error: the
    /// assembler substitutes the fallback template instead.
    #[error("report generation failed: {0}")]
    Upstream(String),
}

// ─── Code/Asset store errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid code format, expected {expected}")]
    InvalidCode { expected: String },

    #[error("no report stored under code {0}")]
    NotFound(String),

    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    #[error("storage backend: {0}")]
    Backend(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, RecallError>;
