use thiserror::Error;

/// Errors surfaced to the caller. Matches the three kinds in the error
/// handling design: validation failures are client-visible with an
/// issue list, processing failures are internal, and deadline expiry on
/// the cycle stage is deliberately *not* a variant here — it never
/// reaches an error path, it just yields an empty ring set.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("input validation failed: {issues:?}")]
    Validation { issues: Vec<String> },

    #[error("processing failed: {0}")]
    Processing(String),
}

impl DetectionError {
    pub fn validation(issues: Vec<String>) -> Self {
        Self::Validation { issues }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;
