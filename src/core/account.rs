use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account in the transaction network.
///
/// Account IDs are normalized (trimmed, upper-cased) during ingestion
/// so that the same physical account always hashes and compares equal
/// regardless of how it was spelled in the source file.
///
/// # Examples
///
/// ```
/// use laundering_detector::core::account::AccountId;
///
/// let a = AccountId::new("acct-001");
/// let b = AccountId::new("ACCT-001");
/// assert_ne!(a, b); // normalization happens at ingestion, not construction
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Normalize an account ID exactly as the ingestion pipeline does:
    /// trim surrounding whitespace, upper-case.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}
