use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed vocabulary of suspicion flags the scorer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    CycleMember,
    FanInSmurfing,
    FanOutSmurfing,
    ShellAccount,
    HighVelocity,
    BelowThresholdStructuring,
    MultiplePatterns,
    HighRiskPattern,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::CycleMember => "cycle_member",
            Flag::FanInSmurfing => "fan_in_smurfing",
            Flag::FanOutSmurfing => "fan_out_smurfing",
            Flag::ShellAccount => "shell_account",
            Flag::HighVelocity => "high_velocity",
            Flag::BelowThresholdStructuring => "below_threshold_structuring",
            Flag::MultiplePatterns => "multiple_patterns",
            Flag::HighRiskPattern => "high_risk_pattern",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
