//! Risk tier classification and tier-to-action mapping
//!
//! Fixed thresholds: 0.20 / 0.40 / 0.60 / 0.80. The mapping from score to
//! tier and from tier to action is deterministic and monotonic, and no
//! tier is ever labeled "safe".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier derived from a TRI score in [0.0, 1.0].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    /// [0.00, 0.20): very low risk, routine processing
    Minimal = 0,
    /// [0.20, 0.40): low risk, standard processing
    Low = 1,
    /// [0.40, 0.60): moderate risk, enhanced monitoring
    Moderate = 2,
    /// [0.60, 0.80): high risk, review recommended
    High = 3,
    /// [0.80, 1.00]: critical risk, immediate attention
    Critical = 4,
}

impl RiskTier {
    /// Classify a score against the fixed thresholds.
    ///
    /// Callers are expected to pass a score already validated into
    /// [0.0, 1.0]; anything at or above 0.80 classifies as `Critical`.
    pub fn from_score(score: f64) -> Self {
        if score < 0.20 {
            RiskTier::Minimal
        } else if score < 0.40 {
            RiskTier::Low
        } else if score < 0.60 {
            RiskTier::Moderate
        } else if score < 0.80 {
            RiskTier::High
        } else {
            RiskTier::Critical
        }
    }

    /// Numeric severity rank, for monotonicity comparisons.
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    /// Recommended action for this tier.
    pub fn action(&self) -> TierAction {
        match self {
            RiskTier::Minimal | RiskTier::Low => TierAction::None,
            RiskTier::Moderate => TierAction::Advisory,
            RiskTier::High => TierAction::Warning,
            RiskTier::Critical => TierAction::BlockAndEscalate,
        }
    }

    /// Whether this tier calls for manual review downstream.
    pub fn requires_review(&self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }

    /// Short operational description.
    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Minimal => "Very low risk, routine processing",
            RiskTier::Low => "Low risk, standard processing",
            RiskTier::Moderate => "Moderate risk, enhanced monitoring",
            RiskTier::High => "High risk, review recommended",
            RiskTier::Critical => "Critical risk, immediate attention",
        }
    }

    pub const ALL: [RiskTier; 5] = [
        RiskTier::Minimal,
        RiskTier::Low,
        RiskTier::Moderate,
        RiskTier::High,
        RiskTier::Critical,
    ];
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RiskTier::Minimal => write!(f, "MINIMAL"),
            RiskTier::Low => write!(f, "LOW"),
            RiskTier::Moderate => write!(f, "MODERATE"),
            RiskTier::High => write!(f, "HIGH"),
            RiskTier::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Action recommended for a severity tier.
///
/// The action is advisory context for the orchestration layer; this crate
/// never executes, approves, or blocks anything itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TierAction {
    /// No intervention
    None = 0,
    /// Surface an advisory note
    Advisory = 1,
    /// Surface a warning
    Warning = 2,
    /// Recommend block and escalate
    BlockAndEscalate = 3,
}

impl TierAction {
    /// Numeric severity rank, for monotonicity comparisons.
    pub fn severity(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TierAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TierAction::None => write!(f, "none"),
            TierAction::Advisory => write!(f, "advisory"),
            TierAction::Warning => write!(f, "warning"),
            TierAction::BlockAndEscalate => write!(f, "block_and_escalate"),
        }
    }
}
