//! Glass-box contract failure model
//!
//! Every contract violation is a hard failure: raised, never retried,
//! never swallowed, never replaced by a default score. The failure modes
//! are a closed enumeration so callers can match exhaustively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of contract failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    MissingActivation,
    InvalidActivation,
    ContractViolation,
    MonotonicityViolation,
    MissingContributors,
    InvalidRiskScore,
    InvalidConfidenceBand,
    MissingRequiredField,
    InvalidModelIdentity,
    ScoringFailed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlassBoxError {
    /// No activation reference was supplied. There is no anonymous
    /// fallback.
    #[error("ACTIVATION/missing: {0}")]
    MissingActivation(String),

    /// The activation reference is structurally invalid.
    #[error("ACTIVATION/invalid: {0}")]
    InvalidActivation(String),

    /// The input or output violated the integration contract.
    #[error("CONTRACT/{0}")]
    ContractViolation(String),

    /// A higher score mapped to a less severe consequence than a prior,
    /// lower-scored evaluation for the same activation.
    #[error("MONOTONICITY/{0}")]
    MonotonicityViolation(String),

    /// The scoring function returned no explanation entries.
    #[error("EXPLANATION/missing contributors: {0}")]
    MissingContributors(String),

    /// The risk score left [0.0, 1.0].
    #[error("SCORE/{context}: value {value} outside [0.0, 1.0]")]
    InvalidRiskScore { context: String, value: f64 },

    /// The confidence band is invalid or excludes the point estimate.
    #[error("BAND/invalid: {0}")]
    InvalidConfidenceBand(String),

    /// The embeddable record is missing a required field.
    #[error("EMBEDDING/missing required field: {0}")]
    MissingRequiredField(String),

    /// The model identity is incomplete.
    #[error("MODEL/invalid identity: {0}")]
    InvalidModelIdentity(String),

    /// The external scoring function failed. Its failure surfaces as-is;
    /// there is no default score.
    #[error("SCORING/execution failed: {0}")]
    ScoringFailed(String),
}

impl GlassBoxError {
    /// The failure mode this error belongs to.
    pub fn mode(&self) -> FailureMode {
        match self {
            GlassBoxError::MissingActivation(_) => FailureMode::MissingActivation,
            GlassBoxError::InvalidActivation(_) => FailureMode::InvalidActivation,
            GlassBoxError::ContractViolation(_) => FailureMode::ContractViolation,
            GlassBoxError::MonotonicityViolation(_) => FailureMode::MonotonicityViolation,
            GlassBoxError::MissingContributors(_) => FailureMode::MissingContributors,
            GlassBoxError::InvalidRiskScore { .. } => FailureMode::InvalidRiskScore,
            GlassBoxError::InvalidConfidenceBand(_) => FailureMode::InvalidConfidenceBand,
            GlassBoxError::MissingRequiredField(_) => FailureMode::MissingRequiredField,
            GlassBoxError::InvalidModelIdentity(_) => FailureMode::InvalidModelIdentity,
            GlassBoxError::ScoringFailed(_) => FailureMode::ScoringFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_mapping() {
        let err = GlassBoxError::MissingActivation("req-1".to_string());
        assert_eq!(err.mode(), FailureMode::MissingActivation);
        assert!(err.to_string().starts_with("ACTIVATION/missing"));

        let err = GlassBoxError::InvalidRiskScore {
            context: "scorer output".to_string(),
            value: 1.5,
        };
        assert_eq!(err.mode(), FailureMode::InvalidRiskScore);
        assert!(err.to_string().contains("1.5"));
    }
}
