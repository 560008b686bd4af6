//! Unified error model for TRI computation
//!
//! All bounds violations fail at construction time. Values are never
//! silently clamped into range.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriError {
    /// A feature value was constructed outside [0.0, 1.0].
    #[error("FEATURE/{feature}: value {value} outside [0.0, 1.0]")]
    FeatureOutOfRange { feature: String, value: f64 },

    /// A confidence band violated 0 <= lower <= upper <= 1.
    #[error("BAND/invalid bounds: lower={lower}, upper={upper}")]
    InvalidBand { lower: f64, upper: f64 },

    /// A trust weight was constructed outside [1.0, 2.0].
    #[error("TRUST/{weight}: value {value} outside [1.0, 2.0]")]
    TrustWeightOutOfRange { weight: String, value: f64 },

    /// A score left the [0.0, 1.0] range.
    #[error("SCORE/{context}: value {value} outside [0.0, 1.0]")]
    ScoreOutOfRange { context: String, value: f64 },

    /// The advisory-only guarantee was violated.
    #[error("ADVISORY/result constructed with advisory_only = false")]
    AdvisoryFlagViolation,
}
