//! TRI Core: shared contract types for the Trust Risk Index engine
//!
//! Holds the types that every TRI crate agrees on: the error model, the
//! confidence band, and the fixed tier/action tables. Nothing here performs
//! I/O or holds state; everything is a plain value type with validated
//! construction.

pub mod band;
pub mod error;
pub mod tier;

pub use band::ConfidenceBand;
pub use error::TriError;
pub use tier::{RiskTier, TierAction};

/// Version stamped into every result's metadata.
pub const MODEL_VERSION: &str = "1.0.0";
