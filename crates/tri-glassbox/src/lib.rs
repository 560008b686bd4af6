//! # tri-glassbox
//!
//! Glass-box execution contract for risk scoring. The executor wraps a
//! pluggable scoring function and enforces, on every call:
//!
//! - **Activation binding** — every evaluation is tied to a valid
//!   activation reference; there is no anonymous fallback.
//! - **Explanation completeness** — outputs without contributors are
//!   rejected; an unexplained score is an invalid score.
//! - **Tier and action consistency** — tier and action are derived from
//!   the score via fixed tables and re-checked on the way out.
//! - **Embeddable records** — every successful evaluation yields a
//!   decision-record embedding with a closed required field set.
//! - **Monotonicity** — per activation, a strictly higher score may
//!   never map to a strictly less severe tier than a prior evaluation.
//!
//! Every violation is a hard failure. The executor never computes a
//! score itself and never substitutes a default when the scorer fails.

pub mod contract;
pub mod error;
pub mod executor;
pub mod ledger;

pub use contract::{
    ActivationReference, ContributionDirection, FeatureContribution, GlassBoxOutput,
    ModelIdentity, PdoEmbedding, RiskInput, ScoredRisk, REQUIRED_EMBEDDING_FIELDS,
};
pub use error::{FailureMode, GlassBoxError};
pub use executor::{ExecutionResult, GlassBoxExecutor, RiskScorer};
pub use ledger::{MonotonicityLedger, MonotonicityState};
