//! TRI Engine: deterministic, explainable Trust Risk Index computation
//!
//! Converts counts and timestamps of governance and operational events
//! into a bounded risk score with an uncertainty band, a severity tier,
//! and a full per-feature contribution breakdown.
//!
//! # Architecture
//!
//! ```text
//! EventSummary → Feature Extractors → Domain Aggregation → TRI Composer
//!                      ↓                      ↓                 ↓
//!                FeatureValue           DomainScore         TriResult
//!                                                               ↓
//!                                                      ContributionRow view
//! ```
//!
//! Everything is a pure function over caller-supplied values: no I/O, no
//! shared state, and no decision authority. Trust weights quantify data
//! reliability and widen the confidence band, but never move the point
//! estimate.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use tri_engine::{EventSummary, TriEngine};
//!
//! let end = Utc::now();
//! let mut events = EventSummary::empty(end - Duration::hours(24), end);
//! events.total_decisions = 100;
//! events.denied_decisions = 5;
//! events.last_event_time = Some(end - Duration::minutes(30));
//!
//! let engine = TriEngine::new();
//! let result = engine.compute(&events, None).unwrap();
//!
//! println!("TRI: {:.4} ({})", result.tri, result.tier);
//! for row in tri_engine::contribution_rows(&result).iter().take(3) {
//!     println!("  {}", row.describe());
//! }
//! ```

pub mod engine;
pub mod explain;
pub mod extractors;
pub mod features;
pub mod transforms;
pub mod trust;

pub use engine::{AdvisoryOnly, DomainScore, EventSummary, TriEngine, TriResult};
pub use explain::{contribution_rows, ContributionRow};
pub use features::{FeatureId, FeatureValue, RiskDomain};
pub use trust::{adjust_band_for_trust, compute_trust_weights, TrustInputs, TrustWeights};

// Re-export the shared contract types alongside the engine.
pub use tri_core::{ConfidenceBand, RiskTier, TierAction, TriError};
