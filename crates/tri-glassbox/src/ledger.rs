//! Per-activation monotonicity ledger
//!
//! The only mutable state in the subsystem: the last observed (score,
//! tier) per activation reference, behind a narrow lock-guarded
//! check-and-update interface. Severity must never regress while the
//! underlying score rises.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use tri_core::RiskTier;

use crate::error::GlassBoxError;

/// Last observed evaluation for one activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonotonicityState {
    pub last_score: f64,
    pub last_tier: RiskTier,
    pub evaluations: u64,
}

/// Keyed store of monotonicity states, serialized per process.
///
/// Entries are created on first evaluation for an activation and updated
/// on every subsequent one; they are retired only when the owning
/// executor is dropped (activation lifecycle belongs to the caller).
#[derive(Debug, Default)]
pub struct MonotonicityLedger {
    states: Mutex<HashMap<String, MonotonicityState>>,
}

impl MonotonicityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the new (score, tier) with the stored state for this
    /// activation and record it if the monotonicity invariant holds.
    ///
    /// The forbidden transition is a strictly higher score with a
    /// strictly less severe tier. Ties, score decreases, and matching or
    /// more severe tiers all pass. On violation the stored state is left
    /// untouched.
    pub fn check_and_update(
        &self,
        activation_hash: &str,
        score: f64,
        tier: RiskTier,
    ) -> Result<MonotonicityState, GlassBoxError> {
        let mut states = self.lock();

        if let Some(previous) = states.get(activation_hash) {
            if score > previous.last_score && tier.severity() < previous.last_tier.severity() {
                warn!(
                    activation = activation_hash,
                    previous_score = previous.last_score,
                    previous_tier = %previous.last_tier,
                    new_score = score,
                    new_tier = %tier,
                    "monotonicity regression rejected"
                );
                return Err(GlassBoxError::MonotonicityViolation(format!(
                    "activation {}: score rose {} -> {} but tier regressed {} -> {}",
                    activation_hash, previous.last_score, score, previous.last_tier, tier
                )));
            }
        }

        let evaluations = states
            .get(activation_hash)
            .map(|s| s.evaluations + 1)
            .unwrap_or(1);
        let state = MonotonicityState {
            last_score: score,
            last_tier: tier,
            evaluations,
        };
        states.insert(activation_hash.to_string(), state);
        Ok(state)
    }

    /// Last recorded state for an activation, if any.
    pub fn last(&self, activation_hash: &str) -> Option<MonotonicityState> {
        self.lock().get(activation_hash).copied()
    }

    /// Number of activations tracked.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MonotonicityState>> {
        // The critical section never panics, but recover from poisoning
        // anyway rather than propagating a panic across evaluations.
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureMode;

    #[test]
    fn test_first_evaluation_always_passes() {
        let ledger = MonotonicityLedger::new();
        let state = ledger.check_and_update("act-1", 0.5, RiskTier::Moderate).unwrap();
        assert_eq!(state.last_score, 0.5);
        assert_eq!(state.last_tier, RiskTier::Moderate);
        assert_eq!(state.evaluations, 1);
    }

    #[test]
    fn test_rising_score_same_tier_passes() {
        let ledger = MonotonicityLedger::new();
        ledger.check_and_update("act-1", 0.30, RiskTier::Low).unwrap();
        let state = ledger.check_and_update("act-1", 0.35, RiskTier::Low).unwrap();
        assert_eq!(state.evaluations, 2);
    }

    #[test]
    fn test_rising_score_less_severe_tier_hard_fails() {
        let ledger = MonotonicityLedger::new();
        ledger.check_and_update("act-1", 0.50, RiskTier::Moderate).unwrap();

        let err = ledger
            .check_and_update("act-1", 0.55, RiskTier::Minimal)
            .unwrap_err();
        assert_eq!(err.mode(), FailureMode::MonotonicityViolation);

        // Failed update must not touch the stored state
        let state = ledger.last("act-1").unwrap();
        assert_eq!(state.last_score, 0.50);
        assert_eq!(state.last_tier, RiskTier::Moderate);
        assert_eq!(state.evaluations, 1);
    }

    #[test]
    fn test_falling_score_passes() {
        let ledger = MonotonicityLedger::new();
        ledger.check_and_update("act-1", 0.70, RiskTier::High).unwrap();
        // Lower score with a less severe tier is fine
        assert!(ledger.check_and_update("act-1", 0.30, RiskTier::Low).is_ok());
    }

    #[test]
    fn test_tie_passes() {
        let ledger = MonotonicityLedger::new();
        ledger.check_and_update("act-1", 0.50, RiskTier::Moderate).unwrap();
        assert!(ledger
            .check_and_update("act-1", 0.50, RiskTier::Moderate)
            .is_ok());
    }

    #[test]
    fn test_concurrent_updates_on_one_activation() {
        use std::thread;

        let ledger = MonotonicityLedger::new();
        ledger
            .check_and_update("act-1", 0.50, RiskTier::Moderate)
            .unwrap();

        // Valid and violating updates race on the same activation. The
        // violation (higher score, strictly less severe tier) must lose
        // against either prior state, no matter the interleaving.
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    ledger
                        .check_and_update("act-1", 0.55, RiskTier::Moderate)
                        .unwrap();
                });
                s.spawn(|| {
                    let err = ledger
                        .check_and_update("act-1", 0.60, RiskTier::Minimal)
                        .unwrap_err();
                    assert_eq!(err.mode(), FailureMode::MonotonicityViolation);
                });
            }
        });

        // Only the initial write and the eight valid updates landed
        let state = ledger.last("act-1").unwrap();
        assert_eq!(state.last_score, 0.55);
        assert_eq!(state.last_tier, RiskTier::Moderate);
        assert_eq!(state.evaluations, 9);
    }

    #[test]
    fn test_activations_are_independent() {
        let ledger = MonotonicityLedger::new();
        ledger.check_and_update("act-1", 0.50, RiskTier::Moderate).unwrap();
        // A fresh activation is unconstrained by act-1's history
        assert!(ledger
            .check_and_update("act-2", 0.55, RiskTier::Minimal)
            .is_ok());
        assert_eq!(ledger.len(), 2);
    }
}
