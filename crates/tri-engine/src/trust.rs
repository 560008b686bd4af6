//! Trust weights: data-reliability penalty multipliers
//!
//! Four independent multipliers in [1.0, 2.0] describe how much the
//! observed data can be trusted. They never rescale the TRI point
//! estimate; unreliable data manifests only as a wider confidence band.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tri_core::{ConfidenceBand, TriError};

use crate::transforms::hours_since;

/// Last event at or under this age draws no freshness penalty.
pub const FRESHNESS_IDEAL_HOURS: f64 = 6.0;

/// Last event at or beyond this age draws the maximum freshness penalty.
pub const FRESHNESS_MAX_PENALTY_HOURS: f64 = 72.0;

/// Events per hour at or above this rate draw no density penalty.
pub const DENSITY_DENSE_PER_HOUR: f64 = 10.0;

/// Events per hour at or below this rate draw the maximum density
/// penalty.
pub const DENSITY_SPARSE_PER_HOUR: f64 = 0.5;

/// Band widening per unit of composite above 1.0. At composite = 2.0 each
/// bound moves by this much (before clamping into [0, 1]).
pub const TRUST_BAND_PENALTY_SCALE: f64 = 0.15;

/// Neutral weight used when an input stream has nothing to say either way.
const NEUTRAL_WEIGHT: f64 = 1.5;

/// The four reliability multipliers plus their geometric-mean composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrustWeights {
    freshness: f64,
    gameday: f64,
    evidence: f64,
    density: f64,
}

impl TrustWeights {
    /// Create trust weights, enforcing each multiplier into [1.0, 2.0].
    pub fn new(
        freshness: f64,
        gameday: f64,
        evidence: f64,
        density: f64,
    ) -> Result<Self, TriError> {
        for (name, value) in [
            ("freshness", freshness),
            ("gameday", gameday),
            ("evidence", evidence),
            ("density", density),
        ] {
            if !(1.0..=2.0).contains(&value) || value.is_nan() {
                return Err(TriError::TrustWeightOutOfRange {
                    weight: name.to_string(),
                    value,
                });
            }
        }
        Ok(Self {
            freshness,
            gameday,
            evidence,
            density,
        })
    }

    /// Fully trusted data: all multipliers at the 1.0 floor.
    pub fn fully_trusted() -> Self {
        Self {
            freshness: 1.0,
            gameday: 1.0,
            evidence: 1.0,
            density: 1.0,
        }
    }

    pub fn freshness(&self) -> f64 {
        self.freshness
    }

    pub fn gameday(&self) -> f64 {
        self.gameday
    }

    pub fn evidence(&self) -> f64 {
        self.evidence
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    /// Geometric mean of the four multipliers: `(f·g·e·d)^0.25`.
    pub fn composite(&self) -> f64 {
        (self.freshness * self.gameday * self.evidence * self.density).powf(0.25)
    }
}

// Parsed weights pass through the same range check as constructed ones.
impl<'de> Deserialize<'de> for TrustWeights {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            freshness: f64,
            gameday: f64,
            evidence: f64,
            density: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        TrustWeights::new(raw.freshness, raw.gameday, raw.evidence, raw.density)
            .map_err(serde::de::Error::custom)
    }
}

/// Inputs for trust weight computation, drawn from the event summary.
#[derive(Debug, Clone, Copy)]
pub struct TrustInputs {
    pub last_event_time: Option<DateTime<Utc>>,
    pub passing_scenarios: u64,
    pub total_scenarios: u64,
    pub bound_executions: u64,
    pub total_executions: u64,
    pub event_count: u64,
    pub window_hours: f64,
}

/// Compute the four trust weights from raw reliability signals.
pub fn compute_trust_weights(inputs: &TrustInputs, now: DateTime<Utc>) -> TrustWeights {
    let freshness = freshness_weight(inputs.last_event_time, now);
    let gameday = gameday_weight(inputs.passing_scenarios, inputs.total_scenarios);
    let evidence = evidence_weight(inputs.bound_executions, inputs.total_executions);
    let density = density_weight(inputs.event_count, inputs.window_hours);

    // Each component function keeps its result inside [1.0, 2.0], so this
    // construction cannot fail.
    TrustWeights {
        freshness,
        gameday,
        evidence,
        density,
    }
}

/// 1.0 at or under the ideal recency, 2.0 at or beyond the max-penalty
/// recency, linear in between. No event at all is the worst case.
fn freshness_weight(last_event_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let hours = hours_since(last_event_time, now);
    if hours <= FRESHNESS_IDEAL_HOURS {
        1.0
    } else if hours >= FRESHNESS_MAX_PENALTY_HOURS {
        2.0
    } else {
        let span = FRESHNESS_MAX_PENALTY_HOURS - FRESHNESS_IDEAL_HOURS;
        1.0 + (hours - FRESHNESS_IDEAL_HOURS) / span
    }
}

/// 1.0 at a 100% scenario pass rate, 2.0 at 0%. Zero scenarios recorded
/// means no validation at all: maximum penalty, not neutral.
fn gameday_weight(passing: u64, total: u64) -> f64 {
    if total == 0 {
        return 2.0;
    }
    let pass_rate = (passing as f64 / total as f64).min(1.0);
    2.0 - pass_rate
}

/// 1.0 when every execution is bound to evidence, 2.0 when none are.
/// Zero executions recorded is neutral: absence of executions is not
/// itself evidence of unreliability.
fn evidence_weight(bound: u64, total: u64) -> f64 {
    if total == 0 {
        return NEUTRAL_WEIGHT;
    }
    let bound_rate = (bound as f64 / total as f64).min(1.0);
    2.0 - bound_rate
}

/// Logarithmic interpolation between the sparse and dense thresholds:
/// going from 2 to 5 events/hour reads like going from 5 to 10. A
/// zero-length window is neutral.
fn density_weight(event_count: u64, window_hours: f64) -> f64 {
    if window_hours <= 0.0 {
        return NEUTRAL_WEIGHT;
    }
    let rate = event_count as f64 / window_hours;
    if rate >= DENSITY_DENSE_PER_HOUR {
        return 1.0;
    }
    if rate <= DENSITY_SPARSE_PER_HOUR {
        return 2.0;
    }
    let progress = (rate.ln() - DENSITY_SPARSE_PER_HOUR.ln())
        / (DENSITY_DENSE_PER_HOUR.ln() - DENSITY_SPARSE_PER_HOUR.ln());
    2.0 - progress
}

/// Widen a baseline confidence band according to the trust composite.
///
/// At composite = 1.0 the band is unchanged. Above 1.0 each bound moves
/// outward by `(composite - 1.0) * TRUST_BAND_PENALTY_SCALE`, clamped
/// into [0, 1].
pub fn adjust_band_for_trust(
    band: ConfidenceBand,
    weights: &TrustWeights,
) -> Result<ConfidenceBand, TriError> {
    let penalty = (weights.composite() - 1.0) * TRUST_BAND_PENALTY_SCALE;
    if penalty <= 0.0 {
        return Ok(band);
    }
    let lower = (band.lower() - penalty).max(0.0);
    let upper = (band.upper() + penalty).min(1.0);
    ConfidenceBand::new(lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_weights_bounds_enforced() {
        assert!(TrustWeights::new(1.0, 1.0, 1.0, 1.0).is_ok());
        assert!(TrustWeights::new(2.0, 2.0, 2.0, 2.0).is_ok());
        assert!(TrustWeights::new(0.9, 1.0, 1.0, 1.0).is_err());
        assert!(TrustWeights::new(1.0, 2.1, 1.0, 1.0).is_err());
        assert!(TrustWeights::new(1.0, 1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_deserialize_enforces_weight_bounds() {
        let bad = r#"{"freshness":9.0,"gameday":1.0,"evidence":1.0,"density":1.0}"#;
        assert!(serde_json::from_str::<TrustWeights>(bad).is_err());

        let ok = r#"{"freshness":1.2,"gameday":1.0,"evidence":1.5,"density":2.0}"#;
        let w: TrustWeights = serde_json::from_str(ok).unwrap();
        assert_eq!(w.freshness(), 1.2);
        assert_eq!(w.density(), 2.0);
    }

    #[test]
    fn test_composite_is_geometric_mean() {
        let w = TrustWeights::new(1.0, 2.0, 1.0, 2.0).unwrap();
        let expected = (1.0_f64 * 2.0 * 1.0 * 2.0).powf(0.25);
        assert!((w.composite() - expected).abs() < 1e-12);

        let trusted = TrustWeights::fully_trusted();
        assert!((trusted.composite() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_freshness_recent_event_is_exactly_one() {
        let now = Utc::now();
        let inputs = TrustInputs {
            last_event_time: Some(now - Duration::hours(1)),
            passing_scenarios: 0,
            total_scenarios: 0,
            bound_executions: 0,
            total_executions: 0,
            event_count: 0,
            window_hours: 24.0,
        };
        let w = compute_trust_weights(&inputs, now);
        assert_eq!(w.freshness(), 1.0);
    }

    #[test]
    fn test_freshness_no_events_is_exactly_two() {
        let now = Utc::now();
        let inputs = TrustInputs {
            last_event_time: None,
            passing_scenarios: 0,
            total_scenarios: 0,
            bound_executions: 0,
            total_executions: 0,
            event_count: 0,
            window_hours: 24.0,
        };
        let w = compute_trust_weights(&inputs, now);
        assert_eq!(w.freshness(), 2.0);
    }

    #[test]
    fn test_gameday_edges() {
        let now = Utc::now();
        let base = TrustInputs {
            last_event_time: Some(now),
            passing_scenarios: 0,
            total_scenarios: 0,
            bound_executions: 0,
            total_executions: 0,
            event_count: 0,
            window_hours: 24.0,
        };

        // No scenarios: worst case, not neutral
        assert_eq!(compute_trust_weights(&base, now).gameday(), 2.0);

        let all_pass = TrustInputs {
            passing_scenarios: 10,
            total_scenarios: 10,
            ..base
        };
        assert_eq!(compute_trust_weights(&all_pass, now).gameday(), 1.0);

        let half_pass = TrustInputs {
            passing_scenarios: 5,
            total_scenarios: 10,
            ..base
        };
        assert!((compute_trust_weights(&half_pass, now).gameday() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_evidence_zero_executions_is_neutral() {
        let now = Utc::now();
        let inputs = TrustInputs {
            last_event_time: Some(now),
            passing_scenarios: 0,
            total_scenarios: 0,
            bound_executions: 0,
            total_executions: 0,
            event_count: 0,
            window_hours: 24.0,
        };
        assert_eq!(compute_trust_weights(&inputs, now).evidence(), 1.5);
    }

    #[test]
    fn test_density_logarithmic_midpoint() {
        let now = Utc::now();
        let make = |events: u64| TrustInputs {
            last_event_time: Some(now),
            passing_scenarios: 0,
            total_scenarios: 0,
            bound_executions: 0,
            total_executions: 0,
            event_count: events,
            window_hours: 1.0,
        };

        assert_eq!(compute_trust_weights(&make(20), now).density(), 1.0);
        assert_eq!(compute_trust_weights(&make(0), now).density(), 2.0);

        // Log interpolation: 2→5 events/hour improves about as much as
        // 5→10 does (ratios ~2.5 and 2.0)
        let at_2 = compute_trust_weights(&make(2), now).density();
        let at_5 = compute_trust_weights(&make(5), now).density();
        let at_10 = compute_trust_weights(&make(10), now).density();
        let first_step = at_2 - at_5;
        let second_step = at_5 - at_10;
        assert!(first_step > 0.0 && second_step > 0.0);
        assert!((first_step - second_step).abs() < 0.15);
    }

    #[test]
    fn test_density_zero_window_is_neutral() {
        let now = Utc::now();
        let inputs = TrustInputs {
            last_event_time: Some(now),
            passing_scenarios: 0,
            total_scenarios: 0,
            bound_executions: 0,
            total_executions: 0,
            event_count: 100,
            window_hours: 0.0,
        };
        assert_eq!(compute_trust_weights(&inputs, now).density(), 1.5);
    }

    #[test]
    fn test_adjust_band_unchanged_at_full_trust() {
        let band = ConfidenceBand::new(0.3, 0.5).unwrap();
        let adjusted = adjust_band_for_trust(band, &TrustWeights::fully_trusted()).unwrap();
        assert_eq!(adjusted, band);
    }

    #[test]
    fn test_adjust_band_widens_and_clamps_at_max_penalty() {
        let weights = TrustWeights::new(2.0, 2.0, 2.0, 2.0).unwrap();

        let band = ConfidenceBand::new(0.3, 0.5).unwrap();
        let adjusted = adjust_band_for_trust(band, &weights).unwrap();
        assert!(adjusted.lower() < band.lower());
        assert!(adjusted.upper() > band.upper());

        // Near the edges the widened band clamps into [0, 1]
        let edge = ConfidenceBand::new(0.02, 0.98).unwrap();
        let adjusted = adjust_band_for_trust(edge, &weights).unwrap();
        assert_eq!(adjusted.lower(), 0.0);
        assert_eq!(adjusted.upper(), 1.0);
    }
}
