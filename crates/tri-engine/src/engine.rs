//! TRI engine: event summary in, explained risk index out
//!
//! The engine orchestrates feature extraction, domain aggregation, trust
//! weighting, and confidence banding. It is a pure function over the
//! caller's `EventSummary` — no I/O, no shared state, and zero decision
//! authority: every result is advisory only, structurally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use tri_core::{ConfidenceBand, RiskTier, TriError, MODEL_VERSION};

use crate::extractors::{
    extract_artifact_failures, extract_boot_failures, extract_corrections, extract_denial_rate,
    extract_drift_events, extract_envelope_violations, extract_escalation_recovery_rate,
    extract_escalation_trigger_rate, extract_fingerprint_changes, extract_forbidden_verbs,
    extract_freshness_violation, extract_manifest_deltas, extract_replay_denials,
    extract_scope_violations, extract_tool_denials,
};
use crate::features::{FeatureValue, RiskDomain};
use crate::trust::{adjust_band_for_trust, compute_trust_weights, TrustInputs, TrustWeights};

/// Event count at which the baseline confidence band reaches its
/// narrowest width.
pub const MIN_EVENTS_FOR_NARROW_CONFIDENCE: u64 = 100;

/// Event count below which the baseline band stays at its widest.
pub const MIN_EVENTS_FOR_VALID_SCORE: u64 = 10;

/// Baseline band width with rich data.
pub const CONFIDENCE_BASE_WIDTH: f64 = 0.10;

/// Baseline band width with poor data.
pub const CONFIDENCE_MAX_WIDTH: f64 = 0.40;

/// Summarized event data for one evaluation window.
///
/// This is the interface between governance event stores and the TRI
/// engine: the telemetry layer populates it, the engine never queries
/// anything itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    // Time context
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,

    // Governance Integrity events
    pub total_decisions: u64,
    pub denied_decisions: u64,
    pub last_denial: Option<DateTime<Utc>>,

    pub scope_violations: Vec<DateTime<Utc>>,
    pub forbidden_verb_attempts: u64,
    pub last_forbidden_verb: Option<DateTime<Utc>>,

    pub tool_requests: u64,
    pub tool_denials: u64,
    pub last_tool_denial: Option<DateTime<Utc>>,

    pub artifact_verifications: u64,
    pub artifact_failures: u64,
    pub last_artifact_failure: Option<DateTime<Utc>>,

    // Operational Discipline events
    pub total_operations: u64,
    pub escalation_triggers: u64,
    pub last_escalation_trigger: Option<DateTime<Utc>>,

    pub corrections: u64,
    pub last_correction: Option<DateTime<Utc>>,

    pub replay_denials: u64,
    pub last_replay_denial: Option<DateTime<Utc>>,

    pub envelope_violations: u64,
    pub last_envelope_violation: Option<DateTime<Utc>>,

    pub escalations: u64,
    pub escalation_recoveries: u64,
    pub last_escalation_recovery: Option<DateTime<Utc>>,

    // System Drift events
    pub drift_events: Vec<DateTime<Utc>>,
    pub fingerprint_changes: u64,
    pub last_fingerprint_change: Option<DateTime<Utc>>,

    pub boot_attempts: u64,
    pub boot_failures: u64,
    pub last_boot_failure: Option<DateTime<Utc>>,

    pub manifest_deltas: u64,
    pub last_manifest_delta: Option<DateTime<Utc>>,

    pub last_event_time: Option<DateTime<Utc>>,

    // Trust weight inputs
    pub gameday_passing: u64,
    pub gameday_total: u64,
    pub bound_executions: u64,
    pub total_executions: u64,
}

impl EventSummary {
    /// An all-zero summary over the given window, for baselines and tests.
    pub fn empty(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            window_start,
            window_end,
            total_decisions: 0,
            denied_decisions: 0,
            last_denial: None,
            scope_violations: Vec::new(),
            forbidden_verb_attempts: 0,
            last_forbidden_verb: None,
            tool_requests: 0,
            tool_denials: 0,
            last_tool_denial: None,
            artifact_verifications: 0,
            artifact_failures: 0,
            last_artifact_failure: None,
            total_operations: 0,
            escalation_triggers: 0,
            last_escalation_trigger: None,
            corrections: 0,
            last_correction: None,
            replay_denials: 0,
            last_replay_denial: None,
            envelope_violations: 0,
            last_envelope_violation: None,
            escalations: 0,
            escalation_recoveries: 0,
            last_escalation_recovery: None,
            drift_events: Vec::new(),
            fingerprint_changes: 0,
            last_fingerprint_change: None,
            boot_attempts: 0,
            boot_failures: 0,
            last_boot_failure: None,
            manifest_deltas: 0,
            last_manifest_delta: None,
            last_event_time: None,
            gameday_passing: 0,
            gameday_total: 0,
            bound_executions: 0,
            total_executions: 0,
        }
    }

    /// Total event count, used for density and confidence decisions.
    pub fn total_events(&self) -> u64 {
        self.total_decisions
            + self.scope_violations.len() as u64
            + self.forbidden_verb_attempts
            + self.tool_requests
            + self.artifact_verifications
            + self.total_operations
            + self.corrections
            + self.replay_denials
            + self.envelope_violations
            + self.escalations
            + self.drift_events.len() as u64
            + self.fingerprint_changes
            + self.boot_attempts
            + self.manifest_deltas
    }

    /// Window size in (possibly fractional) hours.
    pub fn window_hours(&self) -> f64 {
        (self.window_end - self.window_start).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Window label used in feature values and result metadata.
    pub fn window_label(&self) -> String {
        format!("{}h", self.window_hours().round() as i64)
    }
}

/// Aggregated score for one risk domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: RiskDomain,
    /// Weighted sum of the domain's non-missing feature values, in [0, 1].
    pub score: f64,
    /// Fixed domain weight within the final index.
    pub weight: f64,
    /// The five contributing feature values.
    pub features: Vec<FeatureValue>,
    /// How many of the five reported "no data".
    pub null_count: usize,
}

impl DomainScore {
    /// This domain's share of the final TRI.
    pub fn weighted_contribution(&self) -> f64 {
        self.score * self.weight
    }
}

/// Marker that serializes as `true` and refuses to deserialize from
/// anything else. Owning one is proof the result is advisory only; a
/// result claiming decision authority cannot be constructed or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvisoryOnly;

impl Serialize for AdvisoryOnly {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for AdvisoryOnly {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let flag = bool::deserialize(deserializer)?;
        if !flag {
            return Err(serde::de::Error::custom(
                TriError::AdvisoryFlagViolation.to_string(),
            ));
        }
        Ok(AdvisoryOnly)
    }
}

/// The final Trust Risk Index record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriResult {
    /// Point estimate in [0, 1].
    pub tri: f64,
    pub confidence: ConfidenceBand,
    pub tier: RiskTier,
    pub domains: Vec<DomainScore>,
    pub trust_weights: TrustWeights,

    // Evaluation metadata
    pub computed_at: DateTime<Utc>,
    pub window: String,
    pub event_count: u64,
    /// Number of features that actually produced a value.
    pub feature_count: usize,
    /// Wire names of the features that reported "no data".
    pub null_features: Vec<String>,
    pub model_version: String,

    /// Structural guarantee: always true, cannot be constructed false.
    pub advisory_only: AdvisoryOnly,
}

impl TriResult {
    /// Flat JSON rendering for downstream consumers.
    pub fn to_value(&self) -> serde_json::Value {
        let domains: serde_json::Map<String, serde_json::Value> = self
            .domains
            .iter()
            .map(|ds| {
                (
                    ds.domain.name().to_string(),
                    json!({
                        "score": ds.score,
                        "weight": ds.weight,
                        "weighted_contribution": ds.weighted_contribution(),
                        "null_count": ds.null_count,
                    }),
                )
            })
            .collect();

        json!({
            "tri": self.tri,
            "confidence": {
                "lower": self.confidence.lower(),
                "upper": self.confidence.upper(),
            },
            "tier": self.tier.to_string(),
            "domains": domains,
            "trust_weights": {
                "freshness": self.trust_weights.freshness(),
                "gameday": self.trust_weights.gameday(),
                "evidence": self.trust_weights.evidence(),
                "density": self.trust_weights.density(),
                "composite": self.trust_weights.composite(),
            },
            "metadata": {
                "computed_at": self.computed_at.to_rfc3339(),
                "window": self.window,
                "event_count": self.event_count,
                "feature_count": self.feature_count,
                "null_features": self.null_features,
                "model_version": self.model_version,
            },
            "advisory_only": true,
        })
    }
}

/// Trust Risk Index computation engine.
///
/// Caller-owned; construct one per consumer and pass it by reference.
/// There is no shared default instance.
#[derive(Debug, Clone)]
pub struct TriEngine {
    model_version: String,
}

impl TriEngine {
    pub fn new() -> Self {
        Self {
            model_version: MODEL_VERSION.to_string(),
        }
    }

    pub fn with_model_version(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
        }
    }

    /// Compute the Trust Risk Index for one event summary.
    ///
    /// `now` defaults to the window end, which keeps repeated evaluations
    /// of the same summary bit-identical.
    pub fn compute(
        &self,
        events: &EventSummary,
        now: Option<DateTime<Utc>>,
    ) -> Result<TriResult, TriError> {
        let now = now.unwrap_or(events.window_end);
        let window = events.window_label();

        let features = extract_all_features(events, now, &window)?;
        debug!(
            feature_count = features.len(),
            window = %window,
            "extracted features"
        );

        let domains = aggregate_domains(&features);

        let trust_weights = compute_trust_weights(
            &TrustInputs {
                last_event_time: events.last_event_time,
                passing_scenarios: events.gameday_passing,
                total_scenarios: events.gameday_total,
                bound_executions: events.bound_executions,
                total_executions: events.total_executions,
                event_count: events.total_events(),
                window_hours: events.window_hours(),
            },
            now,
        );

        // Point estimate: weighted sum of bounded domain scores over
        // normalized weights. Trust weights never touch it.
        let tri: f64 = domains.iter().map(DomainScore::weighted_contribution).sum();
        if !(0.0..=1.0).contains(&tri) {
            return Err(TriError::ScoreOutOfRange {
                context: "tri".to_string(),
                value: tri,
            });
        }

        let baseline = baseline_band(events.total_events(), tri)?;
        let confidence = adjust_band_for_trust(baseline, &trust_weights)?;
        let tier = RiskTier::from_score(tri);

        let null_features: Vec<String> = features
            .iter()
            .filter(|fv| fv.is_missing())
            .map(|fv| fv.feature_id.name().to_string())
            .collect();
        let feature_count = features.len() - null_features.len();

        info!(
            tri,
            tier = %tier,
            event_count = events.total_events(),
            null_features = null_features.len(),
            "computed trust risk index"
        );

        Ok(TriResult {
            tri,
            confidence,
            tier,
            domains,
            trust_weights,
            computed_at: now,
            window,
            event_count: events.total_events(),
            feature_count,
            null_features,
            model_version: self.model_version.clone(),
            advisory_only: AdvisoryOnly,
        })
    }
}

impl Default for TriEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract all fifteen features from the summary.
fn extract_all_features(
    events: &EventSummary,
    now: DateTime<Utc>,
    window: &str,
) -> Result<Vec<FeatureValue>, TriError> {
    Ok(vec![
        // Governance Integrity
        extract_denial_rate(
            events.denied_decisions,
            events.total_decisions,
            window,
            events.last_denial,
        )?,
        extract_scope_violations(&events.scope_violations, window, now)?,
        extract_forbidden_verbs(
            events.forbidden_verb_attempts,
            window,
            events.last_forbidden_verb,
        )?,
        extract_tool_denials(
            events.tool_denials,
            events.tool_requests,
            window,
            events.last_tool_denial,
        )?,
        extract_artifact_failures(
            events.artifact_failures,
            events.artifact_verifications,
            window,
            events.last_artifact_failure,
        )?,
        // Operational Discipline
        extract_escalation_trigger_rate(
            events.escalation_triggers,
            events.total_operations,
            window,
            events.last_escalation_trigger,
        )?,
        extract_corrections(events.corrections, window, events.last_correction)?,
        extract_replay_denials(events.replay_denials, window, events.last_replay_denial)?,
        extract_envelope_violations(
            events.envelope_violations,
            window,
            events.last_envelope_violation,
        )?,
        extract_escalation_recovery_rate(
            events.escalation_recoveries,
            events.escalations,
            window,
            events.last_escalation_recovery,
        )?,
        // System Drift
        extract_drift_events(&events.drift_events, window, now)?,
        extract_fingerprint_changes(
            events.fingerprint_changes,
            window,
            events.last_fingerprint_change,
        )?,
        extract_boot_failures(
            events.boot_failures,
            events.boot_attempts,
            window,
            events.last_boot_failure,
        )?,
        extract_manifest_deltas(events.manifest_deltas, window, events.last_manifest_delta)?,
        extract_freshness_violation(events.last_event_time, window, now)?,
    ])
}

/// Combine each domain's five features into one domain score.
///
/// Missing features are skipped and counted; their weight is NOT
/// redistributed to the remaining features — absence of a signal is not
/// evidence of its opposite.
fn aggregate_domains(features: &[FeatureValue]) -> Vec<DomainScore> {
    RiskDomain::ALL
        .iter()
        .map(|&domain| {
            let domain_features: Vec<FeatureValue> = features
                .iter()
                .filter(|fv| fv.feature_id.domain() == domain)
                .cloned()
                .collect();

            let mut score = 0.0;
            let mut null_count = 0;
            for fv in &domain_features {
                match fv.value() {
                    Some(value) => score += value * fv.feature_id.weight(),
                    None => null_count += 1,
                }
            }

            DomainScore {
                domain,
                score,
                weight: domain.weight(),
                features: domain_features,
                null_count,
            }
        })
        .collect()
}

/// Baseline band from data richness: richer data, narrower band.
fn baseline_band(event_count: u64, tri: f64) -> Result<ConfidenceBand, TriError> {
    let width = if event_count >= MIN_EVENTS_FOR_NARROW_CONFIDENCE {
        CONFIDENCE_BASE_WIDTH
    } else if event_count >= MIN_EVENTS_FOR_VALID_SCORE {
        let progress = (event_count - MIN_EVENTS_FOR_VALID_SCORE) as f64
            / (MIN_EVENTS_FOR_NARROW_CONFIDENCE - MIN_EVENTS_FOR_VALID_SCORE) as f64;
        CONFIDENCE_MAX_WIDTH - progress * (CONFIDENCE_MAX_WIDTH - CONFIDENCE_BASE_WIDTH)
    } else {
        CONFIDENCE_MAX_WIDTH
    };

    let half = width / 2.0;
    ConfidenceBand::new((tri - half).max(0.0), (tri + half).min(1.0))
}
