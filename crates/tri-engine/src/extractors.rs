//! Feature extractors: fifteen pure functions, five per risk domain
//!
//! Each extractor maps raw counts and timestamps from an event summary to
//! one bounded `FeatureValue`. Extractors never see governance stores
//! directly; the caller supplies pre-aggregated values.
//!
//! Extraction policy by category:
//! - rate features: capped numerator/denominator, "no data" when the
//!   denominator is zero
//! - recency-weighted lists: per-event half-life decay, summed then
//!   saturated; an empty list scores 0.0 (absence of violations is itself
//!   informative, not missing data)
//! - pure counts: saturating growth with a per-feature scale
//! - inverse rate: higher recovery rate lowers the contribution
//! - freshness: linear ramp between a fresh and a stale threshold; no
//!   events at all reads as maximal staleness
//! - mixed rate/count: a rate when the sample size supports one, a
//!   saturating count when it is too sparse for a stable rate

use chrono::{DateTime, Utc};

use tri_core::TriError;

use crate::features::{FeatureId, FeatureValue};
use crate::transforms::{
    exponential_decay, hours_since, rate_to_score, saturating_magnitude, saturating_score,
};

/// Half-life for recency-weighted violation lists.
pub const RECENCY_HALF_LIFE_HOURS: f64 = 12.0;

/// Scale for saturating the summed decay contributions of a list feature.
pub const RECENCY_SATURATION_SCALE: f64 = 3.0;

/// Minimum denominator for a rate to be meaningful. Below this the mixed
/// features fall back to a saturating count to avoid small-denominator
/// rate noise.
pub const MIN_RATE_SAMPLES: u64 = 10;

/// Freshness-violation ramp: 0.0 at or below the fresh threshold, 1.0 at
/// or beyond the stale threshold.
pub const FRESHNESS_FRESH_HOURS: f64 = 24.0;
pub const FRESHNESS_STALE_HOURS: f64 = 72.0;

// Saturation scales per pure-count feature.
const FORBIDDEN_VERB_SCALE: f64 = 5.0;
const CORRECTION_SCALE: f64 = 5.0;
const REPLAY_DENIAL_SCALE: f64 = 3.0;
const ENVELOPE_VIOLATION_SCALE: f64 = 3.0;
const FINGERPRINT_CHANGE_SCALE: f64 = 3.0;
const MANIFEST_DELTA_SCALE: f64 = 5.0;

// Sparse-sample fallback scales for the mixed rate/count features.
const TOOL_DENIAL_SCALE: f64 = 5.0;
const ARTIFACT_FAILURE_SCALE: f64 = 3.0;
const BOOT_FAILURE_SCALE: f64 = 2.0;

// === Governance Integrity ===

/// GI: fraction of governance decisions that were denied.
pub fn extract_denial_rate(
    denied_decisions: u64,
    total_decisions: u64,
    window: &str,
    last_denial: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    match rate_to_score(denied_decisions, total_decisions) {
        Some(rate) => FeatureValue::observed(
            FeatureId::DenialRate,
            rate,
            window,
            total_decisions,
            last_denial,
        ),
        None => Ok(FeatureValue::missing(FeatureId::DenialRate, window)),
    }
}

/// GI: recency-weighted scope violation pressure.
pub fn extract_scope_violations(
    violation_times: &[DateTime<Utc>],
    window: &str,
    now: DateTime<Utc>,
) -> Result<FeatureValue, TriError> {
    recency_weighted(FeatureId::ScopeViolations, violation_times, window, now)
}

/// GI: saturating count of forbidden verb attempts.
pub fn extract_forbidden_verbs(
    attempts: u64,
    window: &str,
    last_attempt: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    FeatureValue::observed(
        FeatureId::ForbiddenVerbAttempts,
        saturating_score(attempts, FORBIDDEN_VERB_SCALE),
        window,
        attempts,
        last_attempt,
    )
}

/// GI: tool denial pressure — a rate when enough requests were seen,
/// otherwise a saturating count.
pub fn extract_tool_denials(
    denials: u64,
    requests: u64,
    window: &str,
    last_denial: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    mixed_rate_count(
        FeatureId::ToolDenials,
        denials,
        requests,
        TOOL_DENIAL_SCALE,
        window,
        last_denial,
    )
}

/// GI: artifact verification failure pressure.
pub fn extract_artifact_failures(
    failures: u64,
    verifications: u64,
    window: &str,
    last_failure: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    mixed_rate_count(
        FeatureId::ArtifactFailures,
        failures,
        verifications,
        ARTIFACT_FAILURE_SCALE,
        window,
        last_failure,
    )
}

// === Operational Discipline ===

/// OD: fraction of operations that triggered an escalation.
pub fn extract_escalation_trigger_rate(
    triggers: u64,
    total_operations: u64,
    window: &str,
    last_trigger: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    match rate_to_score(triggers, total_operations) {
        Some(rate) => FeatureValue::observed(
            FeatureId::EscalationTriggerRate,
            rate,
            window,
            total_operations,
            last_trigger,
        ),
        None => Ok(FeatureValue::missing(FeatureId::EscalationTriggerRate, window)),
    }
}

/// OD: saturating count of corrections issued.
pub fn extract_corrections(
    corrections: u64,
    window: &str,
    last_correction: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    FeatureValue::observed(
        FeatureId::CorrectionCount,
        saturating_score(corrections, CORRECTION_SCALE),
        window,
        corrections,
        last_correction,
    )
}

/// OD: saturating count of replay denials.
pub fn extract_replay_denials(
    denials: u64,
    window: &str,
    last_denial: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    FeatureValue::observed(
        FeatureId::ReplayDenials,
        saturating_score(denials, REPLAY_DENIAL_SCALE),
        window,
        denials,
        last_denial,
    )
}

/// OD: saturating count of envelope violations.
pub fn extract_envelope_violations(
    violations: u64,
    window: &str,
    last_violation: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    FeatureValue::observed(
        FeatureId::EnvelopeViolations,
        saturating_score(violations, ENVELOPE_VIOLATION_SCALE),
        window,
        violations,
        last_violation,
    )
}

/// OD: inverse recovery rate. A higher recovery rate means lower risk,
/// so the score is `1 - recoveries/escalations`. Zero escalations means
/// there was nothing to recover from: "no data", not a score.
pub fn extract_escalation_recovery_rate(
    recoveries: u64,
    escalations: u64,
    window: &str,
    last_recovery: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    match rate_to_score(recoveries, escalations) {
        Some(rate) => FeatureValue::observed(
            FeatureId::EscalationRecoveryRate,
            1.0 - rate,
            window,
            escalations,
            last_recovery,
        ),
        None => Ok(FeatureValue::missing(FeatureId::EscalationRecoveryRate, window)),
    }
}

// === System Drift ===

/// SD: recency-weighted drift event pressure.
pub fn extract_drift_events(
    event_times: &[DateTime<Utc>],
    window: &str,
    now: DateTime<Utc>,
) -> Result<FeatureValue, TriError> {
    recency_weighted(FeatureId::DriftEventCount, event_times, window, now)
}

/// SD: saturating count of fingerprint changes.
pub fn extract_fingerprint_changes(
    changes: u64,
    window: &str,
    last_change: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    FeatureValue::observed(
        FeatureId::FingerprintChanges,
        saturating_score(changes, FINGERPRINT_CHANGE_SCALE),
        window,
        changes,
        last_change,
    )
}

/// SD: boot failure pressure — rate over attempts when enough attempts
/// were seen, saturating count otherwise.
pub fn extract_boot_failures(
    failures: u64,
    attempts: u64,
    window: &str,
    last_failure: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    mixed_rate_count(
        FeatureId::BootFailures,
        failures,
        attempts,
        BOOT_FAILURE_SCALE,
        window,
        last_failure,
    )
}

/// SD: saturating count of manifest deltas.
pub fn extract_manifest_deltas(
    deltas: u64,
    window: &str,
    last_delta: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    FeatureValue::observed(
        FeatureId::ManifestDeltas,
        saturating_score(deltas, MANIFEST_DELTA_SCALE),
        window,
        deltas,
        last_delta,
    )
}

/// SD: staleness of the event stream itself.
///
/// 0.0 while the last event is fresher than [`FRESHNESS_FRESH_HOURS`],
/// rising linearly to 1.0 at [`FRESHNESS_STALE_HOURS`]. No event at all
/// is the worst case (1.0), never "no data".
pub fn extract_freshness_violation(
    last_event_time: Option<DateTime<Utc>>,
    window: &str,
    now: DateTime<Utc>,
) -> Result<FeatureValue, TriError> {
    let hours = hours_since(last_event_time, now);
    let score = if hours <= FRESHNESS_FRESH_HOURS {
        0.0
    } else if hours >= FRESHNESS_STALE_HOURS {
        1.0
    } else {
        (hours - FRESHNESS_FRESH_HOURS) / (FRESHNESS_STALE_HOURS - FRESHNESS_FRESH_HOURS)
    };
    let samples = u64::from(last_event_time.is_some());
    FeatureValue::observed(
        FeatureId::FreshnessViolation,
        score,
        window,
        samples,
        last_event_time,
    )
}

// === Shared extraction shapes ===

fn recency_weighted(
    feature_id: FeatureId,
    event_times: &[DateTime<Utc>],
    window: &str,
    now: DateTime<Utc>,
) -> Result<FeatureValue, TriError> {
    let decayed_sum: f64 = event_times
        .iter()
        .map(|ts| exponential_decay(hours_since(Some(*ts), now), RECENCY_HALF_LIFE_HOURS))
        .sum();
    let last_seen = event_times.iter().max().copied();
    FeatureValue::observed(
        feature_id,
        saturating_magnitude(decayed_sum, RECENCY_SATURATION_SCALE),
        window,
        event_times.len() as u64,
        last_seen,
    )
}

fn mixed_rate_count(
    feature_id: FeatureId,
    numerator: u64,
    denominator: u64,
    sparse_scale: f64,
    window: &str,
    last_seen: Option<DateTime<Utc>>,
) -> Result<FeatureValue, TriError> {
    if denominator >= MIN_RATE_SAMPLES {
        // rate_to_score cannot return None here: denominator >= MIN_RATE_SAMPLES > 0
        let rate = rate_to_score(numerator, denominator).unwrap_or(0.0);
        FeatureValue::observed(feature_id, rate, window, denominator, last_seen)
    } else {
        FeatureValue::observed(
            feature_id,
            saturating_score(numerator, sparse_scale),
            window,
            numerator,
            last_seen,
        )
    }
}
