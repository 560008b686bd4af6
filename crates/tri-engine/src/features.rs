//! Feature and domain identity tables
//!
//! The fifteen feature kinds, their domains, and their relative weights
//! are fixed data. Each domain's five feature weights sum to exactly 1.0,
//! and the three domain weights sum to exactly 1.0, so any weighted
//! combination of bounded feature values stays bounded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use tri_core::TriError;

/// One of the three fixed risk domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDomain {
    GovernanceIntegrity,
    OperationalDiscipline,
    SystemDrift,
}

impl RiskDomain {
    /// Domain weight within the final TRI composition.
    pub fn weight(&self) -> f64 {
        match self {
            RiskDomain::GovernanceIntegrity => 0.40,
            RiskDomain::OperationalDiscipline => 0.35,
            RiskDomain::SystemDrift => 0.25,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RiskDomain::GovernanceIntegrity => "governance_integrity",
            RiskDomain::OperationalDiscipline => "operational_discipline",
            RiskDomain::SystemDrift => "system_drift",
        }
    }

    pub const ALL: [RiskDomain; 3] = [
        RiskDomain::GovernanceIntegrity,
        RiskDomain::OperationalDiscipline,
        RiskDomain::SystemDrift,
    ];
}

impl fmt::Display for RiskDomain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the fifteen feature kinds, five per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureId {
    // Governance Integrity
    DenialRate,
    ScopeViolations,
    ForbiddenVerbAttempts,
    ToolDenials,
    ArtifactFailures,
    // Operational Discipline
    EscalationTriggerRate,
    CorrectionCount,
    ReplayDenials,
    EnvelopeViolations,
    EscalationRecoveryRate,
    // System Drift
    DriftEventCount,
    FingerprintChanges,
    BootFailures,
    ManifestDeltas,
    FreshnessViolation,
}

impl FeatureId {
    /// The domain this feature belongs to.
    pub fn domain(&self) -> RiskDomain {
        match self {
            FeatureId::DenialRate
            | FeatureId::ScopeViolations
            | FeatureId::ForbiddenVerbAttempts
            | FeatureId::ToolDenials
            | FeatureId::ArtifactFailures => RiskDomain::GovernanceIntegrity,
            FeatureId::EscalationTriggerRate
            | FeatureId::CorrectionCount
            | FeatureId::ReplayDenials
            | FeatureId::EnvelopeViolations
            | FeatureId::EscalationRecoveryRate => RiskDomain::OperationalDiscipline,
            FeatureId::DriftEventCount
            | FeatureId::FingerprintChanges
            | FeatureId::BootFailures
            | FeatureId::ManifestDeltas
            | FeatureId::FreshnessViolation => RiskDomain::SystemDrift,
        }
    }

    /// Relative weight within the feature's domain. The five weights of
    /// each domain sum to exactly 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            FeatureId::DenialRate => 0.30,
            FeatureId::ScopeViolations => 0.25,
            FeatureId::ForbiddenVerbAttempts => 0.20,
            FeatureId::ToolDenials => 0.15,
            FeatureId::ArtifactFailures => 0.10,

            FeatureId::EscalationTriggerRate => 0.30,
            FeatureId::CorrectionCount => 0.25,
            FeatureId::ReplayDenials => 0.20,
            FeatureId::EnvelopeViolations => 0.15,
            FeatureId::EscalationRecoveryRate => 0.10,

            FeatureId::DriftEventCount => 0.30,
            FeatureId::FingerprintChanges => 0.25,
            FeatureId::BootFailures => 0.20,
            FeatureId::ManifestDeltas => 0.15,
            FeatureId::FreshnessViolation => 0.10,
        }
    }

    /// Wire name, matching the serde kebab-case rendering.
    pub fn name(&self) -> &'static str {
        match self {
            FeatureId::DenialRate => "denial-rate",
            FeatureId::ScopeViolations => "scope-violations",
            FeatureId::ForbiddenVerbAttempts => "forbidden-verb-attempts",
            FeatureId::ToolDenials => "tool-denials",
            FeatureId::ArtifactFailures => "artifact-failures",
            FeatureId::EscalationTriggerRate => "escalation-trigger-rate",
            FeatureId::CorrectionCount => "correction-count",
            FeatureId::ReplayDenials => "replay-denials",
            FeatureId::EnvelopeViolations => "envelope-violations",
            FeatureId::EscalationRecoveryRate => "escalation-recovery-rate",
            FeatureId::DriftEventCount => "drift-event-count",
            FeatureId::FingerprintChanges => "fingerprint-changes",
            FeatureId::BootFailures => "boot-failures",
            FeatureId::ManifestDeltas => "manifest-deltas",
            FeatureId::FreshnessViolation => "freshness-violation",
        }
    }

    pub const ALL: [FeatureId; 15] = [
        FeatureId::DenialRate,
        FeatureId::ScopeViolations,
        FeatureId::ForbiddenVerbAttempts,
        FeatureId::ToolDenials,
        FeatureId::ArtifactFailures,
        FeatureId::EscalationTriggerRate,
        FeatureId::CorrectionCount,
        FeatureId::ReplayDenials,
        FeatureId::EnvelopeViolations,
        FeatureId::EscalationRecoveryRate,
        FeatureId::DriftEventCount,
        FeatureId::FingerprintChanges,
        FeatureId::BootFailures,
        FeatureId::ManifestDeltas,
        FeatureId::FreshnessViolation,
    ];
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One extracted feature observation.
///
/// The value is either absent ("no data") or a number in [0.0, 1.0].
/// Absence is a first-class state, never a sentinel number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureValue {
    pub feature_id: FeatureId,
    value: Option<f64>,
    /// Evaluation window label, e.g. "24h".
    pub window: String,
    /// Number of raw samples behind this value.
    pub sample_count: u64,
    /// Most recent contributing event, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl FeatureValue {
    /// Create an observed value. Fails when the value is outside
    /// [0.0, 1.0] — out-of-range values are never clamped.
    pub fn observed(
        feature_id: FeatureId,
        value: f64,
        window: impl Into<String>,
        sample_count: u64,
        last_seen: Option<DateTime<Utc>>,
    ) -> Result<Self, TriError> {
        if !(0.0..=1.0).contains(&value) || value.is_nan() {
            return Err(TriError::FeatureOutOfRange {
                feature: feature_id.name().to_string(),
                value,
            });
        }
        Ok(Self {
            feature_id,
            value: Some(value),
            window: window.into(),
            sample_count,
            last_seen,
        })
    }

    /// Create a "no data" observation.
    pub fn missing(feature_id: FeatureId, window: impl Into<String>) -> Self {
        Self {
            feature_id,
            value: None,
            window: window.into(),
            sample_count: 0,
            last_seen: None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

// Parsed data obeys the same bounds as constructed data; an
// out-of-range value on the wire is a parse error, not a clamp.
impl<'de> Deserialize<'de> for FeatureValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            feature_id: FeatureId,
            #[serde(default)]
            value: Option<f64>,
            window: String,
            sample_count: u64,
            #[serde(default)]
            last_seen: Option<DateTime<Utc>>,
        }
        let raw = Raw::deserialize(deserializer)?;
        match raw.value {
            Some(value) => FeatureValue::observed(
                raw.feature_id,
                value,
                raw.window,
                raw.sample_count,
                raw.last_seen,
            )
            .map_err(serde::de::Error::custom),
            None => Ok(Self {
                feature_id: raw.feature_id,
                value: None,
                window: raw.window,
                sample_count: raw.sample_count,
                last_seen: raw.last_seen,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_weights_sum_to_one() {
        let total: f64 = RiskDomain::ALL.iter().map(|d| d.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_feature_weights_sum_to_one_per_domain() {
        for domain in RiskDomain::ALL {
            let total: f64 = FeatureId::ALL
                .iter()
                .filter(|f| f.domain() == domain)
                .map(|f| f.weight())
                .sum();
            assert!(
                (total - 1.0).abs() < 1e-12,
                "weights for {} sum to {}",
                domain,
                total
            );
        }
    }

    #[test]
    fn test_five_features_per_domain() {
        for domain in RiskDomain::ALL {
            let count = FeatureId::ALL.iter().filter(|f| f.domain() == domain).count();
            assert_eq!(count, 5);
        }
    }

    #[test]
    fn test_feature_value_bounds_enforced() {
        assert!(FeatureValue::observed(FeatureId::DenialRate, 0.0, "24h", 10, None).is_ok());
        assert!(FeatureValue::observed(FeatureId::DenialRate, 1.0, "24h", 10, None).is_ok());
        assert!(FeatureValue::observed(FeatureId::DenialRate, -0.01, "24h", 10, None).is_err());
        assert!(FeatureValue::observed(FeatureId::DenialRate, 1.01, "24h", 10, None).is_err());
        assert!(FeatureValue::observed(FeatureId::DenialRate, f64::NAN, "24h", 10, None).is_err());
    }

    #[test]
    fn test_missing_value() {
        let fv = FeatureValue::missing(FeatureId::ToolDenials, "24h");
        assert!(fv.is_missing());
        assert_eq!(fv.value(), None);
        assert_eq!(fv.sample_count, 0);
    }

    #[test]
    fn test_deserialize_enforces_value_bounds() {
        let bad = r#"{"feature_id":"denial-rate","value":5.0,"window":"24h","sample_count":10}"#;
        assert!(serde_json::from_str::<FeatureValue>(bad).is_err());

        let ok = r#"{"feature_id":"denial-rate","value":0.5,"window":"24h","sample_count":10}"#;
        let fv: FeatureValue = serde_json::from_str(ok).unwrap();
        assert_eq!(fv.value(), Some(0.5));

        let missing = r#"{"feature_id":"tool-denials","value":null,"window":"24h","sample_count":0}"#;
        let fv: FeatureValue = serde_json::from_str(missing).unwrap();
        assert!(fv.is_missing());
    }

    #[test]
    fn test_feature_value_round_trips() {
        let fv = FeatureValue::observed(FeatureId::DenialRate, 0.25, "24h", 40, None).unwrap();
        let json = serde_json::to_string(&fv).unwrap();
        let parsed: FeatureValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fv);
    }

    #[test]
    fn test_feature_id_wire_names() {
        let json = serde_json::to_string(&FeatureId::EscalationRecoveryRate).unwrap();
        assert_eq!(json, "\"escalation-recovery-rate\"");
        assert_eq!(FeatureId::EscalationRecoveryRate.name(), "escalation-recovery-rate");
    }
}
