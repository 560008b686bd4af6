//! Glass-box integration contract: input, output, and embedding schemas
//!
//! The contract binds every risk evaluation to an activation context,
//! requires a non-empty explanation, and defines the closed field set a
//! persisted-record embedding must carry. Violations are hard failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tri_core::{ConfidenceBand, RiskTier, TierAction};

use crate::error::GlassBoxError;

/// Opaque token binding one risk evaluation to a specific governance
/// activation. Mandatory on every glass-box call; never defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReference {
    /// Identity of the agent the activation belongs to.
    pub agent_id: String,
    /// Hash of the activation block; keys the monotonicity ledger.
    pub activation_hash: String,
    pub activated_at: DateTime<Utc>,
    /// Permitted operation scopes.
    pub scopes: Vec<String>,
}

impl ActivationReference {
    /// Create a reference, rejecting empty agent id or hash.
    pub fn new(
        agent_id: impl Into<String>,
        activation_hash: impl Into<String>,
        activated_at: DateTime<Utc>,
        scopes: Vec<String>,
    ) -> Result<Self, GlassBoxError> {
        let agent_id = agent_id.into();
        let activation_hash = activation_hash.into();
        if agent_id.is_empty() {
            return Err(GlassBoxError::InvalidActivation(
                "agent_id must not be empty".to_string(),
            ));
        }
        if activation_hash.is_empty() {
            return Err(GlassBoxError::InvalidActivation(
                "activation_hash must not be empty".to_string(),
            ));
        }
        Ok(Self {
            agent_id,
            activation_hash,
            activated_at,
            scopes,
        })
    }

    /// Structural validity only; cryptographic validation belongs to the
    /// governance layer.
    pub fn is_structurally_valid(&self) -> bool {
        !self.agent_id.is_empty() && !self.activation_hash.is_empty()
    }
}

/// Input to a glass-box risk evaluation.
///
/// The activation slot is optional at the type level because inputs
/// arrive from external callers over the wire; a missing reference is
/// detected by `validate` and hard-fails. It is never filled in with a
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInput {
    pub activation: Option<ActivationReference>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Entity being scored.
    pub entity_id: String,
    /// Unique request identifier, for provenance and failure context.
    pub request_id: String,
}

impl RiskInput {
    /// Create a validated input. The activation reference is required
    /// here; only deserialized inputs can carry an empty slot.
    pub fn new(
        activation: ActivationReference,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        entity_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Result<Self, GlassBoxError> {
        let input = Self {
            activation: Some(activation),
            window_start,
            window_end,
            entity_id: entity_id.into(),
            request_id: request_id.into(),
        };
        input.validate()?;
        Ok(input)
    }

    /// Validate the input and return its activation reference.
    pub fn validate(&self) -> Result<&ActivationReference, GlassBoxError> {
        let activation = self.activation.as_ref().ok_or_else(|| {
            GlassBoxError::MissingActivation(format!(
                "request {} has no activation reference",
                self.request_id
            ))
        })?;
        if !activation.is_structurally_valid() {
            return Err(GlassBoxError::InvalidActivation(format!(
                "request {}: empty agent_id or activation_hash",
                self.request_id
            )));
        }
        if self.window_end < self.window_start {
            return Err(GlassBoxError::ContractViolation(format!(
                "request {}: window_end precedes window_start",
                self.request_id
            )));
        }
        if self.entity_id.is_empty() {
            return Err(GlassBoxError::MissingRequiredField(format!(
                "entity_id (request {})",
                self.request_id
            )));
        }
        Ok(activation)
    }
}

/// Whether a contribution pushed the score up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionDirection {
    Increasing,
    Decreasing,
}

/// Single feature's contribution to an externally produced risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature_id: String,
    pub feature_value: f64,
    pub contribution: f64,
    pub direction: ContributionDirection,
    pub explanation: String,
}

/// Identity of the model that produced a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub model_id: String,
    pub model_version: String,
    pub calibrated_at: DateTime<Utc>,
    pub feature_count: u32,
}

impl ModelIdentity {
    pub fn validate(&self) -> Result<(), GlassBoxError> {
        if self.model_id.is_empty() || self.model_version.is_empty() {
            return Err(GlassBoxError::InvalidModelIdentity(
                "model_id and model_version are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a pluggable scoring function returns: the raw score, its
/// explanation, and its uncertainty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRisk {
    pub risk_score: f64,
    pub top_contributors: Vec<FeatureContribution>,
    pub confidence_band: ConfidenceBand,
    pub summary: String,
}

/// Validated glass-box evaluation output. All fields required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlassBoxOutput {
    pub risk_score: f64,
    pub tier: RiskTier,
    pub action: TierAction,
    pub confidence_band: ConfidenceBand,
    pub top_contributors: Vec<FeatureContribution>,
    pub explanation_summary: String,
    pub model_identity: ModelIdentity,

    // Provenance
    pub request_id: String,
    pub computed_at: DateTime<Utc>,
    pub activation_hash: String,
}

impl GlassBoxOutput {
    /// Enforce every output invariant: score bounds, tier and action
    /// consistency with the fixed tables, band validity, non-empty
    /// explanation, and model identity.
    pub fn validate(&self) -> Result<(), GlassBoxError> {
        if !(0.0..=1.0).contains(&self.risk_score) || self.risk_score.is_nan() {
            return Err(GlassBoxError::InvalidRiskScore {
                context: format!("output for request {}", self.request_id),
                value: self.risk_score,
            });
        }
        let expected_tier = RiskTier::from_score(self.risk_score);
        if self.tier != expected_tier {
            return Err(GlassBoxError::ContractViolation(format!(
                "tier {} inconsistent with score {} (expected {})",
                self.tier, self.risk_score, expected_tier
            )));
        }
        let expected_action = self.tier.action();
        if self.action != expected_action {
            return Err(GlassBoxError::ContractViolation(format!(
                "action {} inconsistent with tier {} (expected {})",
                self.action, self.tier, expected_action
            )));
        }
        if !self.confidence_band.contains(self.risk_score) {
            return Err(GlassBoxError::InvalidConfidenceBand(format!(
                "band [{}, {}] excludes point estimate {}",
                self.confidence_band.lower(),
                self.confidence_band.upper(),
                self.risk_score
            )));
        }
        if self.top_contributors.is_empty() {
            return Err(GlassBoxError::MissingContributors(format!(
                "request {}",
                self.request_id
            )));
        }
        self.model_identity.validate()?;
        if self.activation_hash.is_empty() {
            return Err(GlassBoxError::MissingRequiredField(format!(
                "activation_hash (request {})",
                self.request_id
            )));
        }
        Ok(())
    }
}

/// Every field the downstream record format requires of a risk
/// embedding. A record missing any of these is invalid.
pub const REQUIRED_EMBEDDING_FIELDS: [&str; 10] = [
    "risk_score",
    "risk_tier",
    "confidence_lower",
    "confidence_upper",
    "top_contributor_1_id",
    "top_contributor_1_value",
    "model_id",
    "model_version",
    "computed_at",
    "activation_hash",
];

/// Risk data embedded into every persisted decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdoEmbedding {
    pub risk_score: f64,
    pub risk_tier: String,
    pub confidence_lower: f64,
    pub confidence_upper: f64,

    pub top_contributor_1_id: String,
    pub top_contributor_1_value: f64,
    pub top_contributor_2_id: Option<String>,
    pub top_contributor_2_value: Option<f64>,

    pub model_id: String,
    pub model_version: String,

    pub computed_at: String,
    pub activation_hash: String,
}

impl PdoEmbedding {
    /// Canonical extraction from a validated output. Requires at least
    /// one contributor, which `GlassBoxOutput::validate` guarantees.
    pub fn from_output(output: &GlassBoxOutput) -> Result<Self, GlassBoxError> {
        let top_1 = output.top_contributors.first().ok_or_else(|| {
            GlassBoxError::MissingContributors(format!("request {}", output.request_id))
        })?;
        let top_2 = output.top_contributors.get(1);

        Ok(Self {
            risk_score: output.risk_score,
            risk_tier: output.tier.to_string(),
            confidence_lower: output.confidence_band.lower(),
            confidence_upper: output.confidence_band.upper(),
            top_contributor_1_id: top_1.feature_id.clone(),
            top_contributor_1_value: top_1.contribution,
            top_contributor_2_id: top_2.map(|c| c.feature_id.clone()),
            top_contributor_2_value: top_2.map(|c| c.contribution),
            model_id: output.model_identity.model_id.clone(),
            model_version: output.model_identity.model_version.clone(),
            computed_at: output.computed_at.to_rfc3339(),
            activation_hash: output.activation_hash.clone(),
        })
    }

    /// Check the embedding's own required fields.
    pub fn validate(&self) -> Result<(), GlassBoxError> {
        if !(0.0..=1.0).contains(&self.risk_score) {
            return Err(GlassBoxError::InvalidRiskScore {
                context: "embedding".to_string(),
                value: self.risk_score,
            });
        }
        for (name, value) in [
            ("risk_tier", &self.risk_tier),
            ("top_contributor_1_id", &self.top_contributor_1_id),
            ("model_id", &self.model_id),
            ("model_version", &self.model_version),
            ("computed_at", &self.computed_at),
            ("activation_hash", &self.activation_hash),
        ] {
            if value.is_empty() {
                return Err(GlassBoxError::MissingRequiredField(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Validate an externally supplied embedding record against the closed
/// required-field set. Used when the record arrives as raw JSON from the
/// storage layer rather than as a typed value.
pub fn validate_embedding_value(value: &serde_json::Value) -> Result<(), GlassBoxError> {
    let object = value.as_object().ok_or_else(|| {
        GlassBoxError::ContractViolation("embedding must be a JSON object".to_string())
    })?;
    for field in REQUIRED_EMBEDDING_FIELDS {
        if !object.contains_key(field) {
            return Err(GlassBoxError::MissingRequiredField(field.to_string()));
        }
    }
    if let Some(score) = object.get("risk_score").and_then(|v| v.as_f64()) {
        if !(0.0..=1.0).contains(&score) {
            return Err(GlassBoxError::InvalidRiskScore {
                context: "embedding".to_string(),
                value: score,
            });
        }
    }
    Ok(())
}
