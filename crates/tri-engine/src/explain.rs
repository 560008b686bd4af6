//! Per-feature contribution breakdown
//!
//! A `ContributionRow` is a lazily derived, human-readable explanation
//! line for one feature. Rows are a view over a `TriResult`, never
//! persisted separately.

use serde::{Deserialize, Serialize};

use crate::engine::TriResult;
use crate::features::RiskDomain;

/// One explanation line: how much a single feature moved the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRow {
    /// Feature wire name, e.g. "denial-rate".
    pub feature: String,
    pub domain: RiskDomain,
    /// Raw feature value, absent for "no data".
    pub value: Option<f64>,
    /// Effective weight in the final index (feature weight × domain weight).
    pub weight: f64,
    /// Numeric contribution to the TRI point estimate.
    pub contribution: f64,
    /// Evidence text describing what backs the value.
    pub evidence: String,
}

impl ContributionRow {
    /// Human-readable one-liner in the shape downstream review tools show.
    pub fn describe(&self) -> String {
        match self.value {
            Some(value) => format!(
                "{} = {:.4} contributes {:.4} to the index ({})",
                self.feature, value, self.contribution, self.evidence
            ),
            None => format!("{}: no data ({})", self.feature, self.evidence),
        }
    }
}

/// Derive the full contribution breakdown from a result, one row per
/// feature, ordered by descending contribution.
pub fn contribution_rows(result: &TriResult) -> Vec<ContributionRow> {
    let mut rows: Vec<ContributionRow> = result
        .domains
        .iter()
        .flat_map(|ds| {
            ds.features.iter().map(move |fv| {
                let weight = fv.feature_id.weight() * ds.weight;
                let contribution = fv.value().unwrap_or(0.0) * weight;
                let evidence = match fv.value() {
                    Some(_) => match fv.last_seen {
                        Some(ts) => format!(
                            "{} samples in {}, last seen {}",
                            fv.sample_count,
                            fv.window,
                            ts.to_rfc3339()
                        ),
                        None => format!("{} samples in {}", fv.sample_count, fv.window),
                    },
                    None => format!("no observations in {}", fv.window),
                };
                ContributionRow {
                    feature: fv.feature_id.name().to_string(),
                    domain: ds.domain,
                    value: fv.value(),
                    weight,
                    contribution,
                    evidence,
                }
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}
