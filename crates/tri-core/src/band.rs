//! Confidence band for risk scores
//!
//! A band is a `lower`/`upper` pair inside [0.0, 1.0]. Construction with
//! inverted or out-of-range bounds fails; bounds are never clamped after
//! the fact.

use serde::{Deserialize, Serialize};

use crate::error::TriError;

/// Uncertainty interval around a point-estimate risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBand {
    lower: f64,
    upper: f64,
}

impl ConfidenceBand {
    /// Create a band, enforcing `0 <= lower <= upper <= 1`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, TriError> {
        let in_range = (0.0..=1.0).contains(&lower) && (0.0..=1.0).contains(&upper);
        if !in_range || lower > upper {
            return Err(TriError::InvalidBand { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Degenerate band with zero width at a single point.
    pub fn point(value: f64) -> Result<Self, TriError> {
        Self::new(value, value)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Check that a point estimate falls inside the band.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl<'de> Deserialize<'de> for ConfidenceBand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            lower: f64,
            upper: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        ConfidenceBand::new(raw.lower, raw.upper).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_band() {
        let band = ConfidenceBand::new(0.2, 0.6).unwrap();
        assert_eq!(band.lower(), 0.2);
        assert_eq!(band.upper(), 0.6);
        assert!((band.width() - 0.4).abs() < 1e-12);
        assert!(band.contains(0.4));
        assert!(!band.contains(0.7));
    }

    #[test]
    fn test_inverted_band_rejected() {
        assert!(ConfidenceBand::new(0.6, 0.2).is_err());
    }

    #[test]
    fn test_out_of_range_band_rejected() {
        assert!(ConfidenceBand::new(-0.1, 0.5).is_err());
        assert!(ConfidenceBand::new(0.5, 1.1).is_err());
    }

    #[test]
    fn test_point_band() {
        let band = ConfidenceBand::point(0.3).unwrap();
        assert_eq!(band.width(), 0.0);
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        let ok: Result<ConfidenceBand, _> =
            serde_json::from_str(r#"{"lower": 0.1, "upper": 0.4}"#);
        assert!(ok.is_ok());

        let bad: Result<ConfidenceBand, _> =
            serde_json::from_str(r#"{"lower": 0.9, "upper": 0.4}"#);
        assert!(bad.is_err());
    }
}
