//! Bounded-value transforms shared by all feature extractors
//!
//! Every function here maps raw counts or elapsed time into [0.0, 1.0]
//! (or reports "no data"). No transform ever divides by zero or returns
//! a value outside its documented range.

use chrono::{DateTime, Utc};

/// Half-life decay: `0.5^(elapsed / half_life)`.
///
/// Returns 1.0 at `elapsed = 0`, 0.5 at `elapsed = half_life`, and is
/// strictly decreasing in `elapsed`. Non-positive half-life degenerates
/// to full decay for any positive elapsed time.
pub fn exponential_decay(elapsed_hours: f64, half_life_hours: f64) -> f64 {
    if elapsed_hours <= 0.0 {
        return 1.0;
    }
    if half_life_hours <= 0.0 {
        return 0.0;
    }
    0.5_f64.powf(elapsed_hours / half_life_hours)
}

/// Saturating growth: `1 - e^(-count / scale)`.
///
/// Zero count maps to 0.0; the score grows with `count` and stays
/// strictly below 1.0. Once the exponential underflows to zero the
/// curve plateaus at the largest f64 under 1.0 rather than reaching it.
pub fn saturating_score(count: u64, scale: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    if scale <= 0.0 {
        return 1.0 - f64::EPSILON;
    }
    (1.0 - (-(count as f64) / scale).exp()).min(1.0 - f64::EPSILON)
}

/// Saturating growth over a fractional magnitude, for summed decay
/// contributions that are not integer counts. Same bounds as
/// [`saturating_score`]: zero maps to 0.0, everything else stays
/// strictly below 1.0.
pub fn saturating_magnitude(magnitude: f64, scale: f64) -> f64 {
    if magnitude <= 0.0 {
        return 0.0;
    }
    if scale <= 0.0 {
        return 1.0 - f64::EPSILON;
    }
    (1.0 - (-magnitude / scale).exp()).min(1.0 - f64::EPSILON)
}

/// Capped rate: `min(numerator / denominator, 1.0)`.
///
/// Returns `None` when the denominator is zero. There is no default
/// rate; absence of a denominator is absence of data.
pub fn rate_to_score(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some((numerator as f64 / denominator as f64).min(1.0))
}

/// Elapsed hours between a timestamp and `now`.
///
/// An absent timestamp reads as infinitely stale. A timestamp in the
/// future reads as zero hours, not negative.
pub fn hours_since(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match timestamp {
        None => f64::INFINITY,
        Some(ts) => {
            let seconds = (now - ts).num_milliseconds() as f64 / 1000.0;
            (seconds / 3600.0).max(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_exponential_decay_anchors() {
        assert_eq!(exponential_decay(0.0, 12.0), 1.0);
        assert!((exponential_decay(12.0, 12.0) - 0.5).abs() < 1e-12);
        assert!((exponential_decay(24.0, 12.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_exponential_decay_strictly_decreasing() {
        let mut prev = exponential_decay(0.0, 12.0);
        for h in 1..100 {
            let cur = exponential_decay(h as f64, 12.0);
            assert!(cur < prev);
            prev = cur;
        }
    }

    #[test]
    fn test_saturating_score_bounds() {
        assert_eq!(saturating_score(0, 5.0), 0.0);
        let mut prev = 0.0;
        for count in 1..200 {
            let cur = saturating_score(count, 5.0);
            assert!(cur >= prev);
            assert!(cur < 1.0);
            prev = cur;
        }
        // Strictly increasing while the exponential still resolves
        assert!(saturating_score(2, 5.0) > saturating_score(1, 5.0));
        assert!(saturating_score(20, 5.0) > saturating_score(10, 5.0));
    }

    #[test]
    fn test_saturating_score_plateaus_below_one() {
        // Deep into saturation the raw formula would round to exactly
        // 1.0 in f64; the score must stay under it
        for count in [184, 200, 1_000, u64::MAX / 2] {
            assert!(saturating_score(count, 5.0) < 1.0, "count {count}");
        }
    }

    #[test]
    fn test_saturating_magnitude_bounds() {
        assert_eq!(saturating_magnitude(0.0, 3.0), 0.0);
        assert!(saturating_magnitude(0.5, 3.0) > 0.0);
        assert!(saturating_magnitude(500.0, 3.0) < 1.0);
    }

    #[test]
    fn test_rate_to_score_caps_at_one() {
        assert_eq!(rate_to_score(5, 100), Some(0.05));
        assert_eq!(rate_to_score(150, 100), Some(1.0));
    }

    #[test]
    fn test_rate_to_score_zero_denominator_is_no_data() {
        assert_eq!(rate_to_score(5, 0), None);
        assert_eq!(rate_to_score(0, 0), None);
    }

    #[test]
    fn test_hours_since() {
        let now = Utc::now();
        assert_eq!(hours_since(None, now), f64::INFINITY);

        let two_hours_ago = now - Duration::hours(2);
        assert!((hours_since(Some(two_hours_ago), now) - 2.0).abs() < 1e-6);

        // Future timestamps never go negative
        let future = now + Duration::hours(1);
        assert_eq!(hours_since(Some(future), now), 0.0);
    }
}
