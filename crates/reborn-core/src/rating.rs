//! Store rating aggregation math.
//!
//! A store's displayed score is the arithmetic mean of every review score
//! across all of its listings, rounded half-up to one decimal place. The
//! rounding here must match what the storage layer persists so that a
//! recomputation is idempotent.

/// Round a raw mean to one decimal place, half-up.
///
/// Scores are always non-negative, so `f64::round` (half away from zero)
/// gives half-up behavior.
#[must_use]
pub fn round_score(mean: f64) -> f64 {
    (mean * 10.0).round() / 10.0
}

/// Compute the rounded store score from a set of review scores.
///
/// Returns `None` for an empty set; the caller decides the zero-review
/// policy (the storage layer leaves the previous score unchanged).
#[must_use]
pub fn aggregate_score(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = f64::from(scores.iter().sum::<i32>()) / scores.len() as f64;
    Some(round_score(mean))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mean() {
        assert_eq!(aggregate_score(&[4, 5, 3]), Some(4.0));
        assert_eq!(aggregate_score(&[5, 5]), Some(5.0));
    }

    #[test]
    fn rounds_half_up() {
        // 13 / 3 = 4.333... -> 4.3
        assert_eq!(aggregate_score(&[4, 4, 5]), Some(4.3));
        // 7 / 2 = 3.5 stays 3.5
        assert_eq!(aggregate_score(&[3, 4]), Some(3.5));
        // 14 / 3 = 4.666... -> 4.7
        assert_eq!(aggregate_score(&[4, 5, 5]), Some(4.7));
    }

    #[test]
    fn midpoint_rounds_up() {
        // 0.25 at one decimal: 4.25 -> 4.3 (half-up, not banker's)
        assert_eq!(round_score(4.25), 4.3);
        assert_eq!(round_score(0.05), 0.1);
    }

    #[test]
    fn empty_set_has_no_score() {
        assert_eq!(aggregate_score(&[]), None);
    }

    #[test]
    fn single_review() {
        assert_eq!(aggregate_score(&[1]), Some(1.0));
        assert_eq!(aggregate_score(&[5]), Some(5.0));
    }
}
