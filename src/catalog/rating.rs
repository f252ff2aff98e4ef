//! Average rating derivation.
//!
//! Ratings are aggregated as `(count, sum)` and the mean is rounded to one
//! decimal in integer tenths, so `[5, 5, 4]` is exactly `4.7` and equal
//! averages always compare equal.

use serde::Serialize;

/// Aggregate of a book's review ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingSummary {
    /// Number of reviews.
    pub count: i64,
    /// Sum of ratings.
    pub sum: i64,
}

impl RatingSummary {
    /// Build from an already aggregated count and sum.
    pub fn new(count: i64, sum: i64) -> Self {
        Self { count, sum }
    }

    /// Mean in tenths, rounded half up. `None` without reviews.
    pub fn tenths(&self) -> Option<i64> {
        if self.count <= 0 {
            return None;
        }
        // round(10 * sum / count) == floor((20 * sum + count) / (2 * count))
        Some((20 * self.sum + self.count).div_euclid(2 * self.count))
    }

    /// Mean rounded to one decimal place. `None` without reviews.
    pub fn average(&self) -> Option<f64> {
        self.tenths().map(|t| t as f64 / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_ratings(ratings: &[i64]) -> RatingSummary {
        RatingSummary::new(ratings.len() as i64, ratings.iter().sum())
    }

    #[test]
    fn test_average_of_whole_numbers() {
        let summary = from_ratings(&[5, 4, 3]);
        assert_eq!(summary, RatingSummary::new(3, 12));
        assert_eq!(summary.average(), Some(4.0));
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        assert_eq!(from_ratings(&[5, 5, 4]).average(), Some(4.7));
        assert_eq!(from_ratings(&[1, 2]).average(), Some(1.5));
        assert_eq!(from_ratings(&[1, 1, 2]).average(), Some(1.3));
    }

    #[test]
    fn test_half_tenth_rounds_up() {
        // 17 / 4 = 4.25
        assert_eq!(from_ratings(&[5, 4, 4, 4]).tenths(), Some(43));
        // 33 / 8 = 4.125 -> 4.1
        assert_eq!(RatingSummary::new(8, 33).tenths(), Some(41));
    }

    #[test]
    fn test_no_reviews_has_no_average() {
        let summary = from_ratings(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.tenths(), None);
        assert_eq!(summary.average(), None);
    }

    #[test]
    fn test_single_review() {
        assert_eq!(from_ratings(&[1]).average(), Some(1.0));
        assert_eq!(from_ratings(&[5]).average(), Some(5.0));
    }
}
