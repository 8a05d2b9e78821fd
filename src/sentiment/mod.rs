// Sentiment scoring: prompt rendering, the HTTP scorer, and sample
// aggregation.
//
// The SentimentScorer trait is the seam between the pipeline and the
// external service. LlmScoreClient is the production implementation.

pub mod aggregate;
pub mod client;
pub mod prompt;
pub mod traits;

/// Round to the nearest integer with halves going up (`floor(x + 0.5)`),
/// saturating into the `i32` range. NaN becomes 0.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::round_half_up;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(72.6), 73);
        assert_eq!(round_half_up(72.5), 73);
        assert_eq!(round_half_up(72.49), 72);
        assert_eq!(round_half_up(0.0), 0);
        // Negative halves go toward positive infinity, not away from zero
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
    }

    #[test]
    fn test_round_half_up_saturates() {
        assert_eq!(round_half_up(1e12), i32::MAX);
        assert_eq!(round_half_up(-1e12), i32::MIN);
        assert_eq!(round_half_up(f64::NAN), 0);
    }
}
