// Sample aggregation: several independent calls reduced to one score.
//
// Single LLM ratings are noisy, so each text is scored `samples` times and
// the valid samples are averaged. A negative sample aborts the whole
// aggregate by default (see AggregationPolicy).

use tracing::debug;

use super::round_half_up;
use super::traits::SentimentScorer;
use crate::db::models::ScorableItem;
use crate::error::Result;

/// Number of scoring calls per text.
pub const DEFAULT_SAMPLES: usize = 3;

/// How samples are collected and reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationPolicy {
    /// Scoring calls per text (at least 1).
    pub samples: usize,
    /// When true, any negative sample makes the aggregate 0 and discards
    /// samples already collected. When false, negative samples are skipped.
    pub abort_on_invalid_sample: bool,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            abort_on_invalid_sample: true,
        }
    }
}

/// Reduces repeated scorer calls into one aggregate score.
pub struct ScoreAggregator<'a> {
    scorer: &'a dyn SentimentScorer,
    policy: AggregationPolicy,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(scorer: &'a dyn SentimentScorer, policy: AggregationPolicy) -> Self {
        Self { scorer, policy }
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Average of `samples` sequential calls for one text.
    ///
    /// Transport errors propagate. No valid samples gives 0.
    pub async fn average_score(&self, text: &str, keyword: &str) -> Result<i32> {
        let mut total: i64 = 0;
        let mut valid_count: i64 = 0;

        for _ in 0..self.policy.samples {
            let sample = self.scorer.score(text, keyword).await?;
            if sample >= 0 {
                total += i64::from(sample);
                valid_count += 1;
            } else if self.policy.abort_on_invalid_sample {
                debug!(sample, keyword, "Invalid sample, discarding aggregate");
                return Ok(0);
            }
        }

        if valid_count == 0 {
            return Ok(0);
        }

        Ok(round_half_up(total as f64 / valid_count as f64))
    }

    /// Score an item: its text alone, or the integer mean of text and
    /// secondary text when both are present.
    pub async fn score_item(&self, item: &ScorableItem) -> Result<i32> {
        match item.secondary_text.as_deref() {
            Some(secondary) => {
                let primary_score = self.average_score(&item.text, &item.keyword).await?;
                let secondary_score = self.average_score(secondary, &item.keyword).await?;
                Ok(two_field_mean(primary_score, secondary_score))
            }
            None => self.average_score(&item.text, &item.keyword).await,
        }
    }
}

/// `(a + b) / 2` with the remainder discarded.
pub fn two_field_mean(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}
