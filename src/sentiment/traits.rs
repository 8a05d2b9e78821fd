// Sentiment scorer trait: one external call, one sample.
//
// LlmScoreClient implements this against the HTTP scoring endpoint. The
// aggregator and the row processor only see the trait, so tests can swap in
// scripted scorers without a network.

use async_trait::async_trait;

use crate::error::Result;

/// Scores a single text's sentiment toward a keyword.
///
/// Returns one sample, normally 0 to 100. A negative value marks the sample as
/// invalid. Malformed responses must be reported as `Ok(0)`; only transport
/// failures are errors.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str, keyword: &str) -> Result<i32>;
}
