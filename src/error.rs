// Error kinds for the scoring pipeline.
//
// Only Config and Connection are fatal. Transport failures are handled per
// row, Parse failures per scoring call (they become a zero sample).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Datastore error: {0}")]
    Connection(String),

    #[error("Scoring service transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed scoring response: {0}")]
    Parse(String),
}

impl ScoringError {
    /// Wrap a datastore failure, keeping the full context chain in the message.
    pub fn connection(err: anyhow::Error) -> Self {
        ScoringError::Connection(format!("{err:#}"))
    }

    /// Whether this error should terminate the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScoringError::Config(_) | ScoringError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_and_connection_are_fatal() {
        assert!(ScoringError::Config("missing".into()).is_fatal());
        assert!(ScoringError::Connection("down".into()).is_fatal());
        assert!(!ScoringError::Parse("bad json".into()).is_fatal());
    }

    #[test]
    fn test_connection_keeps_context_chain() {
        let err = anyhow::anyhow!("socket closed").context("Failed to select rows from x_posts");
        let wrapped = ScoringError::connection(err);
        let msg = wrapped.to_string();
        assert!(msg.contains("Failed to select rows from x_posts"));
        assert!(msg.contains("socket closed"));
    }
}
