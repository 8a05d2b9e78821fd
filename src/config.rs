use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::models::{TableKind, TableSpec};
use crate::error::{Result, ScoringError};
use crate::sentiment::aggregate::{AggregationPolicy, DEFAULT_SAMPLES};
use crate::sentiment::prompt::PromptTemplate;

/// Generic text tables scored by default, in scan order.
pub const DEFAULT_TEXT_TABLES: &[&str] = &["x_posts", "instagram_posts", "youtube_comments"];

/// Title+body table scored after the generic tables.
pub const DEFAULT_TITLE_BODY_TABLE: &str = "reddit_posts";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Central configuration, built once at startup and passed by reference.
///
/// Values come from environment variables. `main` loads a .env file first
/// via dotenvy (or an explicit `--env-file`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Scoring endpoint (SENTIMENT_LLM_URL).
    pub llm_url: String,
    /// Prompt template from SENTIMENT_PROMPT or SENTIMENT_PROMPT_FILE.
    pub prompt: Option<PromptTemplate>,
    /// SQLite database path (SENTIMENT_DB_PATH).
    pub db_path: String,
    /// PostgreSQL connection URL (when set and starts with postgres://, uses Postgres backend)
    pub database_url: Option<String>,
    /// Overrides the user in `database_url` (DATABASE_USER).
    pub database_user: Option<String>,
    /// Overrides the password in `database_url` (DATABASE_PASSWORD).
    pub database_password: Option<String>,
    /// Per-call HTTP timeout (SENTIMENT_TIMEOUT_SECS).
    pub request_timeout: Duration,
    /// Sample count and invalid-sample policy.
    pub aggregation: AggregationPolicy,
    /// Generic tables in scan order (SENTIMENT_TABLES, comma-separated).
    pub text_tables: Vec<String>,
    /// Title+body table (SENTIMENT_TITLE_BODY_TABLE); empty disables it.
    pub title_body_table: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the scoring endpoint and prompt have no defaults, and they are
    /// checked by `require_scoring` so `init` and `status` work without them.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let prompt = match (get("SENTIMENT_PROMPT"), get("SENTIMENT_PROMPT_FILE")) {
            (Some(text), _) => Some(PromptTemplate::new(text)?),
            (None, Some(path)) => Some(read_prompt_file(Path::new(&path))?),
            (None, None) => None,
        };

        let samples = match get("SENTIMENT_SAMPLES") {
            Some(raw) => parse_samples(&raw)?,
            None => DEFAULT_SAMPLES,
        };

        let abort_on_invalid_sample = match get("SENTIMENT_ABORT_ON_INVALID") {
            Some(raw) => parse_bool("SENTIMENT_ABORT_ON_INVALID", &raw)?,
            None => true,
        };

        let timeout_secs = match get("SENTIMENT_TIMEOUT_SECS") {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let text_tables = match get("SENTIMENT_TABLES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_TEXT_TABLES.iter().map(|t| t.to_string()).collect(),
        };

        // Explicitly set but blank disables the title+body table
        let title_body_table = match lookup("SENTIMENT_TITLE_BODY_TABLE") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(raw.trim().to_string()),
            None => Some(DEFAULT_TITLE_BODY_TABLE.to_string()),
        };

        let config = Self {
            llm_url: get("SENTIMENT_LLM_URL").unwrap_or_default(),
            prompt,
            db_path: get("SENTIMENT_DB_PATH").unwrap_or_else(|| "./sentiment.db".to_string()),
            database_url: get("DATABASE_URL"),
            database_user: get("DATABASE_USER"),
            database_password: get("DATABASE_PASSWORD"),
            request_timeout: Duration::from_secs(timeout_secs),
            aggregation: AggregationPolicy {
                samples,
                abort_on_invalid_sample,
            },
            text_tables,
            title_body_table,
        };

        // Surface bad table names at startup, not halfway through a run
        config.tables()?;
        Ok(config)
    }

    /// All configured tables in processing order: generic tables first, then
    /// the title+body table.
    pub fn tables(&self) -> Result<Vec<TableSpec>> {
        let mut tables = self
            .text_tables
            .iter()
            .map(|name| TableSpec::new(name, TableKind::Text))
            .collect::<Result<Vec<_>>>()?;
        if let Some(ref name) = self.title_body_table {
            tables.push(TableSpec::new(name, TableKind::TitleBody)?);
        }
        Ok(tables)
    }

    /// Whether DATABASE_URL selects the PostgreSQL backend.
    pub fn uses_postgres(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|u| u.starts_with("postgres://") || u.starts_with("postgresql://"))
    }

    /// Check that the scoring endpoint and prompt are configured.
    /// Call this before any operation that talks to the scoring service.
    pub fn require_scoring(&self) -> Result<()> {
        if self.llm_url.is_empty() {
            return Err(ScoringError::Config(
                "SENTIMENT_LLM_URL not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
                    .to_string(),
            ));
        }
        if self.prompt.is_none() {
            return Err(ScoringError::Config(
                "No prompt template configured. Set SENTIMENT_PROMPT or \
                 SENTIMENT_PROMPT_FILE (the template needs {keyword} and {text})."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Load an env file explicitly. A missing file is a configuration error,
/// unlike the implicit `.env` which is optional.
pub fn load_env_file(path: &Path) -> Result<PathBuf> {
    dotenvy::from_path(path).map_err(|e| {
        ScoringError::Config(format!("failed to load env file {}: {e}", path.display()))
    })?;
    Ok(path.to_path_buf())
}

/// Load `./.env` if present. A missing file is fine; a file that exists but
/// can't be parsed is a configuration error.
pub fn load_default_env_file() -> Result<Option<PathBuf>> {
    optional_env_file(dotenvy::dotenv())
}

fn optional_env_file(
    loaded: std::result::Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>> {
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ScoringError::Config(format!("failed to load .env: {e}"))),
    }
}

fn read_prompt_file(path: &Path) -> Result<PromptTemplate> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ScoringError::Config(format!("failed to read prompt file {}: {e}", path.display()))
    })?;
    PromptTemplate::new(text)
}

fn parse_samples(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ScoringError::Config(format!(
            "SENTIMENT_SAMPLES must be a positive integer, got {raw:?}"
        ))),
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ScoringError::Config(format!(
            "SENTIMENT_TIMEOUT_SECS must be a positive number of seconds, got {raw:?}"
        ))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ScoringError::Config(format!(
            "{key} must be true or false, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, "./sentiment.db");
        assert_eq!(config.aggregation, AggregationPolicy::default());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        let names: Vec<String> = config.tables().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["x_posts", "instagram_posts", "youtube_comments", "reddit_posts"]
        );
        assert!(!config.uses_postgres());
    }

    #[test]
    fn test_title_body_table_is_last() {
        let config = config_from(&[]).unwrap();
        let tables = config.tables().unwrap();
        assert_eq!(tables.last().unwrap().kind, TableKind::TitleBody);
        assert!(tables[..3].iter().all(|t| t.kind == TableKind::Text));
    }

    #[test]
    fn test_require_scoring_needs_url_and_prompt() {
        let config = config_from(&[]).unwrap();
        assert!(matches!(config.require_scoring(), Err(ScoringError::Config(_))));

        let config = config_from(&[("SENTIMENT_LLM_URL", "http://localhost:8080/generate")]).unwrap();
        assert!(config.require_scoring().is_err());

        let config = config_from(&[
            ("SENTIMENT_LLM_URL", "http://localhost:8080/generate"),
            ("SENTIMENT_PROMPT", "About {keyword}: {text}"),
        ])
        .unwrap();
        assert!(config.require_scoring().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SENTIMENT_SAMPLES", "5"),
            ("SENTIMENT_ABORT_ON_INVALID", "false"),
            ("SENTIMENT_TIMEOUT_SECS", "15"),
            ("SENTIMENT_TABLES", "posts, comments ,"),
            ("SENTIMENT_TITLE_BODY_TABLE", ""),
            ("DATABASE_URL", "postgres://localhost/social"),
        ])
        .unwrap();
        assert_eq!(config.aggregation.samples, 5);
        assert!(!config.aggregation.abort_on_invalid_sample);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.text_tables, vec!["posts", "comments"]);
        assert!(config.title_body_table.is_none());
        assert!(config.uses_postgres());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(config_from(&[("SENTIMENT_SAMPLES", "0")]).is_err());
        assert!(config_from(&[("SENTIMENT_SAMPLES", "three")]).is_err());
        assert!(config_from(&[("SENTIMENT_ABORT_ON_INVALID", "maybe")]).is_err());
        assert!(config_from(&[("SENTIMENT_TIMEOUT_SECS", "-1")]).is_err());
        assert!(config_from(&[("SENTIMENT_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("SENTIMENT_TABLES", "posts;drop")]).is_err());
    }

    #[test]
    fn test_prompt_file_missing_is_config_error() {
        let err = config_from(&[("SENTIMENT_PROMPT_FILE", "/nonexistent/prompt.txt")]).unwrap_err();
        assert!(matches!(err, ScoringError::Config(_)));
    }

    #[test]
    fn test_load_env_file_missing_is_config_error() {
        let err = load_env_file(Path::new("/nonexistent/.env")).unwrap_err();
        assert!(err.is_fatal());
    }

    fn example_env_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(".env.example")
    }

    #[test]
    fn test_example_env_file_parses_into_config() {
        let vars: HashMap<String, String> = dotenvy::from_path_iter(example_env_path())
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
        assert!(config.require_scoring().is_ok());

        let prompt = config.prompt.unwrap().render("rust", "I love it");
        assert!(prompt.contains("about rust"));
        assert!(prompt.contains(r#"{"positivity_score": 50}"#));
        assert!(prompt.ends_with("Text: I love it"));
    }

    #[test]
    fn test_load_example_env_file() {
        let path = load_env_file(&example_env_path()).unwrap();
        assert!(path.ends_with(".env.example"));
    }

    #[test]
    fn test_missing_default_env_file_is_ignored() {
        let loaded = dotenvy::from_path("/nonexistent/.env").map(|_| PathBuf::from("/nonexistent/.env"));
        assert!(optional_env_file(loaded).unwrap().is_none());
    }

    #[test]
    fn test_unparseable_env_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "SENTIMENT_PROMPT=Rate {text} like {\"a\": 1} now\n").unwrap();

        let loaded = dotenvy::from_path(&path).map(|_| path.clone());
        let err = optional_env_file(loaded).unwrap_err();
        assert!(matches!(err, ScoringError::Config(_)));
        assert!(load_env_file(&path).is_err());
    }
}
