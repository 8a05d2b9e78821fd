// Composition tests: a full run against a real SQLite file and a mocked
// scoring endpoint.
//
// These exercise the data flow Config -> Database -> ScoreAggregator ->
// LlmScoreClient -> Database, checking what actually lands in the rows.

#![cfg(feature = "sqlite")]

use rusqlite::Connection;
use sentiment_sweep::config::Config;
use sentiment_sweep::error::ScoringError;
use sentiment_sweep::pipeline::run::run;
use sentiment_sweep::sentiment::client::LlmScoreClient;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    _dir: TempDir,
    db_path: String,
    config: Config,
}

/// Create a SQLite file with the default tables and build a config pointing
/// at it and at `server`.
fn fixture(server: &MockServer, extra: &[(&str, &str)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sentiment.db").to_string_lossy().into_owned();
    let llm_url = format!("{}/generate", server.uri());

    let mut vars: Vec<(String, String)> = vec![
        ("SENTIMENT_LLM_URL".to_string(), llm_url),
        (
            "SENTIMENT_PROMPT".to_string(),
            "Rate {text} for {keyword}".to_string(),
        ),
        ("SENTIMENT_DB_PATH".to_string(), db_path.clone()),
    ];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let config = Config::from_lookup(|key| {
        // Later entries override the defaults
        vars.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap();

    sentiment_sweep::db::initialize_sqlite(&db_path, &config.tables().unwrap()).unwrap();

    Fixture {
        _dir: dir,
        db_path,
        config,
    }
}

fn seed(db_path: &str, sql: &str) {
    Connection::open(db_path).unwrap().execute_batch(sql).unwrap();
}

fn score_of(db_path: &str, table: &str, id: &str) -> Option<i32> {
    Connection::open(db_path)
        .unwrap()
        .query_row(
            &format!("SELECT sentiment_score FROM {table} WHERE id = ?1"),
            [id],
            |row| row.get(0),
        )
        .unwrap()
}

async fn run_fixture(f: &Fixture) -> Result<sentiment_sweep::pipeline::run::RunSummary, ScoringError> {
    let db = sentiment_sweep::db::open_sqlite(&f.db_path).unwrap();
    let scorer = LlmScoreClient::from_config(&f.config).unwrap();
    run(db.as_ref(), &scorer, &f.config).await
}

// ============================================================
// End-to-end persistence
// ============================================================

#[tokio::test]
async fn zero_scored_row_gets_persisted_score() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"positivity_score": 80}"#))
        .expect(3)
        .mount(&server)
        .await;

    let f = fixture(&server, &[]);
    seed(
        &f.db_path,
        "INSERT INTO x_posts (id, text, keyword, sentiment_score) VALUES ('p1', 'what a launch', 'rocket', 0);",
    );

    let summary = run_fixture(&f).await.unwrap();
    assert_eq!(summary.total_updated(), 1);
    assert_eq!(score_of(&f.db_path, "x_posts", "p1"), Some(80));
}

#[tokio::test]
async fn already_scored_generic_rows_are_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"positivity_score": 10}"#))
        .expect(0)
        .mount(&server)
        .await;

    let f = fixture(&server, &[]);
    seed(
        &f.db_path,
        "INSERT INTO instagram_posts (id, text, keyword, sentiment_score) VALUES ('i1', 'cute', 'cat', 95);",
    );

    run_fixture(&f).await.unwrap();
    assert_eq!(score_of(&f.db_path, "instagram_posts", "i1"), Some(95));
}

#[tokio::test]
async fn title_body_table_rescores_positive_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("headline words"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"positivity_score": 60}"#))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("body words"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"positivity_score": 71}"#))
        .expect(3)
        .mount(&server)
        .await;

    let f = fixture(&server, &[]);
    seed(
        &f.db_path,
        "INSERT INTO reddit_posts (id, title, text, keyword, sentiment_score) VALUES
            ('r1', 'headline words', 'body words', 'topic', 42),
            ('r2', 'headline words', 'body words', 'topic', -1);",
    );

    run_fixture(&f).await.unwrap();
    // (60 + 71) / 2 = 65, remainder dropped
    assert_eq!(score_of(&f.db_path, "reddit_posts", "r1"), Some(65));
    // -1 marks a finalized row and is never selected
    assert_eq!(score_of(&f.db_path, "reddit_posts", "r2"), Some(-1));
}

#[tokio::test]
async fn wrapped_responses_and_blank_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Here you go:\n```json\n{\"positivity_score\": 33.5}\n```"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let f = fixture(&server, &[]);
    seed(
        &f.db_path,
        "INSERT INTO youtube_comments (id, text, keyword) VALUES
            ('y1', 'nice video', 'music'),
            ('y2', '', 'music');",
    );

    let summary = run_fixture(&f).await.unwrap();
    let youtube = summary
        .tables
        .iter()
        .find(|t| t.table == "youtube_comments")
        .unwrap();
    assert_eq!(youtube.skipped, 1);
    assert_eq!(score_of(&f.db_path, "youtube_comments", "y1"), Some(34));
    assert_eq!(score_of(&f.db_path, "youtube_comments", "y2"), None);
}

#[tokio::test]
async fn negative_sample_persists_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"positivity_score": -3}"#))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server, &[]);
    seed(
        &f.db_path,
        "INSERT INTO x_posts (id, text, keyword) VALUES ('p1', 'hmm', 'k');",
    );

    run_fixture(&f).await.unwrap();
    assert_eq!(score_of(&f.db_path, "x_posts", "p1"), Some(0));
}

// ============================================================
// Failure handling
// ============================================================

#[tokio::test]
async fn unreachable_service_skips_rows_without_failing_run() {
    let server = MockServer::start().await;
    let f = fixture(&server, &[("SENTIMENT_LLM_URL", "http://127.0.0.1:1/generate")]);
    seed(
        &f.db_path,
        "INSERT INTO x_posts (id, text, keyword) VALUES ('p1', 'a', 'k'), ('p2', 'b', 'k');",
    );

    let summary = run_fixture(&f).await.unwrap();
    assert_eq!(summary.total_failed(), 2);
    assert_eq!(summary.total_updated(), 0);
    assert_eq!(score_of(&f.db_path, "x_posts", "p1"), None);
}

#[tokio::test]
async fn missing_table_is_fatal() {
    let server = MockServer::start().await;
    let f = fixture(&server, &[]);
    Connection::open(&f.db_path)
        .unwrap()
        .execute_batch("DROP TABLE instagram_posts;")
        .unwrap();

    let err = run_fixture(&f).await.unwrap_err();
    assert!(err.is_fatal());
}
