//! End-to-end batch runs over a real SQLite database with a scripted model.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use callsum::batch::{BatchOrchestrator, RunStats};
use callsum::config::{BatchConfig, ModelConfig};
use callsum::error::AppResult;
use callsum::store::{ItemStore, SqliteGateway, ERROR_SENTINEL};
use callsum::summarize::{GenerationParams, ModelApi, Sleeper, Summarizer};

struct ScriptedModel {
    replies: Mutex<Vec<AppResult<String>>>,
}

impl ScriptedModel {
    fn new(mut replies: Vec<AppResult<String>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }
}

impl ModelApi for ScriptedModel {
    fn generate(&self, _prompt: &str, _params: &GenerationParams) -> AppResult<String> {
        self.replies
            .lock()
            .expect("lock replies")
            .pop()
            .expect("scripted reply available")
    }
}

struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

fn seed_row(db_path: &Path, id: i64, raw_text: &str, created_at: &str, enabled: bool) {
    let conn = rusqlite::Connection::open(db_path).expect("open");
    conn.execute(
        "INSERT INTO consultations
         (id, owner_ref, owner_label, raw_text, created_at, transcription_enabled, summary)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
        rusqlite::params![id, 1, "advisor", raw_text, created_at, enabled],
    )
    .expect("insert");
}

fn read_summary(db_path: &Path, id: i64) -> Option<String> {
    let conn = rusqlite::Connection::open(db_path).expect("open");
    conn.query_row(
        "SELECT summary FROM consultations WHERE id = ?1",
        [id],
        |row| row.get(0),
    )
    .expect("query")
}

fn valid_reply() -> String {
    r#"{
        "overview": "Router drops the link every 2 hours",
        "client_requirements": ["stable uplink"],
        "technical_details": ["firmware v1.2.3"],
        "equipment_models": ["Archer C6"],
        "usage_metrics": ["every 2 hours"],
        "recommended_actions": ["upgrade firmware"]
    }"#
    .to_owned()
}

fn run_batch(db_path: &Path, replies: Vec<AppResult<String>>) -> RunStats {
    let gateway = SqliteGateway::open(db_path).expect("open gateway");
    gateway.ensure_schema().expect("schema");

    let model_config = ModelConfig {
        api_key: "test-key".to_owned(),
        max_retries: 5,
        requests_per_minute: 60,
        ..ModelConfig::default()
    };
    let summarizer = Summarizer::new(ScriptedModel::new(replies), NoopSleeper, &model_config);
    let orchestrator = BatchOrchestrator::new(
        gateway,
        summarizer,
        NoopSleeper,
        &BatchConfig { delay_seconds: 0 },
    );

    orchestrator.process_all_pending().expect("batch run")
}

#[test]
fn mixed_batch_persists_success_skip_and_sentinel_and_is_idempotent() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let db_path = temp.path().join("consultations.sqlite3");

    {
        let gateway = SqliteGateway::open(&db_path).expect("open");
        gateway.ensure_schema().expect("schema");
    }
    seed_row(&db_path, 1, "Router disconnects every 2 hours", "2026-03-01T08:00:00Z", true);
    seed_row(&db_path, 2, "ok", "2026-03-01T09:00:00Z", true);
    seed_row(&db_path, 3, "Printer feeder jams on thick paper stock", "2026-03-01T10:00:00Z", true);
    seed_row(&db_path, 4, "Not eligible for transcription at all", "2026-03-01T11:00:00Z", false);

    // Item 1 succeeds; item 2 is skipped before any model call; item 3
    // burns all five attempts on malformed output.
    let mut replies = vec![Ok(valid_reply())];
    replies.extend((0..5).map(|_| Ok("not json".to_owned())));
    let stats = run_batch(&db_path, replies);

    assert_eq!(stats.total_found, 3);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.error_details.len(), 1);
    assert_eq!(stats.error_details[0].item_id, 3);
    assert!(stats.finished_at.is_some());

    let stored = read_summary(&db_path, 1).expect("summary written");
    let parsed: serde_json::Value = serde_json::from_str(&stored).expect("canonical json");
    assert_eq!(parsed["overview"], "Router drops the link every 2 hours");

    let sentinel = read_summary(&db_path, 3).expect("sentinel written");
    assert!(sentinel.starts_with(ERROR_SENTINEL));
    assert!(sentinel.contains("Fallo generación resumen"));

    assert!(read_summary(&db_path, 4).is_none(), "disabled row untouched");

    // Second run with no store mutation in between: the skipped row is the
    // only one still pending, everything written is excluded.
    let second = run_batch(&db_path, vec![]);
    assert_eq!(second.total_found, 1);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.succeeded + second.failed, 0);

    let gateway = SqliteGateway::open(&db_path).expect("open");
    let store_stats = gateway.stats().expect("stats");
    assert_eq!(store_stats.total, 3);
    assert_eq!(store_stats.processed, 1);
    assert_eq!(store_stats.pending, 1);
    assert_eq!(store_stats.errored, 1);
    assert_eq!(
        store_stats.processed + store_stats.pending + store_stats.errored,
        store_stats.total
    );
}

#[test]
fn process_one_writes_exactly_one_summary_for_the_requested_item() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let db_path = temp.path().join("consultations.sqlite3");

    {
        let gateway = SqliteGateway::open(&db_path).expect("open");
        gateway.ensure_schema().expect("schema");
    }
    seed_row(
        &db_path,
        42,
        "Router disconnects every 2 hours, firmware v1.2.3",
        "2026-03-01T08:00:00Z",
        true,
    );

    let gateway = SqliteGateway::open(&db_path).expect("open gateway");
    let model_config = ModelConfig {
        api_key: "test-key".to_owned(),
        ..ModelConfig::default()
    };
    let summarizer = Summarizer::new(
        ScriptedModel::new(vec![Ok(valid_reply())]),
        NoopSleeper,
        &model_config,
    );
    let orchestrator = BatchOrchestrator::new(
        gateway,
        summarizer,
        NoopSleeper,
        &BatchConfig { delay_seconds: 0 },
    );

    let result = orchestrator.process_one(42).expect("result");
    assert!(result.success);
    assert_eq!(result.item_id, 42);

    let stored = read_summary(&db_path, 42).expect("summary written");
    let parsed: serde_json::Value = serde_json::from_str(&stored).expect("canonical json");
    assert_eq!(parsed["technical_details"][0], "firmware v1.2.3");
}
