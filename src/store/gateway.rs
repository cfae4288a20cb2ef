use std::path::Path;

use rusqlite::{params, Connection};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::store::models::{PendingItem, StoreStats};

/// Prefix written into the summary column when processing fails, so errored
/// rows are visibly distinct from pending ones and are not re-selected.
pub const ERROR_SENTINEL: &str = "ERROR_PROCESSING:";

const ERROR_MESSAGE_MAX_CHARS: usize = 500;

/// Read/write contract against the consultation table. The orchestrator is
/// generic over this seam so it can run against a spy store in tests.
pub trait ItemStore {
    fn fetch_pending(&self) -> AppResult<Vec<PendingItem>>;
    fn fetch_item(&self, item_id: i64) -> AppResult<Option<PendingItem>>;
    fn write_success(&self, item_id: i64, summary_text: &str) -> AppResult<bool>;
    fn write_failure(&self, item_id: i64, raw_error: &str) -> bool;
    fn stats(&self) -> AppResult<StoreStats>;
    fn close(&mut self);
}

/// One connection per gateway instance, opened eagerly at construction and
/// released by `close` (idempotent). All statements are parameterized.
pub struct SqliteGateway {
    conn: Option<Connection>,
}

impl SqliteGateway {
    pub fn open(db_path: &Path) -> AppResult<Self> {
        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "store connection opened");
        Ok(Self { conn: Some(conn) })
    }

    /// Creates the consultation table when absent. The production table is
    /// owned by an external system; this exists for fresh databases and
    /// test fixtures.
    pub fn ensure_schema(&self) -> AppResult<()> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS consultations (
                id INTEGER PRIMARY KEY,
                owner_ref INTEGER NOT NULL,
                owner_label TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                transcription_enabled INTEGER NOT NULL DEFAULT 0,
                summary TEXT
            );",
        )?;
        Ok(())
    }

    fn conn(&self) -> AppResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| AppError::Store("connection already closed".to_owned()))
    }
}

impl ItemStore for SqliteGateway {
    /// Two concurrent runs can both select the same rows here: the external
    /// table has no status column to claim against, so there is no lease
    /// step. Known correctness gap, see DESIGN.md.
    fn fetch_pending(&self) -> AppResult<Vec<PendingItem>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "SELECT id, owner_ref, owner_label, raw_text, created_at
             FROM consultations
             WHERE transcription_enabled = 1
               AND (summary IS NULL OR summary = '')
             ORDER BY created_at ASC",
        )?;

        let rows = statement.query_map([], map_item)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        info!(count = items.len(), "pending consultations fetched");
        Ok(items)
    }

    fn fetch_item(&self, item_id: i64) -> AppResult<Option<PendingItem>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "SELECT id, owner_ref, owner_label, raw_text, created_at
             FROM consultations
             WHERE id = ?1 AND transcription_enabled = 1",
        )?;

        let mut rows = statement.query_map([item_id], map_item)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn write_success(&self, item_id: i64, summary_text: &str) -> AppResult<bool> {
        let updated = self.conn()?.execute(
            "UPDATE consultations SET summary = ?1 WHERE id = ?2",
            params![summary_text, item_id],
        )?;

        if updated == 1 {
            info!(item_id, "summary written");
            Ok(true)
        } else {
            warn!(item_id, "no row matched summary update");
            Ok(false)
        }
    }

    /// Best-effort: a failure to record the diagnostic must never mask the
    /// primary failure, so this logs and returns false instead of erroring.
    fn write_failure(&self, item_id: i64, raw_error: &str) -> bool {
        let truncated: String = raw_error.chars().take(ERROR_MESSAGE_MAX_CHARS).collect();
        let marked = format!("{ERROR_SENTINEL} {truncated}");

        let result = self.conn().and_then(|conn| {
            conn.execute(
                "UPDATE consultations SET summary = ?1 WHERE id = ?2",
                params![marked, item_id],
            )
            .map_err(AppError::from)
        });

        match result {
            Ok(_) => {
                warn!(item_id, "consultation marked as errored");
                true
            }
            Err(error) => {
                warn!(item_id, %error, "failed to mark consultation as errored");
                false
            }
        }
    }

    fn stats(&self) -> AppResult<StoreStats> {
        let conn = self.conn()?;
        let sentinel_pattern = format!("{ERROR_SENTINEL}%");

        let total: u64 = conn.query_row(
            "SELECT COUNT(*) FROM consultations WHERE transcription_enabled = 1",
            [],
            |row| row.get(0),
        )?;
        let pending: u64 = conn.query_row(
            "SELECT COUNT(*) FROM consultations
             WHERE transcription_enabled = 1 AND (summary IS NULL OR summary = '')",
            [],
            |row| row.get(0),
        )?;
        let errored: u64 = conn.query_row(
            "SELECT COUNT(*) FROM consultations
             WHERE transcription_enabled = 1 AND summary LIKE ?1",
            [&sentinel_pattern],
            |row| row.get(0),
        )?;
        let processed: u64 = conn.query_row(
            "SELECT COUNT(*) FROM consultations
             WHERE transcription_enabled = 1
               AND summary IS NOT NULL AND summary != ''
               AND summary NOT LIKE ?1",
            [&sentinel_pattern],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            total,
            processed,
            pending,
            errored,
        })
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, error)) = conn.close() {
                warn!(%error, "store connection close failed");
            } else {
                info!("store connection closed");
            }
        }
    }
}

fn map_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingItem> {
    Ok(PendingItem {
        id: row.get(0)?,
        owner_ref: row.get(1)?,
        owner_label: row.get(2)?,
        raw_text: row.get(3)?,
        created_at: row.get(4)?,
    })
}
