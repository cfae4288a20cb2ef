use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Per-item failure recorded during a run, in processing order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub item_id: i64,
    pub error: String,
}

/// Statistics for one batch run. Created at orchestration start, mutated
/// per item, finalized at run end (or partially, on critical failure).
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub started_at: String,
    pub finished_at: Option<String>,
    pub total_found: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total_seconds: f64,
    pub error_details: Vec<ErrorDetail>,
}

impl RunStats {
    pub fn start() -> Self {
        Self {
            started_at: now_rfc3339(),
            finished_at: None,
            total_found: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            total_seconds: 0.0,
            error_details: Vec::new(),
        }
    }

    pub fn record_error(&mut self, item_id: i64, error: impl Into<String>) {
        self.failed += 1;
        self.error_details.push(ErrorDetail {
            item_id,
            error: error.into(),
        });
    }

    pub fn finalize(&mut self, elapsed: std::time::Duration) {
        self.finished_at = Some(now_rfc3339());
        self.total_seconds = (elapsed.as_secs_f64() * 100.0).round() / 100.0;
    }

    /// Human-readable multi-line run report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Batch run completed:\n");
        out.push_str(&format!("- total found: {}\n", self.total_found));
        out.push_str(&format!("- succeeded:   {}\n", self.succeeded));
        out.push_str(&format!("- failed:      {}\n", self.failed));
        out.push_str(&format!("- skipped:     {}\n", self.skipped));
        out.push_str(&format!("- elapsed:     {:.2}s\n", self.total_seconds));

        if !self.error_details.is_empty() {
            out.push_str("errors:\n");
            for detail in &self.error_details {
                out.push_str(&format!("  item {}: {}\n", detail.item_id, detail.error));
            }
        }

        out
    }
}

/// Outcome of processing a single item by id. No RunStats aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct SingleResult {
    pub success: bool,
    pub item_id: i64,
    pub message: String,
}

impl SingleResult {
    pub fn success(item_id: i64, message: impl Into<String>) -> Self {
        Self {
            success: true,
            item_id,
            message: message.into(),
        }
    }

    pub fn failure(item_id: i64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            item_id,
            message: message.into(),
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::RunStats;
    use std::time::Duration;

    #[test]
    fn finalize_sets_timestamp_and_rounds_elapsed() {
        let mut stats = RunStats::start();
        assert!(stats.finished_at.is_none());

        stats.finalize(Duration::from_millis(1_234));
        assert!(stats.finished_at.is_some());
        assert_eq!(stats.total_seconds, 1.23);
    }

    #[test]
    fn record_error_appends_details_in_order() {
        let mut stats = RunStats::start();
        stats.record_error(42, "boom");
        stats.record_error(7, "later");

        assert_eq!(stats.failed, 2);
        assert_eq!(stats.error_details[0].item_id, 42);
        assert_eq!(stats.error_details[1].item_id, 7);
    }

    #[test]
    fn render_text_lists_counters_and_errors() {
        let mut stats = RunStats::start();
        stats.total_found = 3;
        stats.succeeded = 1;
        stats.skipped = 1;
        stats.record_error(9, "no valid summary");
        stats.finalize(Duration::from_secs(6));

        let text = stats.render_text();
        assert!(text.contains("total found: 3"));
        assert!(text.contains("succeeded:   1"));
        assert!(text.contains("failed:      1"));
        assert!(text.contains("skipped:     1"));
        assert!(text.contains("item 9: no valid summary"));
    }

    #[test]
    fn stats_serialize_for_the_json_surface() {
        let mut stats = RunStats::start();
        stats.record_error(1, "x");
        let json = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(json["failed"], 1);
        assert_eq!(json["error_details"][0]["item_id"], 1);
        assert!(json["finished_at"].is_null());
    }
}
