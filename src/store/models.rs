use serde::Serialize;

/// Row eligible for summarization: transcription flag set, summary empty.
/// Immutable once fetched within a run.
#[derive(Debug, Clone, Serialize)]
pub struct PendingItem {
    pub id: i64,
    pub owner_ref: i64,
    pub owner_label: String,
    pub raw_text: String,
    pub created_at: String,
}

/// Partition of the transcription-enabled subset of the table.
/// `processed`, `pending` and `errored` are mutually exclusive and sum to
/// `total`: sentinel-marked rows count as errored, not processed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub total: u64,
    pub processed: u64,
    pub pending: u64,
    pub errored: u64,
}
