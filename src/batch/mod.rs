pub mod orchestrator;
pub mod report;

pub use orchestrator::{BatchOrchestrator, CriticalRunError, EXHAUSTED_DIAGNOSTIC};
pub use report::{ErrorDetail, RunStats, SingleResult};
