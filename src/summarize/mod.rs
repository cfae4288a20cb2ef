pub mod client;
pub mod engine;
pub mod prompt;
pub mod summary;

pub use client::{GeminiHttp, GenerationParams, ModelApi};
pub use engine::{Sleeper, Summarizer, ThreadSleeper};
pub use summary::Summary;
