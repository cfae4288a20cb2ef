pub mod gateway;
pub mod models;

pub use gateway::{ItemStore, SqliteGateway, ERROR_SENTINEL};
pub use models::{PendingItem, StoreStats};
