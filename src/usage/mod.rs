pub mod service;
pub mod store;
pub mod tracker;

pub use service::ServiceTag;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use tracker::{QuotaEntry, QuotaReport, UsageStats, UsageTracker};
