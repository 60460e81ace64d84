pub mod analysis;
pub mod config;
pub mod error;
pub mod usage;

pub use error::{AnalysisError, AppError, ConfigError, StoreError};

pub use analysis::{AnalysisService, CombinedAnalysisResult, ParallelAnalysisOrchestrator};
pub use config::Configuration;
pub use usage::{JsonFileStore, KeyValueStore, MemoryStore, ServiceTag, UsageTracker};
