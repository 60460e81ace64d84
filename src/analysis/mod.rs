pub mod analyzer;
pub mod merge;
pub mod orchestrator;
pub mod service;
pub mod types;

pub use analyzer::{ImageAnalyzer, Summarizer};
pub use merge::{merge_items, merge_outcomes};
pub use orchestrator::{OrchestratorBuilder, ParallelAnalysisOrchestrator};
pub use service::AnalysisService;
pub use types::{
    AnalysisOutcome, CombinedAnalysisResult, DetectedItem, ImageReference, SummarizedResult,
};
