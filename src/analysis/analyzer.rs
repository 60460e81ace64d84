use super::types::{AnalysisOutcome, DetectedItem, ImageReference, SummarizedResult};
use crate::error::AnalysisError;
use crate::usage::ServiceTag;
use async_trait::async_trait;

/// A remote image-recognition provider.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image: &ImageReference) -> Result<AnalysisOutcome, AnalysisError>;

    /// Counter the call is billed against.
    fn service(&self) -> ServiceTag;
}

/// Produces a combined summary of both providers' findings.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        google_vision: &[DetectedItem],
        amazon_rekognition: &[DetectedItem],
    ) -> Result<SummarizedResult, AnalysisError>;
}
