use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;

use super::orchestrator::ParallelAnalysisOrchestrator;
use super::types::{CombinedAnalysisResult, ImageReference};

/// `tower` front for a shared orchestrator. Failures are reported inside
/// the response, so the service itself never errors.
#[derive(Clone)]
pub struct AnalysisService {
    inner: Arc<ParallelAnalysisOrchestrator>,
}

impl AnalysisService {
    pub fn new(inner: Arc<ParallelAnalysisOrchestrator>) -> Self {
        Self { inner }
    }
}

impl Service<ImageReference> for AnalysisService {
    type Response = CombinedAnalysisResult;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: ImageReference) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move { Ok(inner.analyze(&image).await) })
    }
}
