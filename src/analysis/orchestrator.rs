use super::analyzer::{ImageAnalyzer, Summarizer};
use super::types::{AnalysisOutcome, CombinedAnalysisResult, ImageReference, SummarizedResult};
use crate::config::Configuration;
use crate::error::{AnalysisError, AppError, ConfigError};
use crate::usage::{ServiceTag, UsageTracker};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

const GENERIC_FAILURE: &str = "Analysis failed";

/// Runs Google Vision and Amazon Rekognition side by side against one image.
///
/// `analyze` never returns an error: limit rejections, provider failures and
/// panics all come back as a [`CombinedAnalysisResult`] with `success == false`.
pub struct ParallelAnalysisOrchestrator {
    google_vision: Arc<dyn ImageAnalyzer>,
    amazon_rekognition: Arc<dyn ImageAnalyzer>,
    summarizer: Option<Arc<dyn Summarizer>>,
    usage: UsageTracker,
    configuration: Configuration,
}

impl ParallelAnalysisOrchestrator {
    pub fn builder(usage: UsageTracker) -> OrchestratorBuilder {
        OrchestratorBuilder::new(usage)
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[instrument(skip(self, image), fields(image = %image))]
    pub async fn analyze(&self, image: &ImageReference) -> CombinedAnalysisResult {
        let start = Instant::now();

        match AssertUnwindSafe(self.run(image, start)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Analysis of {} aborted: {}", image, message);
                CombinedAnalysisResult::aborted(message, start.elapsed())
            }
        }
    }

    async fn run(&self, image: &ImageReference, start: Instant) -> CombinedAnalysisResult {
        let google_service = self.google_vision.service();
        let amazon_service = self.amazon_rekognition.service();

        let (google_allowed, amazon_allowed) = futures::join!(
            self.usage
                .check_limit(google_service, self.configuration.limit_for(google_service)),
            self.usage
                .check_limit(amazon_service, self.configuration.limit_for(amazon_service)),
        );

        if !google_allowed || !amazon_allowed {
            let exhausted: Vec<&str> = [
                (google_service, google_allowed),
                (amazon_service, amazon_allowed),
            ]
            .into_iter()
            .filter(|(_, allowed)| !allowed)
            .map(|(service, _)| service.name())
            .collect();
            let message = format!("Usage limit reached for {}", exhausted.join(", "));
            warn!("{}", message);
            return CombinedAnalysisResult::aborted(message, start.elapsed());
        }

        let (google, amazon) = futures::join!(
            settle(self.google_vision.as_ref(), image),
            settle(self.amazon_rekognition.as_ref(), image),
        );

        futures::join!(
            self.record_success(google_service, &google),
            self.record_success(amazon_service, &amazon),
        );

        let mut result = CombinedAnalysisResult::from_outcomes(google, amazon, Duration::ZERO);

        if result.success {
            result.summary = self.summarize(&result).await;
        } else {
            warn!(
                "Both analyses failed for {}: {}",
                image,
                result.error.as_deref().unwrap_or(GENERIC_FAILURE)
            );
        }

        result.total_processing_time = start.elapsed();
        info!(
            "Analysis of {} finished in {}ms (success: {}, summary: {})",
            image,
            result.total_processing_time.as_millis(),
            result.success,
            result.summary.is_some()
        );
        result
    }

    async fn record_success(&self, service: ServiceTag, outcome: &AnalysisOutcome) {
        if outcome.success {
            self.usage.increment(service).await;
        }
    }

    /// Best-effort; any failure leaves the combined result without a summary.
    async fn summarize(&self, result: &CombinedAnalysisResult) -> Option<SummarizedResult> {
        if !self.configuration.summarization_enabled {
            debug!("Summarization disabled");
            return None;
        }
        let summarizer = self.summarizer.as_ref()?;

        if !self
            .usage
            .check_limit(ServiceTag::OpenAi, self.configuration.openai_limit)
            .await
        {
            warn!("Usage limit reached for {}, skipping summary", ServiceTag::OpenAi);
            return None;
        }

        let google = result
            .google_vision
            .as_ref()
            .map(AnalysisOutcome::successful_items)
            .unwrap_or_default();
        let amazon = result
            .amazon_rekognition
            .as_ref()
            .map(AnalysisOutcome::successful_items)
            .unwrap_or_default();

        match AssertUnwindSafe(summarizer.summarize(google, amazon))
            .catch_unwind()
            .await
        {
            Ok(Ok(summary)) => {
                self.usage.increment(ServiceTag::OpenAi).await;
                Some(summary)
            }
            Ok(Err(e)) => {
                warn!("Summarization failed: {}", e);
                None
            }
            Err(panic) => {
                warn!("Summarization panicked: {}", panic_message(panic.as_ref()));
                None
            }
        }
    }
}

/// Awaits one analyzer, turning errors and panics into a failed outcome.
async fn settle(analyzer: &dyn ImageAnalyzer, image: &ImageReference) -> AnalysisOutcome {
    let service = analyzer.service();
    let started = Instant::now();

    let fault = match AssertUnwindSafe(analyzer.analyze(image)).catch_unwind().await {
        Ok(Ok(outcome)) => {
            debug!(
                "{} returned {} items in {}ms",
                service,
                outcome.items.len(),
                outcome.processing_time.as_millis()
            );
            return outcome.completed_now();
        }
        Ok(Err(e)) => e,
        Err(panic) => AnalysisError::Panicked(panic_message(panic.as_ref())),
    };

    let mut message = fault.to_string();
    if message.trim().is_empty() {
        message = GENERIC_FAILURE.to_string();
    }
    warn!("{} analysis failed: {}", service, message);
    AnalysisOutcome::failed(message, started.elapsed())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}

/// Each analyzer is billed against its own [`ImageAnalyzer::service`]
/// counter; `build` rejects two analyzers that report the same service.
pub struct OrchestratorBuilder {
    usage: UsageTracker,
    configuration: Configuration,
    google_vision: Option<Arc<dyn ImageAnalyzer>>,
    amazon_rekognition: Option<Arc<dyn ImageAnalyzer>>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl OrchestratorBuilder {
    pub fn new(usage: UsageTracker) -> Self {
        Self {
            usage,
            configuration: Configuration::default(),
            google_vision: None,
            amazon_rekognition: None,
            summarizer: None,
        }
    }

    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    // Overrides the configured ceiling for a single service.
    pub fn limit(mut self, service: ServiceTag, limit: u64) -> Self {
        match service {
            ServiceTag::GoogleVision => self.configuration.google_vision_limit = limit,
            ServiceTag::AmazonRekognition => self.configuration.amazon_rekognition_limit = limit,
            ServiceTag::OpenAi => self.configuration.openai_limit = limit,
        }
        self
    }

    pub fn summarization_enabled(mut self, enabled: bool) -> Self {
        self.configuration.summarization_enabled = enabled;
        self
    }

    pub fn google_vision(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.google_vision = Some(analyzer);
        self
    }

    pub fn amazon_rekognition(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.amazon_rekognition = Some(analyzer);
        self
    }

    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn build(self) -> Result<ParallelAnalysisOrchestrator, AppError> {
        self.configuration.validate()?;
        let google_vision = self
            .google_vision
            .ok_or_else(|| ConfigError::Invalid("Google Vision analyzer not set".to_string()))?;
        let amazon_rekognition = self.amazon_rekognition.ok_or_else(|| {
            ConfigError::Invalid("Amazon Rekognition analyzer not set".to_string())
        })?;

        if google_vision.service() == amazon_rekognition.service() {
            return Err(ConfigError::Invalid(format!(
                "Both analyzers bill the {} counter",
                google_vision.service()
            ))
            .into());
        }

        Ok(ParallelAnalysisOrchestrator {
            google_vision,
            amazon_rekognition,
            summarizer: self.summarizer,
            usage: self.usage,
            configuration: self.configuration,
        })
    }
}
