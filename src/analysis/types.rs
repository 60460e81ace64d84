use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque reference to the image being analyzed (file path, URI or
/// provider-specific handle). Collaborators decide how to resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedItem {
    pub name: String,
    pub category: String,
    pub confidence: f32,
}

impl DetectedItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            confidence,
        }
    }

    /// Same label (ignoring case) in the same category.
    pub fn is_same_finding(&self, other: &DetectedItem) -> bool {
        self.category == other.category && self.name.to_lowercase() == other.name.to_lowercase()
    }
}

/// Result of one call to one image analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    pub items: Vec<DetectedItem>,
    pub processing_time: Duration,
    pub completed_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl AnalysisOutcome {
    pub fn succeeded(items: Vec<DetectedItem>, processing_time: Duration) -> Self {
        Self {
            success: true,
            items,
            processing_time,
            completed_at: Utc::now(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, processing_time: Duration) -> Self {
        Self {
            success: false,
            items: Vec::new(),
            processing_time,
            completed_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Re-stamps the outcome with the time the orchestrator received it.
    pub fn completed_now(mut self) -> Self {
        self.completed_at = Utc::now();
        self
    }

    /// Items to feed downstream; a failed outcome contributes nothing.
    pub fn successful_items(&self) -> &[DetectedItem] {
        if self.success {
            &self.items
        } else {
            &[]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedResult {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedAnalysisResult {
    pub success: bool,
    pub google_vision: Option<AnalysisOutcome>,
    pub amazon_rekognition: Option<AnalysisOutcome>,
    pub summary: Option<SummarizedResult>,
    pub total_processing_time: Duration,
    pub error: Option<String>,
}

impl CombinedAnalysisResult {
    /// A result produced before (or instead of) any analyzer outcome.
    pub fn aborted(error: impl Into<String>, total_processing_time: Duration) -> Self {
        Self {
            success: false,
            google_vision: None,
            amazon_rekognition: None,
            summary: None,
            total_processing_time,
            error: Some(error.into()),
        }
    }

    pub fn from_outcomes(
        google_vision: AnalysisOutcome,
        amazon_rekognition: AnalysisOutcome,
        total_processing_time: Duration,
    ) -> Self {
        let success = google_vision.success || amazon_rekognition.success;
        let error = if success {
            None
        } else {
            Some(joint_error(&google_vision, &amazon_rekognition))
        };

        Self {
            success,
            google_vision: Some(google_vision),
            amazon_rekognition: Some(amazon_rekognition),
            summary: None,
            total_processing_time,
            error,
        }
    }
}

fn joint_error(google_vision: &AnalysisOutcome, amazon_rekognition: &AnalysisOutcome) -> String {
    format!(
        "Both analyses failed. Google Vision: {}; Amazon Rekognition: {}",
        google_vision.error.as_deref().unwrap_or("unknown error"),
        amazon_rekognition.error.as_deref().unwrap_or("unknown error"),
    )
}
