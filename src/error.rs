use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store Error: {0}")]
    Store(#[from] StoreError),
    #[error("Analysis Error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

// Key-value store Error Type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access store file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize store contents: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store backend failure: {0}")]
    Backend(String),
}

// Raised by image analyzers and summarizers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("{0}")]
    Provider(String),
    #[error("Request to {0} timed out")]
    Timeout(String),
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
    #[error("Analysis task panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
