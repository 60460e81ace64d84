use crate::error::ConfigError;
use crate::usage::ServiceTag;
use serde::Deserialize;
use tracing::Level;

const CONFIG_FILE: &str = "vision-ensemble";
const ENV_PREFIX: &str = "VISION";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub google_vision_limit: u64,
    pub amazon_rekognition_limit: u64,
    pub openai_limit: u64,
    pub summarization_enabled: bool,
    pub store_path: String,
    pub log_level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            google_vision_limit: 1000,
            amazon_rekognition_limit: 1000,
            openai_limit: 1000,
            summarization_enabled: true,
            store_path: "usage.json".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Configuration {
    /// Loads `vision-ensemble.toml` (if present) and `VISION_*` environment
    /// overrides on top of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let configuration: Configuration = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// The soft quota configured for a service.
    pub fn limit_for(&self, service: ServiceTag) -> u64 {
        match service {
            ServiceTag::GoogleVision => self.google_vision_limit,
            ServiceTag::AmazonRekognition => self.amazon_rekognition_limit,
            ServiceTag::OpenAi => self.openai_limit,
        }
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| ConfigError::Invalid(format!("Unknown log level '{}'", self.log_level)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for service in ServiceTag::ALL {
            if self.limit_for(service) == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Limit for {} must be greater than 0",
                    service
                )));
            }
        }

        if self.store_path.trim().is_empty() {
            return Err(ConfigError::Invalid("Store path must not be empty".to_string()));
        }

        self.log_level()?;
        Ok(())
    }
}
