use serde::{Deserialize, Serialize};
use std::fmt;

const KEY_PREFIX: &str = "usage_";

/// External providers whose calls are counted against a soft quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceTag {
    GoogleVision,
    AmazonRekognition,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ServiceTag {
    pub const ALL: [ServiceTag; 3] = [
        ServiceTag::GoogleVision,
        ServiceTag::AmazonRekognition,
        ServiceTag::OpenAi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ServiceTag::GoogleVision => "googleVision",
            ServiceTag::AmazonRekognition => "amazonRekognition",
            ServiceTag::OpenAi => "openai",
        }
    }

    /// Key under which the counter is persisted.
    pub fn storage_key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.name())
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
