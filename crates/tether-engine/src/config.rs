use serde::{Deserialize, Serialize};

fn default_provider_id() -> String {
    "mock".to_string()
}

fn default_retention_days() -> u32 {
    30
}

/// Engine settings that can come from a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider used when a send request does not name one
    #[serde(default = "default_provider_id")]
    pub default_provider_id: String,

    /// Threads idle for longer than this are removed by retention
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_provider_id: default_provider_id(),
            retention_days: default_retention_days(),
        }
    }
}

impl EngineConfig {
    pub fn new(default_provider_id: impl Into<String>) -> Self {
        Self {
            default_provider_id: default_provider_id.into(),
            ..Self::default()
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}
