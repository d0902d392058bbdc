use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tether_engine::EngineConfig;
use tether_llm::ProviderConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
    pub attachments: AttachmentsConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Model used when a chat request does not name one
    pub default_model: String,
    pub mock_chunks: Vec<String>,
    #[serde(default)]
    pub mock_delay_ms: Option<u64>,
    pub openai_model: String,
    pub openrouter_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    MongoDb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsConfig {
    pub local_root: PathBuf,
}

/// Wire encoding of the event streams served over HTTP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    /// Engine frames as-is
    Core,
    /// Frames re-encoded for chat UI clients
    #[default]
    Ui,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub format: StreamFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Seconds between background retention runs. 0 disables the loop.
    #[serde(default = "default_retention_interval_secs")]
    pub retention_interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            retention_interval_secs: default_retention_interval_secs(),
        }
    }
}

fn default_retention_interval_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (`TETHER_SERVER__PORT=9000`, `TETHER_LOGGING__LEVEL=debug`, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TETHER")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets are never read from TOML
        cfg.openai_api_key = non_empty_env("OPENAI_API_KEY");
        cfg.openrouter_api_key = non_empty_env("OPENROUTER_API_KEY");
        cfg.mongodb_uri = non_empty_env("MONGODB_URI");

        if cfg.storage.backend == StorageBackend::MongoDb && cfg.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    /// Providers to register: the mock always, remote backends when their key is set
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        let mut configs = vec![ProviderConfig::Mock {
            chunks: self.providers.mock_chunks.clone(),
            delay_ms: self.providers.mock_delay_ms,
        }];

        if let Some(key) = &self.openai_api_key {
            configs.push(ProviderConfig::openai(key.as_str(), self.providers.openai_model.as_str()));
        }
        if let Some(key) = &self.openrouter_api_key {
            configs.push(ProviderConfig::openrouter(
                key.as_str(),
                self.providers.openrouter_model.as_str(),
            ));
        }

        configs
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [engine]
        default_provider_id = "mock"
        retention_days = 7

        [providers]
        default_model = "gpt-4o-mini"
        mock_chunks = ["a", "b"]
        openai_model = "gpt-4o-mini"
        openrouter_model = "openai/gpt-4o-mini"

        [storage]
        backend = "memory"
        database = "test"

        [attachments]
        local_root = "/tmp/attachments"

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 300);
        assert_eq!(config.engine.retention_days, 7);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.stream.format, StreamFormat::Ui);
    }

    #[test]
    fn test_remote_providers_need_keys() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        let ids: Vec<String> = config
            .provider_configs()
            .iter()
            .map(|c| c.provider_id().to_string())
            .collect();
        assert_eq!(ids, vec!["mock"]);

        config.openai_api_key = Some("sk-test".to_string());
        let ids: Vec<String> = config
            .provider_configs()
            .iter()
            .map(|c| c.provider_id().to_string())
            .collect();
        assert_eq!(ids, vec!["mock", "openai"]);
    }

    #[test]
    fn test_default_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.engine.default_provider_id, "mock");
        assert_eq!(config.attachments.local_root, PathBuf::from(".data/attachments"));
    }
}
