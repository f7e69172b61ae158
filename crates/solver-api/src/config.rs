use config::{Config as ConfigLoader, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;

use solver_core::{RouteProfile, TitleProfile};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub openai_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
}

/// Model profiles; prompts left empty use the built-in templates
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub general: RouteProfile,
    pub quantitative: RouteProfile,
    pub title: TitleModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleModelConfig {
    pub model: String,
    #[serde(default = "default_title_max_tokens")]
    pub max_tokens: u32,
}

fn default_title_max_tokens() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// Local offset for fallback titles, in minutes east of UTC
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

fn default_utc_offset_minutes() -> i32 {
    480
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
    /// 3. `SOLVER_`-prefixed environment variables, `__` between key levels
    ///    (`SOLVER_SERVER__PORT`, `SOLVER_LLM__GENERAL__MODEL`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(std::env::vars().collect())
    }

    /// Same as [`Config::load`], reading variables from `vars` instead of the process
    pub fn load_with(vars: Map<String, String>) -> Result<Self, ConfigError> {
        let env = vars.get("ENV").cloned().unwrap_or_else(|| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("SOLVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        let secret = |key: &str| vars.get(key).filter(|value| !value.is_empty()).cloned();

        cfg.openai_api_key = secret("OPENAI_API_KEY").ok_or_else(|| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        cfg.openai_base_url = secret("OPENAI_BASE_URL");

        if cfg.storage.backend == StorageBackend::Mongodb {
            cfg.mongodb_uri = secret("MONGODB_URI").ok_or_else(|| {
                ConfigError::Message(
                    "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
                )
            })?;
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn title_profile(&self) -> TitleProfile {
        TitleProfile {
            model: self.llm.title.model.clone(),
            max_tokens: self.llm.title.max_tokens,
            utc_offset_minutes: self.summarizer.utc_offset_minutes,
        }
    }
}
