// ABOUTME: Layered configuration for CredGraph (env > project file > user file > defaults)
// ABOUTME: Covers export source locations, cache behaviour, logging and dashboard knobs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::CredGraphError {
    fn from(err: ConfigError) -> Self {
        crate::CredGraphError::Config(err.to_string())
    }
}

/// Main configuration for CredGraph
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CredGraphConfig {
    /// Where the two exports come from and where they are cached
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Presentation defaults
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Export source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Base URI the export paths are resolved against
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// Path of the CredResult graph export relative to `base_uri`
    #[serde(default = "default_cred_result_path")]
    pub cred_result_path: String,

    /// Path of the accounts export relative to `base_uri`
    #[serde(default = "default_accounts_path")]
    pub accounts_path: String,

    /// Directory holding cached copies of fetched exports
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Serve exports from the cache directory when present
    #[serde(default)]
    pub use_cache: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            cred_result_path: default_cred_result_path(),
            accounts_path: default_accounts_path(),
            cache_dir: default_cache_dir(),
            use_cache: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Dashboard presentation defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Number of top participants shown by ranking views
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

pub const TOP_N_BOUNDS: (usize, usize) = (5, 100);

// Default value functions
fn default_base_uri() -> String {
    "https://raw.githubusercontent.com/TECommons/tec-sourcecred/gh-pages".to_string()
}
fn default_cred_result_path() -> String {
    "output/credResult.json".to_string()
}
fn default_accounts_path() -> String {
    "output/accounts.json".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_top_n() -> usize {
    5
}

/// Configuration manager with layered loading
pub struct ConfigManager {
    config: CredGraphConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.credgraph.toml, then ~/.credgraph/config.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load from an explicit file, still honouring environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        Self::load_dotenv();
        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    fn finish(
        config: CredGraphConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Logs where the configuration came from. Call once the tracing
    /// subscriber is installed; loading happens before that.
    pub fn log_summary(&self) {
        match self.config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => info!("Config file: NONE (using defaults)"),
        }
        info!(
            "Export source: {} (cache: {})",
            self.config.source.base_uri,
            if self.config.source.use_cache {
                "enabled"
            } else {
                "disabled"
            }
        );
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".credgraph.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .credgraph.env: {}", e);
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.credgraph.toml (current directory)
    /// 2. ~/.credgraph/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(CredGraphConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".credgraph.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".credgraph").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((CredGraphConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<CredGraphConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: CredGraphConfig) -> CredGraphConfig {
        if let Ok(uri) = std::env::var("CREDGRAPH_BASE_URI") {
            config.source.base_uri = uri;
        }
        if let Ok(dir) = std::env::var("CREDGRAPH_CACHE_DIR") {
            config.source.cache_dir = PathBuf::from(dir);
        }
        if let Ok(use_cache) = std::env::var("CREDGRAPH_USE_CACHE") {
            config.source.use_cache = use_cache.to_lowercase() == "true" || use_cache == "1";
        }
        if let Ok(top_n) = std::env::var("CREDGRAPH_TOP_N") {
            if let Ok(n) = top_n.parse() {
                config.dashboard.top_n = n;
            }
        }

        // Logging
        if let Ok(level) = std::env::var("CREDGRAPH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("CREDGRAPH_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    fn validate_config(config: &CredGraphConfig) -> Result<(), ConfigError> {
        if config.source.base_uri.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source.base_uri must not be empty".to_string(),
            ));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        let (min, max) = TOP_N_BOUNDS;
        if !(min..=max).contains(&config.dashboard.top_n) {
            return Err(ConfigError::ValidationError(format!(
                "dashboard.top_n must be between {} and {}, got {}",
                min, max, config.dashboard.top_n
            )));
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CredGraphConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = CredGraphConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}
