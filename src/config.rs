use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
#[cfg_attr(test, mockall::automock)]
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Per-flavor engine options
///
/// A flavor takes its own copy at construction time; changing a copy later
/// never affects a flavor already built from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Options {
    /// Stop a fan-out at the first failing child
    pub fail_fast: bool,
    /// Reject schema keys that are not registered rules
    pub strict_rules: bool,
    /// Maximum number of compiled patterns kept per flavor
    pub pattern_cache_capacity: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fail_fast: true,
            strict_rules: false,
            pattern_cache_capacity: 256,
        }
    }
}

/// Configuration manager for loading and merging options
pub struct ConfigManager;

impl ConfigManager {
    /// Configuration file names looked up in the current directory
    pub const CONFIG_NAMES: [&'static str; 4] = [
        "validate-json.toml",
        "validate-json.json",
        ".validate-json.toml",
        ".validate-json.json",
    ];

    /// Load options with precedence: defaults -> file -> environment
    pub async fn load_options(path: Option<&Path>) -> Result<Options> {
        let mut options = Options::default();

        if let Some(config_path) = path {
            let file_options = Self::load_from_file(config_path).await?;
            options = Self::merge_options(options, file_options);
        } else if let Some(found) = Self::find_config_file().await? {
            options = Self::merge_options(options, found);
        }

        options = Self::apply_environment_overrides(options)?;

        Self::validate_options(&options)?;

        Ok(options)
    }

    /// Load options from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Options> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let options: Options = toml::from_str(&content)?;
                Ok(options)
            }
            Some("json") => {
                let options: Options = serde_json::from_str(&content)?;
                Ok(options)
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(options) = toml::from_str::<Options>(&content) {
                    Ok(options)
                } else {
                    let options: Options = serde_json::from_str(&content)?;
                    Ok(options)
                }
            }
        }
    }

    /// Find a configuration file in the current directory
    pub async fn find_config_file() -> Result<Option<Options>> {
        for name in &Self::CONFIG_NAMES {
            let path = PathBuf::from(name);
            if tokio::fs::try_exists(&path).await? {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(options: Options) -> Result<Options> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, options)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut options: Options,
    ) -> Result<Options> {
        if let Some(fail_fast) = env.get("VALIDATE_JSON_FAIL_FAST") {
            options.fail_fast = fail_fast.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_JSON_FAIL_FAST value: {}",
                    fail_fast
                ))
            })?;
        }

        if let Some(strict) = env.get("VALIDATE_JSON_STRICT_RULES") {
            options.strict_rules = strict.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_JSON_STRICT_RULES value: {}",
                    strict
                ))
            })?;
        }

        if let Some(capacity) = env.get("VALIDATE_JSON_PATTERN_CACHE_CAPACITY") {
            options.pattern_cache_capacity = capacity.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_JSON_PATTERN_CACHE_CAPACITY value: {}",
                    capacity
                ))
            })?;
        }

        Ok(options)
    }

    /// Merge two option sets (the override wins field by field)
    pub fn merge_options(mut base: Options, override_options: Options) -> Options {
        base.fail_fast = override_options.fail_fast;
        base.strict_rules = override_options.strict_rules;
        base.pattern_cache_capacity = override_options.pattern_cache_capacity;

        base
    }

    /// Validate option values
    pub fn validate_options(options: &Options) -> Result<()> {
        if options.pattern_cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "Pattern cache capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
