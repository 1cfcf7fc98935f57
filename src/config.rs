use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "review-themes.toml";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_COLUMN: &str = "text";
pub const DEFAULT_MAX_THEMES: usize = 10;
pub const DEFAULT_FLAG_THRESHOLD: u32 = 3;

/// Env files read before credentials are resolved. Real environment variables win.
pub const ENV_FILES: &[&str] = &["setvar.env", ".env"];

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub error_delay_ms: Option<u64>,
    pub prompts_dir: Option<String>,
    pub column: Option<String>,
    pub max_themes: Option<usize>,
    pub categories: Option<Vec<String>>,
    pub focus_areas: Option<Vec<String>>,
    pub flag_threshold: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub timeout: Duration,
    pub request_delay: Duration,
    pub error_delay: Duration,
    pub prompts_dir: Option<String>,
    pub column: String,
    pub max_themes: usize,
    /// Overrides the strategy's default category list when set.
    pub categories: Option<Vec<String>>,
    /// Overrides the strategy's default focus areas when set.
    pub focus_areas: Option<Vec<String>>,
    pub flag_threshold: u32,
}

impl Config {
    /// Load the config file named on the command line, or the default file if
    /// it exists, and merge CLI overrides on top.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config {
            Some(ref path) => {
                let config_path = Path::new(path);
                if !config_path.exists() {
                    return Err(Error::ConfigNotFound(config_path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(config_path)?)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    parse_config(&std::fs::read_to_string(default_path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let config = merge(file_config, cli);
        if config.model.trim().is_empty() {
            return Err(Error::ConfigValidation("model must not be empty".to_string()));
        }
        Ok(config)
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref model) = config.model
        && model.trim().is_empty()
    {
        return Err(Error::ConfigValidation("model must not be empty".to_string()));
    }
    if let Some(ref base) = config.api_base
        && !(base.starts_with("http://") || base.starts_with("https://"))
    {
        return Err(Error::ConfigValidation(format!(
            "api_base must be an http(s) URL, got: {base}"
        )));
    }
    if let Some(timeout) = config.timeout_secs
        && timeout == 0
    {
        return Err(Error::ConfigValidation(
            "timeout_secs must be > 0".to_string(),
        ));
    }
    if let Some(max) = config.max_themes
        && max == 0
    {
        return Err(Error::ConfigValidation(
            "max_themes must be > 0".to_string(),
        ));
    }
    if let Some(threshold) = config.flag_threshold
        && threshold > 10
    {
        return Err(Error::ConfigValidation(format!(
            "flag_threshold must be between 0 and 10, got: {threshold}"
        )));
    }
    for (name, list) in [
        ("categories", &config.categories),
        ("focus_areas", &config.focus_areas),
    ] {
        if let Some(items) = list
            && (items.is_empty() || items.iter().any(|i| i.trim().is_empty()))
        {
            return Err(Error::ConfigValidation(format!(
                "{name} must be a non-empty list of non-empty strings"
            )));
        }
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    Config {
        model: cli
            .model
            .clone()
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        api_base: file
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        api_key_env: file
            .api_key_env
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
        timeout: Duration::from_secs(file.timeout_secs.unwrap_or(60)),
        request_delay: Duration::from_millis(file.request_delay_ms.unwrap_or(300)),
        error_delay: Duration::from_millis(file.error_delay_ms.unwrap_or(2000)),
        prompts_dir: cli.prompts_dir.clone().or(file.prompts_dir),
        column: file.column.unwrap_or_else(|| DEFAULT_COLUMN.to_string()),
        max_themes: file.max_themes.unwrap_or(DEFAULT_MAX_THEMES),
        categories: file.categories,
        focus_areas: file.focus_areas,
        flag_threshold: file.flag_threshold.unwrap_or(DEFAULT_FLAG_THRESHOLD),
    }
}

/// Load `setvar.env` / `.env` from the working directory when present.
pub fn load_env_files() {
    for name in ENV_FILES {
        if dotenvy::from_path(name).is_ok() {
            tracing::debug!(file = name, "loaded environment file");
        }
    }
}

/// Read the API key from the named environment variable.
pub fn resolve_api_key(api_key_env: &str) -> Result<String> {
    match std::env::var(api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::MissingCredential(api_key_env.to_string())),
    }
}
