use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::service::PageSizes;
use crate::transport::Headers;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paging: PageSizes,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Application root, e.g. `https://jazz.example:9443/ccm`.
    #[serde(default)]
    pub url: Option<String>,
    /// Extra headers sent with every request (authentication cookies).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            headers: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn default_headers(&self) -> Headers {
        self.headers.iter().collect()
    }
}

/// Configuration after file, environment and flags have been layered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub config: ClientConfig,
    pub url: Option<String>,
    pub resolved_output: String,
}

/// Location of the user config file, if the platform has a config dir.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rtc/config.toml"))
}

/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_config() -> Result<ClientConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(ClientConfig::default()),
    }
}

/// # Errors
///
/// Returns an error if `path` exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ClientConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the user config and apply `RTC_URL`/`FORMAT` and CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn resolve_config(cli_url: Option<&str>, cli_json: bool) -> Result<EffectiveConfig> {
    let config = load_config()?;
    let env_url = env::var("RTC_URL").ok();
    let env_format = env::var("FORMAT").ok();
    Ok(resolve(config, cli_url, env_url, cli_json, env_format))
}

fn resolve(
    config: ClientConfig,
    cli_url: Option<&str>,
    env_url: Option<String>,
    cli_json: bool,
    env_format: Option<String>,
) -> EffectiveConfig {
    let url = cli_url
        .map(str::to_string)
        .or(env_url)
        .or_else(|| config.server.url.clone())
        .filter(|url| !url.trim().is_empty());
    let resolved_output = resolve_output(cli_json, config.output.clone(), env_format);
    EffectiveConfig {
        config,
        url,
        resolved_output,
    }
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_timeout_secs() -> u64 {
    30
}
