//! Application configuration for Guidecraft.
//!
//! User config lives at `~/.guidecraft/guidecraft.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuideError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "guidecraft.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".guidecraft";

/// Smallest accepted per-category quota.
pub const MIN_PER_TYPE: u32 = 1;

/// Largest accepted per-category quota.
pub const MAX_PER_TYPE: u32 = 3;

/// Quota used when a request does not specify one.
pub const DEFAULT_PER_TYPE: u32 = 2;

// ---------------------------------------------------------------------------
// Config structs (matching guidecraft.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Web search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Browser-automation agent settings.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Sources requested per category when a request omits `maxPerType`.
    #[serde(default = "default_max_per_type")]
    pub max_per_type: u32,

    /// Results requested from the search provider per query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_per_type: default_max_per_type(),
            results_per_query: default_results_per_query(),
        }
    }
}

fn default_max_per_type() -> u32 {
    DEFAULT_PER_TYPE
}
fn default_results_per_query() -> u32 {
    8
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Web search endpoint (GET, `q` and `count` query parameters).
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the search API key (never store the key itself).
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Header the search key is sent in.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// Per-query timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            auth_header: default_auth_header(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.search.brave.com/res/v1/web/search".into()
}
fn default_search_key_env() -> String {
    "SEARCH_API_KEY".into()
}
fn default_auth_header() -> String {
    "X-Subscription-Token".into()
}
fn default_search_timeout() -> u64 {
    15
}

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Endpoint that starts an automation task and streams its events.
    #[serde(default = "default_agent_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the agent API key.
    #[serde(default = "default_agent_key_env")]
    pub api_key_env: String,

    /// Browser profile passed through to the agent.
    #[serde(default = "default_browser_profile")]
    pub browser_profile: String,

    /// Connect timeout in seconds. Streams themselves have no deadline.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_agent_endpoint(),
            api_key_env: default_agent_key_env(),
            browser_profile: default_browser_profile(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_agent_endpoint() -> String {
    "http://127.0.0.1:9100/v1/automation/run-sse".into()
}
fn default_agent_key_env() -> String {
    "AGENT_API_KEY".into()
}
fn default_browser_profile() -> String {
    "lite".into()
}
fn default_connect_timeout() -> u64 {
    20
}

/// Clamp a requested per-category quota into the accepted range.
///
/// `None` means "not specified" and resolves to [`DEFAULT_PER_TYPE`].
pub fn clamp_per_type(requested: Option<i64>) -> u32 {
    match requested {
        None => DEFAULT_PER_TYPE,
        Some(n) => n.clamp(i64::from(MIN_PER_TYPE), i64::from(MAX_PER_TYPE)) as u32,
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.guidecraft/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GuideError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.guidecraft/guidecraft.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GuideError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GuideError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GuideError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| GuideError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GuideError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an API key from the named env var.
///
/// Returns `None` when the variable is unset or blank.
pub fn read_api_key(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => None,
    }
}

/// Check that the agent API key env var is set and non-empty.
pub fn validate_agent_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.agent.api_key_env;
    read_api_key(var_name).ok_or_else(|| {
        GuideError::validation(format!(
            "Agent API key not found. Set the {var_name} environment variable."
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_per_type"));
        assert!(toml_str.contains("AGENT_API_KEY"));
        assert!(toml_str.contains("SEARCH_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_per_type, 2);
        assert_eq!(parsed.defaults.results_per_query, 8);
        assert_eq!(parsed.agent.browser_profile, "lite");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:9000"

[agent]
endpoint = "https://agent.internal/run"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.agent.endpoint, "https://agent.internal/run");
        assert_eq!(config.agent.api_key_env, "AGENT_API_KEY");
        assert_eq!(config.search.timeout_secs, 15);
    }

    #[test]
    fn per_type_is_clamped() {
        assert_eq!(clamp_per_type(None), 2);
        assert_eq!(clamp_per_type(Some(0)), 1);
        assert_eq!(clamp_per_type(Some(-5)), 1);
        assert_eq!(clamp_per_type(Some(2)), 2);
        assert_eq!(clamp_per_type(Some(99)), 3);
    }

    #[test]
    fn agent_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.agent.api_key_env = "GC_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_agent_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
