//! Client config load/save for `~/.kb-chat/config.yaml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::client::ClientOptions;

/// Base URL used when neither the config file nor a flag sets one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Endpoint section (base_url, timeout_secs).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EndpointSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Tenant section (company).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TenantSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Full config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointSection,
    #[serde(default)]
    pub tenant: TenantSection,
}

impl Config {
    /// Client options from this config. Blank company values count as unset.
    pub fn client_options(&self) -> ClientOptions {
        let base_url = self
            .endpoint
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        ClientOptions {
            base_url,
            tenant: self
                .tenant
                .company
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            timeout: self.endpoint.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Query-string keys that carry the tenant identifier, in lookup order.
const TENANT_PARAMS: [&str; 2] = ["company", "tenant"];

/// Tenant identifier from a page URL's query string (`?company=acme`).
/// Returns `None` when the URL does not parse or the parameter is absent or blank.
pub fn tenant_from_page_url(page_url: &str) -> Option<String> {
    let url = url::Url::parse(page_url).ok()?;
    TENANT_PARAMS.iter().find_map(|key| {
        url.query_pairs()
            .find(|(k, _)| k == *key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Returns the default config file path: `~/.kb-chat/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".kb-chat").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load config from `path`, or defaults when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        let opts = cfg.client_options();
        assert_eq!(opts.base_url, DEFAULT_BASE_URL);
        assert_eq!(opts.tenant, None);
        assert_eq!(opts.timeout, None);
    }

    #[test]
    fn blank_company_is_unset() {
        let cfg: Config = serde_yaml::from_str("tenant:\n  company: '  '\n").unwrap();
        assert_eq!(cfg.client_options().tenant, None);
    }

    #[test]
    fn tenant_from_query_string() {
        assert_eq!(
            tenant_from_page_url("https://chat.example.com/?company=acme%20corp").as_deref(),
            Some("acme corp")
        );
        assert_eq!(
            tenant_from_page_url("https://chat.example.com/widget?lang=en&tenant=t1").as_deref(),
            Some("t1")
        );
        assert_eq!(tenant_from_page_url("https://chat.example.com/?company="), None);
        assert_eq!(tenant_from_page_url("https://chat.example.com/"), None);
        assert_eq!(tenant_from_page_url("not a url"), None);
    }

    #[test]
    fn timeout_in_seconds() {
        let cfg: Config = serde_yaml::from_str("endpoint:\n  timeout_secs: 30\n").unwrap();
        assert_eq!(cfg.client_options().timeout, Some(Duration::from_secs(30)));
    }
}
