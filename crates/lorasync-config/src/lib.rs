//! Configuration for the lorasync service.
//!
//! One TOML file layered under defaults and over by `LORASYNC_*`
//! environment variables, plus the translation into the engine's
//! `TenantConfig`, `AssetSettings` and listener `ReconnectPolicy`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lorasync_api::ReconnectPolicy;
use lorasync_core::{AssetSettings, TenantConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for {owner}")]
    NoCredentials { owner: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Port of the HTTP front door.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Where associations are persisted. In memory only when unset.
    #[serde(default)]
    pub association_file: Option<PathBuf>,

    #[serde(default)]
    pub platform: Platform,

    #[serde(default)]
    pub listener: Listener,

    #[serde(default)]
    pub tenants: Vec<Tenant>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            association_file: None,
            platform: Platform::default(),
            listener: Listener::default(),
            tenants: Vec::new(),
        }
    }
}

/// Building-platform connection.
#[derive(Debug, Deserialize, Serialize)]
pub struct Platform {
    /// API base URL, e.g. `https://platform.example/v2`.
    #[serde(default)]
    pub api_endpoint: String,

    /// API key (plaintext; prefer `api_token_env`).
    pub api_token: Option<String>,

    /// Environment variable holding the API key.
    pub api_token_env: Option<String>,

    #[serde(default = "default_root_asset_type")]
    pub root_asset_type: String,

    #[serde(default = "default_root_asset_name")]
    pub root_asset_name: String,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            api_token: None,
            api_token_env: None,
            root_asset_type: default_root_asset_type(),
            root_asset_name: default_root_asset_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Listener {
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

/// One network-server account and the platform projects it serves.
#[derive(Debug, Deserialize, Serialize)]
pub struct Tenant {
    pub id: i64,

    #[serde(default)]
    pub enable: bool,

    pub api_base_url: String,

    /// Bearer token (plaintext; prefer `api_token_env`).
    pub api_token: Option<String>,

    /// Environment variable holding the bearer token.
    pub api_token_env: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Platform user notified about changes made for this tenant.
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub project_ids: Vec<String>,
}

fn default_listen_port() -> u16 {
    3000
}
fn default_root_asset_type() -> String {
    AssetSettings::default().root_asset_type
}
fn default_root_asset_name() -> String {
    AssetSettings::default().root_asset_name
}
fn default_reconnect_delay() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    120
}
fn default_refresh_interval() -> u64 {
    60
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "lorasync", "lorasync").map_or_else(
        || PathBuf::from("lorasync.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load defaults, then `path` (or [`config_path`]), then `LORASYNC_*`
/// environment variables (`__` separates nested keys), and validate.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("LORASYNC_").split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Render a config back to TOML (`config show`).
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Validation ──────────────────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.platform.api_endpoint.is_empty() {
            check_url("platform.api_endpoint", &self.platform.api_endpoint)?;
        }
        if self.platform.root_asset_type.trim().is_empty() {
            return Err(invalid("platform.root_asset_type", "must not be empty"));
        }

        let mut seen = BTreeSet::new();
        for tenant in &self.tenants {
            let field = |name: &str| format!("tenants[{}].{name}", tenant.id);
            if !seen.insert(tenant.id) {
                return Err(invalid(field("id"), "duplicate tenant id"));
            }
            check_url(&field("api_base_url"), &tenant.api_base_url)?;
            if tenant.request_timeout_secs == 0 {
                return Err(invalid(field("request_timeout_secs"), "must be greater than 0"));
            }
        }
        Ok(())
    }

    // ── Translation to engine types ─────────────────────────────────

    /// Every tenant as an engine configuration. `active` starts false;
    /// the engine raises it on first use.
    pub fn tenant_configs(&self) -> Result<Vec<TenantConfig>, ConfigError> {
        self.tenants
            .iter()
            .map(|t| {
                Ok(TenantConfig {
                    id: t.id,
                    enabled: t.enable,
                    active: false,
                    api_base_url: t.api_base_url.clone(),
                    api_token: resolve_token(
                        t.api_token.as_deref(),
                        t.api_token_env.as_deref(),
                        &format!("tenant {}", t.id),
                    )?,
                    request_timeout: Duration::from_secs(t.request_timeout_secs),
                    refresh_interval: Duration::from_secs(t.refresh_interval_secs),
                    user_id: t.user_id.clone(),
                    project_ids: t.project_ids.iter().cloned().collect(),
                })
            })
            .collect()
    }

    /// The platform endpoint and key. Only `serve` and `upsert-device`
    /// need these, so they are checked here rather than in `validate`.
    pub fn platform_credentials(&self) -> Result<(String, SecretString), ConfigError> {
        if self.platform.api_endpoint.is_empty() {
            return Err(invalid("platform.api_endpoint", "must be set"));
        }
        let token = resolve_token(
            self.platform.api_token.as_deref(),
            self.platform.api_token_env.as_deref(),
            "the platform",
        )?;
        Ok((self.platform.api_endpoint.clone(), token))
    }

    pub fn asset_settings(&self) -> AssetSettings {
        AssetSettings {
            root_asset_type: self.platform.root_asset_type.clone(),
            root_asset_name: self.platform.root_asset_name.clone(),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_secs(self.listener.reconnect_delay_secs),
        }
    }
}

fn check_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    raw.parse::<url::Url>()
        .map(|_| ())
        .map_err(|e| invalid(field, format!("invalid URL '{raw}': {e}")))
}

// ── Credential resolution ───────────────────────────────────────────

/// Named environment variable first, then the plaintext value.
fn resolve_token(
    plaintext: Option<&str>,
    env_name: Option<&str>,
    owner: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Ok(SecretString::from(val));
    }
    if let Some(val) = plaintext.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(val.to_owned()));
    }
    Err(ConfigError::NoCredentials {
        owner: owner.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn write(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"
        listen_port = 8080
        association_file = "/var/lib/lorasync/associations.json"

        [platform]
        api_endpoint = "https://platform.example/v2"
        api_token = "platform-key"

        [[tenants]]
        id = 1
        enable = true
        api_base_url = "https://eu1.loriot.io"
        api_token = "tenant-token"
        user_id = "90"
        project_ids = ["P1", "P2"]

        [[tenants]]
        id = 2
        api_base_url = "https://us1.loriot.io"
        api_token = "other"
        request_timeout_secs = 10
    "#;

    #[test]
    fn loads_file_over_defaults() {
        let file = write(SAMPLE);
        let cfg = load_config(Some(file.path())).unwrap();

        assert_eq!(cfg.listen_port, 8080);
        assert_eq!(cfg.listener.reconnect_delay_secs, 5);
        assert_eq!(cfg.platform.root_asset_type, "lorasync_root");
        assert_eq!(cfg.reconnect_policy().delay, Duration::from_secs(5));

        let tenants = cfg.tenant_configs().unwrap();
        assert_eq!(tenants.len(), 2);
        assert!(tenants[0].enabled);
        assert!(!tenants[0].active);
        assert_eq!(tenants[0].request_timeout, Duration::from_secs(120));
        assert_eq!(tenants[0].api_token.expose_secret(), "tenant-token");
        assert!(tenants[0].applies_to("P2"));
        assert!(!tenants[1].enabled);
        assert_eq!(tenants[1].request_timeout, Duration::from_secs(10));

        let (endpoint, key) = cfg.platform_credentials().unwrap();
        assert_eq!(endpoint, "https://platform.example/v2");
        assert_eq!(key.expose_secret(), "platform-key");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg.listen_port, 3000);
        assert!(cfg.tenants.is_empty());
        assert!(cfg.platform_credentials().is_err());
    }

    #[test]
    fn duplicate_tenant_ids_are_rejected() {
        let file = write(
            r#"
            [[tenants]]
            id = 1
            api_base_url = "https://eu1.loriot.io"
            [[tenants]]
            id = 1
            api_base_url = "https://eu2.loriot.io"
            "#,
        );
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("duplicate tenant id"));
    }

    #[test]
    fn bad_url_and_zero_timeout_are_rejected() {
        let file = write(
            r#"
            [[tenants]]
            id = 4
            api_base_url = "not a url"
            "#,
        );
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("tenants[4].api_base_url"));

        let file = write(
            r#"
            [[tenants]]
            id = 5
            api_base_url = "https://eu1.loriot.io"
            request_timeout_secs = 0
            "#,
        );
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn tenant_without_token_is_an_error() {
        let file = write(
            r#"
            [[tenants]]
            id = 6
            api_base_url = "https://eu1.loriot.io"
            "#,
        );
        let cfg = load_config(Some(file.path())).unwrap();
        assert!(matches!(
            cfg.tenant_configs(),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn renders_back_to_toml() {
        let file = write(SAMPLE);
        let cfg = load_config(Some(file.path())).unwrap();
        let rendered = to_toml(&cfg).unwrap();
        assert!(rendered.contains("listen_port = 8080"));
        assert!(rendered.contains("[[tenants]]"));
    }
}
