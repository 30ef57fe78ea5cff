//! Configuration for the wxsync daemon.
//!
//! TOML file + `WXSYNC_` environment layering, secret resolution
//! (env var + keyring + plaintext), and translation into the clients and
//! `wxsync_core::EngineConfig` the engine runs with.

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

use wxsync_api::{AppCredentials, TlsMode, TransportConfig};
use wxsync_core::{EngineConfig, NetworkInfo};

/// Keyring service all secrets are stored under.
pub const KEYRING_SERVICE: &str = "wxsync";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured")]
    NoCredentials { what: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub vendor: VendorSection,

    #[serde(default)]
    pub platform: PlatformSection,

    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub defaults: Defaults,
}

/// Netatmo application and account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorSection {
    #[serde(default = "default_vendor_url")]
    pub base_url: String,

    pub client_id: Option<String>,

    /// Client secret (plaintext; prefer keyring or env var).
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    pub client_secret_env: Option<String>,

    pub username: Option<String>,

    /// Account password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for VendorSection {
    fn default() -> Self {
        Self {
            base_url: default_vendor_url(),
            client_id: None,
            client_secret: None,
            client_secret_env: None,
            username: None,
            password: None,
            password_env: None,
            scope: default_scope(),
        }
    }
}

/// UDM platform endpoint and session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformSection {
    #[serde(default = "default_platform_url")]
    pub base_url: String,

    /// Session token (plaintext; prefer keyring or env var).
    pub session: Option<String>,

    /// Environment variable name containing the session token.
    pub session_env: Option<String>,
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            base_url: default_platform_url(),
            session: None,
            session_env: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncSection {
    /// Platform network name. Defaults to the description document's name.
    pub network_name: Option<String>,

    /// JSON description document replacing the built-in one.
    pub network_info: Option<PathBuf>,

    #[serde(default = "default_fallback_delay")]
    pub fallback_delay_secs: u64,

    #[serde(default = "default_fallback_passes")]
    pub max_fallback_passes: u32,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            network_name: None,
            network_info: None,
            fallback_delay_secs: default_fallback_delay(),
            max_fallback_passes: default_fallback_passes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_vendor_url() -> String {
    wxsync_api::netatmo::client::DEFAULT_BASE_URL.into()
}
fn default_platform_url() -> String {
    wxsync_api::udm::client::DEFAULT_BASE_URL.into()
}
fn default_scope() -> String {
    "read_station".into()
}
fn default_fallback_delay() -> u64 {
    EngineConfig::DEFAULT_FALLBACK_DELAY.as_secs()
}
fn default_fallback_passes() -> u32 {
    EngineConfig::DEFAULT_MAX_FALLBACK_PASSES
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "wxsync", "wxsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wxsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys nest with a double underscore:
/// `WXSYNC_VENDOR__CLIENT_ID` sets `vendor.client_id`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WXSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// The config with every plaintext secret masked, as TOML.
pub fn render_redacted(config: &Config) -> Result<String, ConfigError> {
    let mut masked = config.clone();
    for secret in [
        &mut masked.vendor.client_secret,
        &mut masked.vendor.password,
        &mut masked.platform.session,
    ] {
        if secret.is_some() {
            *secret = Some(REDACTED.into());
        }
    }
    Ok(toml::to_string_pretty(&masked)?)
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve one secret: named env var, then keyring entry, then plaintext.
pub fn resolve_secret(
    env_name: Option<&str>,
    keyring_user: &str,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Env var named in the config
    if let Some(value) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(value));
    }

    // 2. System keyring
    let stored = keyring::Entry::new(KEYRING_SERVICE, keyring_user)
        .and_then(|entry| entry.get_password())
        .ok();
    if let Some(value) = stored {
        return Some(SecretString::from(value));
    }

    // 3. Plaintext in config
    plaintext.map(|value| SecretString::from(value.to_owned()))
}

/// Netatmo OAuth application plus account credentials.
pub fn resolve_app_credentials(vendor: &VendorSection) -> Result<AppCredentials, ConfigError> {
    let client_id = required(vendor.client_id.as_deref(), "vendor.client_id")?;
    let username = required(vendor.username.as_deref(), "vendor.username")?;

    let client_secret = resolve_secret(
        vendor.client_secret_env.as_deref(),
        "vendor/client-secret",
        vendor.client_secret.as_deref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        what: "Netatmo client secret".into(),
    })?;

    let password = resolve_secret(
        vendor.password_env.as_deref(),
        &format!("vendor/{username}"),
        vendor.password.as_deref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        what: format!("Netatmo password for {username}"),
    })?;

    Ok(AppCredentials {
        client_id,
        client_secret,
        username,
        password,
        scope: vendor.scope.clone(),
    })
}

/// The platform session token.
pub fn resolve_session(platform: &PlatformSection) -> Result<SecretString, ConfigError> {
    resolve_secret(
        platform.session_env.as_deref(),
        "platform/session",
        platform.session.as_deref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        what: "UDM session".into(),
    })
}

fn required(value: Option<&str>, field: &str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ConfigError::Validation {
            field: field.into(),
            reason: "missing".into(),
        })
}

fn validate_url(raw: &str, field: &str) -> Result<(), ConfigError> {
    raw.parse::<url::Url>()
        .map(|_| ())
        .map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: format!("invalid URL '{raw}': {e}"),
        })
}

// ── Translation ─────────────────────────────────────────────────────

/// Everything the daemon needs, fully resolved.
#[derive(Debug)]
pub struct Settings {
    pub vendor_url: String,
    pub app: AppCredentials,
    pub platform_url: String,
    pub session: SecretString,
    pub transport: TransportConfig,
    pub engine: EngineConfig,
}

/// HTTP transport from the `[defaults]` section.
pub fn transport_config(defaults: &Defaults) -> TransportConfig {
    let tls = if defaults.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = defaults.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(defaults.timeout),
    }
}

/// Engine settings from the `[sync]` section.
pub fn engine_config(sync: &SyncSection) -> Result<EngineConfig, ConfigError> {
    let info = match sync.network_info {
        Some(ref path) => NetworkInfo::from_file(path),
        None => NetworkInfo::builtin(),
    }
    .map_err(|e| ConfigError::Validation {
        field: "sync.network_info".into(),
        reason: e.to_string(),
    })?;

    let mut engine = EngineConfig::new(info);
    if let Some(name) = sync.network_name.as_deref().filter(|n| !n.trim().is_empty()) {
        engine.network_name = name.to_owned();
    }
    engine.fallback_delay = Duration::from_secs(sync.fallback_delay_secs);
    engine.max_fallback_passes = sync.max_fallback_passes;
    Ok(engine)
}

/// Resolve secrets and validate the whole config.
pub fn resolve(config: &Config) -> Result<Settings, ConfigError> {
    validate_url(&config.vendor.base_url, "vendor.base_url")?;
    validate_url(&config.platform.base_url, "platform.base_url")?;

    Ok(Settings {
        vendor_url: config.vendor.base_url.clone(),
        app: resolve_app_credentials(&config.vendor)?,
        platform_url: config.platform.base_url.clone(),
        session: resolve_session(&config.platform)?,
        transport: transport_config(&config.defaults),
        engine: engine_config(&config.sync)?,
    })
}
