//! Profile configuration for homepoll.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `homepoll_core::IntegrationConfig`. The CLI layers
//! its global flags on top of what this crate produces.

use std::collections::BTreeMap;
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

use homepoll_core::config::{DEFAULT_REQUEST_TIMEOUT, POOLSENSE_BASE_URL};
use homepoll_core::{CoordinatorConfig, DeviceConfig, DeviceKind, IntegrationConfig, TlsVerification};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "homepoll";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "HOMEPOLL_CONFIG";

/// Password fallback consulted after a profile's `password_env`.
pub const PASSWORD_ENV: &str = "HOMEPOLL_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, or the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

/// A named device profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Which integration this profile drives.
    pub kind: DeviceKind,

    /// PoolSense account email.
    pub email: Option<String>,

    /// PoolSense password (plaintext, prefer keyring).
    pub password: Option<String>,

    /// Environment variable holding the PoolSense password.
    pub password_env: Option<String>,

    /// PoolSense API base URL override.
    pub base_url: Option<String>,

    /// Steamist host (`ip` or `ip:port`).
    pub host: Option<String>,

    /// Stable id used as the entity unique-id prefix.
    pub device_id: Option<String>,

    /// Poll interval override in seconds; `0` disables scheduled polling.
    pub update_interval: Option<u64>,

    /// Request timeout override in seconds.
    pub timeout: Option<u64>,

    pub insecure: Option<bool>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Profile {
    /// An empty profile of the given kind.
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            email: None,
            password: None,
            password_env: None,
            base_url: None,
            host: None,
            device_id: None,
            update_interval: None,
            timeout: None,
            insecure: None,
            ca_cert: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `HOMEPOLL_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "homepoll", "homepoll").map_or_else(
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
    p.push("homepoll");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layering `HOMEPOLL_` env vars on top.
///
/// Nested keys use a double underscore: `HOMEPOLL_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("HOMEPOLL_")
                .ignore(&["config", "password", "profile", "output"])
                .split("__"),
        );

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

/// Resolve the PoolSense password: `password_env` → `HOMEPOLL_PASSWORD`
/// → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_from(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_password_from(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    profile
        .password_env
        .as_deref()
        .and_then(&env)
        .or_else(|| env(PASSWORD_ENV))
        .or_else(|| keyring(&keyring_user(profile_name)))
        .or_else(|| profile.password.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

// ── Profile → IntegrationConfig ─────────────────────────────────────

/// Build an `IntegrationConfig` from a profile, with no CLI overrides.
pub fn profile_to_integration_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<IntegrationConfig, ConfigError> {
    build_integration_config(profile, profile_name, resolve_password)
}

fn build_integration_config(
    profile: &Profile,
    profile_name: &str,
    password: impl FnOnce(&Profile, &str) -> Result<SecretString, ConfigError>,
) -> Result<IntegrationConfig, ConfigError> {
    let device = match profile.kind {
        DeviceKind::PoolSense => {
            let email = profile
                .email
                .clone()
                .filter(|e| !e.is_empty())
                .ok_or_else(|| ConfigError::NoCredentials {
                    profile: profile_name.into(),
                })?;
            let raw = profile.base_url.as_deref().unwrap_or(POOLSENSE_BASE_URL);
            let base_url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
                field: "base_url".into(),
                reason: format!("invalid URL: {raw}"),
            })?;
            DeviceConfig::PoolSense {
                email,
                password: password(profile, profile_name)?,
                base_url,
            }
        }
        DeviceKind::Steamist => {
            let host = profile
                .host
                .clone()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| ConfigError::Validation {
                    field: "host".into(),
                    reason: format!("profile '{profile_name}' has no host"),
                })?;
            DeviceConfig::Steamist { host }
        }
    };

    let mut coordinator = CoordinatorConfig::for_kind(profile.kind);
    coordinator.name = profile_name.to_owned();
    if let Some(secs) = profile.update_interval {
        coordinator.update_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.timeout {
        coordinator.request_timeout = Duration::from_secs(secs);
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let device_id = profile
        .device_id
        .clone()
        .unwrap_or_else(|| device.default_device_id());

    Ok(IntegrationConfig {
        device,
        coordinator,
        tls,
        device_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn steamist() -> Profile {
        Profile {
            host: Some("192.168.1.40".into()),
            ..Profile::new(DeviceKind::Steamist)
        }
    }

    fn poolsense() -> Profile {
        Profile {
            email: Some("Owner@Example.com".into()),
            password: Some("plain".into()),
            ..Profile::new(DeviceKind::PoolSense)
        }
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("shower".into(), steamist());
        cfg.profiles.insert("pool".into(), poolsense());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn parses_handwritten_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "shower"

[profiles.shower]
kind = "steamist"
host = "10.0.0.9"
update_interval = 15
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "shower");
        assert_eq!(profile.kind, DeviceKind::Steamist);
        assert_eq!(profile.update_interval, Some(15));
        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn password_chain_order() {
        let mut profile = poolsense();
        profile.password_env = Some("POOL_PW".into());

        let env = |name: &str| (name == "POOL_PW").then(|| "from-env".to_owned());
        let pw = resolve_password_from(&profile, "pool", env, |_| None).unwrap();
        assert_eq!(pw.expose_secret(), "from-env");

        let global = |name: &str| (name == PASSWORD_ENV).then(|| "global".to_owned());
        let pw = resolve_password_from(&profile, "pool", global, |_| None).unwrap();
        assert_eq!(pw.expose_secret(), "global");

        let keyring = |user: &str| (user == "pool/password").then(|| "stored".to_owned());
        let pw = resolve_password_from(&profile, "pool", |_| None, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "stored");

        let pw = resolve_password_from(&profile, "pool", |_| None, |_| None).unwrap();
        assert_eq!(pw.expose_secret(), "plain");

        profile.password = None;
        assert!(matches!(
            resolve_password_from(&profile, "pool", |_| None, |_| None),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn steamist_profile_to_integration_config() {
        let mut profile = steamist();
        profile.update_interval = Some(0);
        profile.timeout = Some(3);

        let cfg = profile_to_integration_config(&profile, "shower").unwrap();
        assert_eq!(cfg.device.kind(), DeviceKind::Steamist);
        assert_eq!(cfg.device_id, "192.168.1.40");
        assert_eq!(cfg.coordinator.name, "shower");
        assert_eq!(cfg.coordinator.update_interval, Duration::ZERO);
        assert_eq!(cfg.coordinator.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn poolsense_profile_uses_default_base_url() {
        let cfg = build_integration_config(&poolsense(), "pool", |_, _| {
            Ok(SecretString::from("pw".to_owned()))
        })
        .unwrap();

        let DeviceConfig::PoolSense { email, base_url, .. } = &cfg.device else {
            panic!("expected a PoolSense device");
        };
        assert_eq!(email, "Owner@Example.com");
        assert_eq!(base_url.as_str(), POOLSENSE_BASE_URL);
        assert_eq!(cfg.device_id, "owner@example.com");
        assert_eq!(cfg.coordinator.update_interval, Duration::from_secs(3600));
    }

    #[test]
    fn missing_host_is_a_validation_error() {
        let err = profile_to_integration_config(&Profile::new(DeviceKind::Steamist), "x").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "host"));
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let mut profile = steamist();
        profile.insecure = Some(true);
        profile.ca_cert = Some("/tmp/ca.pem".into());
        let cfg = profile_to_integration_config(&profile, "shower").unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }
}
