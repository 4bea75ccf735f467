//! CLI configuration: thin wrapper around `homepoll_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--profile`, `--timeout`, `--insecure`).

use std::time::Duration;

use homepoll_core::{IntegrationConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use homepoll_config::{
    Config, Defaults, Profile, config_path, load_config, load_config_or_default, save_config,
    store_password,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Load the config file and build the active profile's `IntegrationConfig`.
pub fn build_integration_config(global: &GlobalOpts) -> Result<IntegrationConfig, CliError> {
    let path = config_path();
    if !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }

    let cfg = load_config()?;
    let (profile_name, profile) = cfg
        .profile(global.profile.as_deref())
        .map_err(|_| CliError::ProfileNotFound {
            name: active_profile_name(global, &cfg),
            available: available_profiles(&cfg),
        })?;

    resolve_profile(profile, profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into an `IntegrationConfig`.
///
/// Flag overrides take priority over profile values, which take priority
/// over `[defaults]`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<IntegrationConfig, CliError> {
    let mut config = homepoll_config::profile_to_integration_config(profile, profile_name)?;

    let timeout = global.timeout.or(profile.timeout).unwrap_or(defaults.timeout);
    config.coordinator.request_timeout = Duration::from_secs(timeout);

    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }

    Ok(config)
}
