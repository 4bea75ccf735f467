//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use homepoll_config::ConfigError;
use homepoll_core::{CoreError, UpdateFailed};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device ───────────────────────────────────────────────────────
    #[error("Could not query {device}: {reason}")]
    #[diagnostic(
        code(homepoll::connection_failed),
        help(
            "Check that the device (or the PoolSense cloud) is reachable.\n\
             Run with -v for request details."
        )
    )]
    ConnectionFailed { device: String, reason: String },

    #[error("{device} did not answer within {seconds}s")]
    #[diagnostic(
        code(homepoll::timeout),
        help("Increase the timeout with --timeout or check the device.")
    )]
    Timeout { device: String, seconds: u64 },

    #[error("Device API error: {message}")]
    #[diagnostic(code(homepoll::api_error))]
    ApiError { message: String },

    #[error("Coordinator {name} has been shut down")]
    #[diagnostic(code(homepoll::shutdown))]
    Shutdown { name: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(homepoll::auth_failed),
        help(
            "Verify the PoolSense email and password.\n\
             Run: homepoll config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(homepoll::no_credentials),
        help(
            "Configure credentials with: homepoll config init\n\
             Or set the HOMEPOLL_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(homepoll::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: homepoll config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(homepoll::no_config),
        help(
            "Create one with: homepoll config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(homepoll::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(homepoll::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<UpdateFailed> for CliError {
    fn from(err: UpdateFailed) -> Self {
        let device = err.device().to_owned();
        if matches!(err, UpdateFailed::Shutdown { .. }) {
            return CliError::Shutdown { name: device };
        }
        if err.is_auth_error() {
            return CliError::AuthFailed {
                message: err.to_string(),
            };
        }
        match err.timeout_secs() {
            Some(seconds) => CliError::Timeout { device, seconds },
            None => CliError::ConnectionFailed {
                device,
                reason: err.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UpdateFailed(e) | CoreError::NotReady { source: e, .. } => e.into(),
            CoreError::Shutdown { name } => CliError::Shutdown { name },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed {
                device: "device".into(),
                reason,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Api { message, .. } => CliError::ApiError { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_after_shutdown_maps_to_shutdown() {
        let err: CliError = UpdateFailed::Shutdown {
            device: "shower".into(),
        }
        .into();
        assert!(matches!(err, CliError::Shutdown { ref name } if name == "shower"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn timeouts_get_their_own_exit_code() {
        let err: CliError = UpdateFailed::Timeout {
            device: "shower".into(),
            timeout_secs: 10,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
    }
}
