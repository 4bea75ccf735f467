// ── Core error types ──
//
// Consumers never see HTTP status codes or payload decoding failures
// directly. A refresh attempt either succeeds or yields one `UpdateFailed`;
// setup-time problems (bad URL, unreadable CA file) become `CoreError`.

use std::sync::Arc;

use thiserror::Error;

/// A refresh attempt did not produce a new status.
///
/// `Clone` so the outcome of one in-flight refresh can be handed to every
/// caller that coalesced onto it.
#[derive(Debug, Clone, Error)]
pub enum UpdateFailed {
    /// The vendor client reported an error.
    #[error("{device} query did not complete: {source}")]
    Fetch {
        device: String,
        source: Arc<homepoll_api::Error>,
    },

    /// The vendor client did not answer within the configured timeout.
    #[error("{device} query timed out after {timeout_secs}s")]
    Timeout { device: String, timeout_secs: u64 },

    /// The coordinator was shut down; no further fetches are made.
    #[error("{device} has been shut down")]
    Shutdown { device: String },
}

impl UpdateFailed {
    /// Name of the coordinator whose refresh failed.
    pub fn device(&self) -> &str {
        match self {
            Self::Fetch { device, .. }
            | Self::Timeout { device, .. }
            | Self::Shutdown { device } => device,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout_secs().is_some()
    }

    /// The timeout that elapsed, whether enforced here or by the client.
    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            Self::Timeout { timeout_secs, .. } => Some(*timeout_secs),
            Self::Fetch { source, .. } => match **source {
                homepoll_api::Error::Timeout { timeout_secs } => Some(timeout_secs),
                _ => None,
            },
            Self::Shutdown { .. } => None,
        }
    }

    /// Returns `true` if the vendor rejected the configured credentials.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => source.is_auth_error(),
            Self::Timeout { .. } | Self::Shutdown { .. } => false,
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Refresh errors ───────────────────────────────────────────────
    #[error(transparent)]
    UpdateFailed(#[from] UpdateFailed),

    /// The first refresh failed, so there is nothing to expose yet.
    #[error("{name} is not ready: {source}")]
    NotReady {
        name: String,
        #[source]
        source: UpdateFailed,
    },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Coordinator {name} has been shut down")]
    Shutdown { name: String },

    // ── Setup errors ─────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot reach device: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<homepoll_api::Error> for CoreError {
    fn from(err: homepoll_api::Error) -> Self {
        match err {
            homepoll_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            homepoll_api::Error::Transport(ref e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            homepoll_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            homepoll_api::Error::Timeout { timeout_secs } => CoreError::ConnectionFailed {
                reason: format!("timed out after {timeout_secs}s"),
            },
            homepoll_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            homepoll_api::Error::Vendor { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            homepoll_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected payload: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_reports_device_and_cause() {
        let err = UpdateFailed::Fetch {
            device: "poolsense".into(),
            source: Arc::new(homepoll_api::Error::Authentication {
                message: "bad password".into(),
            }),
        };
        assert_eq!(err.device(), "poolsense");
        assert!(err.is_auth_error());
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("bad password"));
    }

    #[test]
    fn client_side_timeout_counts_as_timeout() {
        let err = UpdateFailed::Fetch {
            device: "steamist".into(),
            source: Arc::new(homepoll_api::Error::Timeout { timeout_secs: 5 }),
        };
        assert!(err.is_timeout());
    }

    #[test]
    fn shutdown_is_neither_timeout_nor_auth() {
        let err = UpdateFailed::Shutdown {
            device: "steamist".into(),
        };
        assert_eq!(err.device(), "steamist");
        assert!(!err.is_timeout());
        assert!(!err.is_auth_error());
    }
}
