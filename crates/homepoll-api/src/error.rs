use thiserror::Error;

/// Top-level error type for the `homepoll-api` crate.
///
/// Covers every failure mode of the vendor clients: authentication,
/// transport, vendor-reported HTTP errors, and payload decoding.
/// `homepoll-core` folds these into its single update-failed signal.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, missing token).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Vendor ──────────────────────────────────────────────────────
    /// Non-success HTTP status returned by the device or cloud API.
    #[error("Vendor API error (HTTP {status}): {message}")]
    Vendor { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Payload decoding failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credentials were rejected and retrying
    /// with the same credentials will not help.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Vendor { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Vendor { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_5xx_is_transient() {
        let err = Error::Vendor {
            status: 503,
            message: "maintenance".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_auth_error());
    }

    #[test]
    fn vendor_401_is_auth_error() {
        let err = Error::Vendor {
            status: 401,
            message: "unauthorized".into(),
        };
        assert!(err.is_auth_error());
        assert!(!err.is_transient());
    }

    #[test]
    fn deserialization_is_permanent() {
        let err = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert!(!err.is_transient());
        assert!(!err.is_auth_error());
    }
}
