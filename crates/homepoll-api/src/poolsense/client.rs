// PoolSense HTTP client
//
// Wraps `reqwest::Client` with login, token header injection, and
// status/body error mapping. The caller only ever sees decoded payloads.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::models::{LoginResponse, PoolSenseData};
use crate::error::Error;
use crate::transport::{TransportConfig, check_status, map_transport};

/// Production endpoint of the PoolSense cloud.
pub const DEFAULT_BASE_URL: &str = "https://api.poolsense.net/api/v1/";

/// Raw HTTP client for the PoolSense cloud API.
pub struct PoolSenseClient {
    http: reqwest::Client,
    base_url: Url,
    email: String,
    password: SecretString,
    timeout: Duration,
}

impl PoolSenseClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is normally [`DEFAULT_BASE_URL`]; a trailing slash is
    /// added if missing so relative endpoint paths join underneath it.
    pub fn new(
        email: impl Into<String>,
        password: SecretString,
        base_url: Url,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            email,
            password,
            base_url,
            transport.timeout,
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        email: impl Into<String>,
        password: SecretString,
        base_url: Url,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            email: email.into(),
            password,
            timeout,
        }
    }

    /// The API root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Exchange the account credentials for a session token.
    pub async fn login(&self) -> Result<String, Error> {
        let url = self.base_url.join("users/login")?;
        debug!("POST {}", url);

        let body = json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let login: LoginResponse = decode(resp).await?;
        login
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "login response carried no token".into(),
            })
    }

    /// Check whether the configured credentials are accepted.
    ///
    /// Rejected credentials yield `Ok(false)`; transport failures still
    /// propagate so callers can tell "wrong password" from "offline".
    pub async fn test_credentials(&self) -> Result<bool, Error> {
        match self.login().await {
            Ok(_) => Ok(true),
            Err(Error::Authentication { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Log in and fetch the latest readings of the account's sensor.
    pub async fn get_pool_data(&self) -> Result<PoolSenseData, Error> {
        let token = self.login().await?;

        let url = self.base_url.join("sensors/details")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        decode(check_status(resp).await?).await
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
