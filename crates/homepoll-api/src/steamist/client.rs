// Steamist HTTP client
//
// Single-endpoint client: `GET http://{host}/status.xml`.

use std::time::Duration;

use tracing::debug;
use url::Url;

use super::models::SteamistStatusResponse;
use crate::error::Error;
use crate::transport::{TransportConfig, check_status, map_transport};

const STATUS_PATH: &str = "status.xml";

/// Raw HTTP client for a Steamist controller on the local network.
pub struct SteamistClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl SteamistClient {
    /// Create a client for the controller at `host` (`ip` or `ip:port`).
    pub fn new(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, host, transport.timeout)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, host: &str, timeout: Duration) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}/"))?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// The controller root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host (and port, if non-default) of the controller.
    pub fn host(&self) -> String {
        match (self.base_url.host_str(), self.base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => String::new(),
        }
    }

    /// Fetch the controller's current status page.
    pub async fn get_status(&self) -> Result<SteamistStatusResponse, Error> {
        let url = self.base_url.join(STATUS_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        let body = check_status(resp)
            .await?
            .text()
            .await
            .map_err(Error::Transport)?;

        parse_status(&body)
    }
}

pub(crate) fn parse_status(body: &str) -> Result<SteamistStatusResponse, Error> {
    quick_xml::de::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_document() {
        let body = "<response><units>C</units><temp0>43</temp0><tmr0>12</tmr0><active>1</active></response>";
        let status = parse_status(body).unwrap();
        assert_eq!(status.units, "C");
        assert_eq!(status.temp0, 43);
        assert_eq!(status.tmr0, 12);
        assert!(status.is_active());
    }

    #[test]
    fn ignores_unknown_elements() {
        let body = "<response><units>F</units><temp0>110</temp0><tmr0>0</tmr0>\
                    <active>0</active><led0>1</led0></response>";
        let status = parse_status(body).unwrap();
        assert!(!status.is_active());
        assert_eq!(status.temp0, 110);
    }

    #[test]
    fn rejects_truncated_document() {
        let err = parse_status("<response><units>F</units>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn host_round_trips_port() {
        let client = SteamistClient::with_client(
            reqwest::Client::new(),
            "192.168.1.50:8080",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.host(), "192.168.1.50:8080");
        assert_eq!(client.base_url().as_str(), "http://192.168.1.50:8080/");
    }
}
