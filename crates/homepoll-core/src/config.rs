// ── Runtime connection configuration ──
//
// These types describe *how* to reach a device and how often to poll it.
// They carry credential data and timing, but never touch disk. The CLI
// constructs an `IntegrationConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::DeviceKind;

/// Upstream calls that take longer than this fail the refresh.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cloud readings only change a few times per hour.
pub const POOLSENSE_UPDATE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub const STEAMIST_UPDATE_INTERVAL: Duration = Duration::from_secs(5);

pub use homepoll_api::poolsense::DEFAULT_BASE_URL as POOLSENSE_BASE_URL;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// How to reach one device and authenticate with it.
#[derive(Debug, Clone)]
pub enum DeviceConfig {
    /// PoolSense cloud account.
    PoolSense {
        email: String,
        password: SecretString,
        base_url: Url,
    },
    /// Steamist controller on the local network.
    Steamist { host: String },
}

impl DeviceConfig {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::PoolSense { .. } => DeviceKind::PoolSense,
            Self::Steamist { .. } => DeviceKind::Steamist,
        }
    }

    /// Stable identifier used to prefix entity unique ids.
    pub fn default_device_id(&self) -> String {
        match self {
            Self::PoolSense { email, .. } => email.to_lowercase(),
            Self::Steamist { host } => host.clone(),
        }
    }
}

/// Polling behaviour of one coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Name used in log lines and errors (e.g. `poolsense`).
    pub name: String,
    /// Gap between scheduled refreshes. `Duration::ZERO` disables
    /// scheduled polling; on-demand refreshes still work.
    pub update_interval: Duration,
    /// Upper bound on a single upstream fetch.
    pub request_timeout: Duration,
}

impl CoordinatorConfig {
    /// Defaults for a device kind: hourly for the cloud monitor,
    /// every five seconds for the local steam controller.
    pub fn for_kind(kind: DeviceKind) -> Self {
        let update_interval = match kind {
            DeviceKind::PoolSense => POOLSENSE_UPDATE_INTERVAL,
            DeviceKind::Steamist => STEAMIST_UPDATE_INTERVAL,
        };
        Self {
            name: kind.to_string(),
            update_interval,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Everything needed to set up one device integration.
///
/// Built by the CLI, passed to [`AnyCoordinator::connect`](crate::AnyCoordinator::connect).
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub device: DeviceConfig,
    pub coordinator: CoordinatorConfig,
    pub tls: TlsVerification,
    /// Prefix for entity unique ids.
    pub device_id: String,
}

impl IntegrationConfig {
    /// Build a config with the kind's default polling behaviour.
    pub fn new(device: DeviceConfig) -> Self {
        let coordinator = CoordinatorConfig::for_kind(device.kind());
        let device_id = device.default_device_id();
        Self {
            device,
            coordinator,
            tls: TlsVerification::default(),
            device_id,
        }
    }
}
