// ── Vendor client abstraction ──
//
// `DeviceClient` is the seam between the coordinator and the raw API
// clients: one async fetch returning a domain status. `AnyCoordinator`
// erases the device kind for consumers that pick it at runtime.

use std::future::Future;
use std::sync::Arc;

use homepoll_api::{PoolSenseClient, SteamistClient, TlsMode, TransportConfig};
use tokio::sync::watch;

use crate::config::{DeviceConfig, IntegrationConfig, TlsVerification};
use crate::coordinator::Coordinator;
use crate::entity::{Entities, EntityPlatform, EntitySnapshot};
use crate::error::{CoreError, UpdateFailed};
use crate::model::{DeviceKind, PoolSenseStatus, SteamistStatus};
use crate::store::UpdateHealth;

/// An upstream client the coordinator can poll.
pub trait DeviceClient: Send + Sync + 'static {
    /// Snapshot produced by one successful fetch.
    type Status: Send + Sync + 'static;

    fn fetch_status(&self) -> impl Future<Output = Result<Self::Status, homepoll_api::Error>> + Send;
}

impl DeviceClient for PoolSenseClient {
    type Status = PoolSenseStatus;

    async fn fetch_status(&self) -> Result<PoolSenseStatus, homepoll_api::Error> {
        self.get_pool_data().await.map(PoolSenseStatus::from)
    }
}

impl DeviceClient for SteamistClient {
    type Status = SteamistStatus;

    async fn fetch_status(&self) -> Result<SteamistStatus, homepoll_api::Error> {
        self.get_status().await.and_then(SteamistStatus::try_from)
    }
}

// ── AnyCoordinator ───────────────────────────────────────────────

/// A coordinator for whichever device kind the configuration names.
#[derive(Clone)]
pub enum AnyCoordinator {
    PoolSense {
        coordinator: Coordinator<PoolSenseClient>,
        entities: Arc<Entities<PoolSenseClient>>,
    },
    Steamist {
        coordinator: Coordinator<SteamistClient>,
        entities: Arc<Entities<SteamistClient>>,
    },
}

impl AnyCoordinator {
    /// Build the vendor client and its coordinator, and set up the
    /// entity tables. Nothing is fetched yet.
    pub fn connect(config: &IntegrationConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.coordinator.request_timeout,
        };

        match &config.device {
            DeviceConfig::PoolSense {
                email,
                password,
                base_url,
            } => {
                let client =
                    PoolSenseClient::new(email.clone(), password.clone(), base_url.clone(), &transport)?;
                let coordinator = Coordinator::new(client, config.coordinator.clone());
                let entities = Arc::new(PoolSenseClient::setup_entities(&coordinator, &config.device_id));
                Ok(Self::PoolSense {
                    coordinator,
                    entities,
                })
            }
            DeviceConfig::Steamist { host } => {
                let client = SteamistClient::new(host, &transport)?;
                let coordinator = Coordinator::new(client, config.coordinator.clone());
                let entities = Arc::new(SteamistClient::setup_entities(&coordinator, &config.device_id));
                Ok(Self::Steamist {
                    coordinator,
                    entities,
                })
            }
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::PoolSense { .. } => DeviceKind::PoolSense,
            Self::Steamist { .. } => DeviceKind::Steamist,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.name(),
            Self::Steamist { coordinator, .. } => coordinator.name(),
        }
    }

    pub async fn first_refresh(&self) -> Result<(), CoreError> {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.first_refresh().await.map(drop),
            Self::Steamist { coordinator, .. } => coordinator.first_refresh().await.map(drop),
        }
    }

    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.refresh().await.map(drop),
            Self::Steamist { coordinator, .. } => coordinator.refresh().await.map(drop),
        }
    }

    pub async fn start(&self) -> Result<(), CoreError> {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.start().await,
            Self::Steamist { coordinator, .. } => coordinator.start().await,
        }
    }

    pub async fn shutdown(&self) {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.shutdown().await,
            Self::Steamist { coordinator, .. } => coordinator.shutdown().await,
        }
    }

    /// Check the configured credentials (PoolSense) or reachability
    /// (Steamist) without touching the cache.
    pub async fn validate(&self) -> Result<bool, CoreError> {
        match self {
            Self::PoolSense { coordinator, .. } => {
                Ok(coordinator.client().test_credentials().await?)
            }
            Self::Steamist { coordinator, .. } => {
                coordinator.client().get_status().await?;
                Ok(true)
            }
        }
    }

    pub fn has_data(&self) -> bool {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.data().is_some(),
            Self::Steamist { coordinator, .. } => coordinator.data().is_some(),
        }
    }

    /// Subscribe to every refresh outcome.
    pub fn health(&self) -> watch::Receiver<UpdateHealth> {
        match self {
            Self::PoolSense { coordinator, .. } => coordinator.health(),
            Self::Steamist { coordinator, .. } => coordinator.health(),
        }
    }

    /// Evaluate every entity against the cached status.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        match self {
            Self::PoolSense { entities, .. } => entities.snapshot(),
            Self::Steamist { entities, .. } => entities.snapshot(),
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_builds_steamist_without_fetching() {
        let config = IntegrationConfig::new(DeviceConfig::Steamist {
            host: "127.0.0.1:9".into(),
        });
        let device = AnyCoordinator::connect(&config).unwrap();

        assert_eq!(device.kind(), DeviceKind::Steamist);
        assert_eq!(device.name(), "steamist");
        assert!(!device.has_data());

        let snapshot = device.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|e| e.value.is_none()));
        assert!(snapshot.iter().any(|e| e.unique_id == "127.0.0.1:9_in_use"));
    }

    #[tokio::test]
    async fn connect_rejects_bad_host() {
        let config = IntegrationConfig::new(DeviceConfig::Steamist {
            host: "not a host".into(),
        });
        let err = AnyCoordinator::connect(&config).err().unwrap();
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
