//! Polling and caching layer between `homepoll-api` and consumers (CLI).
//!
//! - **[`Coordinator`]**: owns one vendor client, refreshes it on a fixed
//!   interval or on demand under a bounded timeout, and caches the last
//!   successful status. Concurrent refresh requests coalesce into the one
//!   already in flight. Failures surface as a single [`UpdateFailed`].
//!
//! - **[`StatusStore`]**: `watch`-channel backed cache holding the latest
//!   snapshot plus refresh health. Readers never block.
//!
//! - **[`StatusStream<S>`]**: subscription handle vended by the store.
//!
//! - **Entities** ([`entity`]): static descriptor tables mapping a key and
//!   display metadata to a pure `status -> value` extractor, and the
//!   sensor entities that evaluate them against the cached status.
//!
//! - **Domain model** ([`model`]): `PoolSenseStatus`, `SteamistStatus`.

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod device;
pub mod entity;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, DeviceConfig, IntegrationConfig, TlsVerification};
pub use coordinator::Coordinator;
pub use device::{AnyCoordinator, DeviceClient};
pub use entity::{
    BinarySensorDescriptor, BinarySensorDeviceClass, BinarySensorEntity, DescriptorInfo, Entities,
    EntityKind, EntityPlatform, EntitySnapshot, SensorDescriptor, SensorDeviceClass, SensorEntity,
    SensorValue,
};
pub use error::{CoreError, UpdateFailed};
pub use store::{StatusStore, UpdateHealth};
pub use stream::StatusStream;

pub use model::{DeviceKind, PoolSenseStatus, SteamistStatus, TemperatureUnit};
