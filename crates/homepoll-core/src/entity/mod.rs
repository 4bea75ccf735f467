// ── Sensor entities ──
//
// Declarative descriptor tables plus the entities that evaluate them
// against a coordinator's cached status. Extractors are plain `fn`
// pointers: pure, synchronous, and evaluated on every read.

pub mod poolsense;
pub mod steamist;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::coordinator::Coordinator;
use crate::device::DeviceClient;
use crate::model::DeviceKind;

// ── Values & classes ─────────────────────────────────────────────

/// A single reading exposed by an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(v) => f.write_str(&v.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorDeviceClass {
    Battery,
    Duration,
    Temperature,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Problem,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Sensor,
    BinarySensor,
}

// ── Descriptors ──────────────────────────────────────────────────

/// Static description of a value sensor.
pub struct SensorDescriptor<S> {
    /// Stable key, unique within a device.
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<SensorDeviceClass>,
    /// Fixed unit of measurement.
    pub unit: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub value_fn: fn(&S) -> Option<SensorValue>,
    /// Unit derived from the status; overrides `unit` once data exists.
    pub unit_fn: Option<fn(&S) -> &'static str>,
}

/// Static description of an on/off sensor.
pub struct BinarySensorDescriptor<S> {
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<BinarySensorDeviceClass>,
    pub icon: Option<&'static str>,
    pub value_fn: fn(&S) -> Option<bool>,
}

/// Kind-erased descriptor metadata, for listing tables without a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub kind: EntityKind,
    pub device_class: Option<String>,
    pub unit: Option<&'static str>,
    pub icon: Option<&'static str>,
}

impl<S> From<&SensorDescriptor<S>> for DescriptorInfo {
    fn from(d: &SensorDescriptor<S>) -> Self {
        Self {
            key: d.key,
            name: d.name,
            kind: EntityKind::Sensor,
            device_class: d.device_class.map(|c| c.to_string()),
            unit: d.unit,
            icon: d.icon,
        }
    }
}

impl<S> From<&BinarySensorDescriptor<S>> for DescriptorInfo {
    fn from(d: &BinarySensorDescriptor<S>) -> Self {
        Self {
            key: d.key,
            name: d.name,
            kind: EntityKind::BinarySensor,
            device_class: d.device_class.map(|c| c.to_string()),
            unit: None,
            icon: d.icon,
        }
    }
}

/// Every descriptor a device kind exposes, sensors first.
pub fn descriptors(kind: DeviceKind) -> Vec<DescriptorInfo> {
    fn collect<S>(
        sensors: &[SensorDescriptor<S>],
        binary: &[BinarySensorDescriptor<S>],
    ) -> Vec<DescriptorInfo> {
        sensors
            .iter()
            .map(DescriptorInfo::from)
            .chain(binary.iter().map(DescriptorInfo::from))
            .collect()
    }

    match kind {
        DeviceKind::PoolSense => collect(poolsense::SENSORS, poolsense::BINARY_SENSORS),
        DeviceKind::Steamist => collect(steamist::SENSORS, steamist::BINARY_SENSORS),
    }
}

// ── Platform wiring ──────────────────────────────────────────────

/// Binds a client type to the descriptor tables of its integration.
pub trait EntityPlatform: DeviceClient + Sized {
    const SENSORS: &'static [SensorDescriptor<Self::Status>];
    const BINARY_SENSORS: &'static [BinarySensorDescriptor<Self::Status>];

    /// Create one entity per descriptor, all reading from `coordinator`.
    fn setup_entities(coordinator: &Coordinator<Self>, device_id: &str) -> Entities<Self> {
        Entities {
            sensors: Self::SENSORS
                .iter()
                .map(|d| SensorEntity::new(coordinator.clone(), device_id, d))
                .collect(),
            binary_sensors: Self::BINARY_SENSORS
                .iter()
                .map(|d| BinarySensorEntity::new(coordinator.clone(), device_id, d))
                .collect(),
        }
    }
}

/// All entities of one device.
pub struct Entities<C: DeviceClient> {
    pub sensors: Vec<SensorEntity<C>>,
    pub binary_sensors: Vec<BinarySensorEntity<C>>,
}

impl<C: DeviceClient> Entities<C> {
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.sensors
            .iter()
            .map(SensorEntity::snapshot)
            .chain(self.binary_sensors.iter().map(BinarySensorEntity::snapshot))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sensors.len() + self.binary_sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Entities ─────────────────────────────────────────────────────

fn unique_id(device_id: &str, key: &str) -> String {
    format!("{device_id}_{key}")
}

/// A value sensor bound to a coordinator.
pub struct SensorEntity<C: DeviceClient> {
    coordinator: Coordinator<C>,
    description: &'static SensorDescriptor<C::Status>,
    unique_id: String,
}

impl<C: DeviceClient> SensorEntity<C> {
    pub fn new(
        coordinator: Coordinator<C>,
        device_id: &str,
        description: &'static SensorDescriptor<C::Status>,
    ) -> Self {
        Self {
            coordinator,
            unique_id: unique_id(device_id, description.key),
            description,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn description(&self) -> &'static SensorDescriptor<C::Status> {
        self.description
    }

    /// Extracted value, or `None` (unknown) without cached data.
    pub fn value(&self) -> Option<SensorValue> {
        let status = self.coordinator.data()?;
        (self.description.value_fn)(&status)
    }

    pub fn state_string(&self) -> String {
        self.value()
            .map_or_else(|| "unknown".to_owned(), |v| v.to_string())
    }

    pub fn unit(&self) -> Option<&'static str> {
        match (self.description.unit_fn, self.coordinator.data()) {
            (Some(unit_fn), Some(status)) => Some(unit_fn(&status)),
            _ => self.description.unit,
        }
    }

    /// Stale data stays readable; availability tracks the last attempt.
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        let d = self.description;
        EntitySnapshot {
            unique_id: self.unique_id.clone(),
            key: d.key,
            name: d.name,
            kind: EntityKind::Sensor,
            device_class: d.device_class.map(|c| c.to_string()),
            value: self.value(),
            unit: self.unit(),
            icon: d.icon,
            available: self.available(),
        }
    }
}

/// An on/off sensor bound to a coordinator.
pub struct BinarySensorEntity<C: DeviceClient> {
    coordinator: Coordinator<C>,
    description: &'static BinarySensorDescriptor<C::Status>,
    unique_id: String,
}

impl<C: DeviceClient> BinarySensorEntity<C> {
    pub fn new(
        coordinator: Coordinator<C>,
        device_id: &str,
        description: &'static BinarySensorDescriptor<C::Status>,
    ) -> Self {
        Self {
            coordinator,
            unique_id: unique_id(device_id, description.key),
            description,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn description(&self) -> &'static BinarySensorDescriptor<C::Status> {
        self.description
    }

    pub fn is_on(&self) -> Option<bool> {
        let status = self.coordinator.data()?;
        (self.description.value_fn)(&status)
    }

    pub fn state_string(&self) -> String {
        match self.is_on() {
            Some(true) => "on".to_owned(),
            Some(false) => "off".to_owned(),
            None => "unknown".to_owned(),
        }
    }

    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        let d = self.description;
        EntitySnapshot {
            unique_id: self.unique_id.clone(),
            key: d.key,
            name: d.name,
            kind: EntityKind::BinarySensor,
            device_class: d.device_class.map(|c| c.to_string()),
            value: self.is_on().map(SensorValue::Bool),
            unit: None,
            icon: d.icon,
            available: self.available(),
        }
    }
}

/// Point-in-time view of one entity, detached from its coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub unique_id: String,
    pub key: &'static str,
    pub name: &'static str,
    pub kind: EntityKind,
    pub device_class: Option<String>,
    pub value: Option<SensorValue>,
    pub unit: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub available: bool,
}

impl EntitySnapshot {
    /// State as a host would display it: the value, or `unknown`.
    pub fn state(&self) -> String {
        self.value
            .as_ref()
            .map_or_else(|| "unknown".to_owned(), ToString::to_string)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::config::CoordinatorConfig;

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        level: f64,
        running: bool,
    }

    struct Tank {
        fail: AtomicBool,
    }

    impl DeviceClient for Tank {
        type Status = Reading;

        async fn fetch_status(&self) -> Result<Reading, homepoll_api::Error> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(homepoll_api::Error::Timeout { timeout_secs: 1 });
            }
            Ok(Reading {
                level: 42.5,
                running: true,
            })
        }
    }

    impl EntityPlatform for Tank {
        const SENSORS: &'static [SensorDescriptor<Reading>] = &[SensorDescriptor {
            key: "level",
            name: "Level",
            device_class: None,
            unit: Some("%"),
            icon: None,
            value_fn: |r| Some(SensorValue::Number(r.level)),
            unit_fn: None,
        }];
        const BINARY_SENSORS: &'static [BinarySensorDescriptor<Reading>] =
            &[BinarySensorDescriptor {
                key: "running",
                name: "Running",
                device_class: Some(BinarySensorDeviceClass::Running),
                icon: None,
                value_fn: |r| Some(r.running),
            }];
    }

    fn coordinator() -> Coordinator<Tank> {
        Coordinator::new(
            Tank {
                fail: AtomicBool::new(false),
            },
            CoordinatorConfig {
                name: "tank".into(),
                update_interval: Duration::ZERO,
                request_timeout: Duration::from_secs(5),
            },
        )
    }

    #[tokio::test]
    async fn unknown_before_first_refresh() {
        let coordinator = coordinator();
        let entities = Tank::setup_entities(&coordinator, "dev1");

        assert_eq!(entities.len(), 2);
        assert!(entities.sensors[0].value().is_none());
        assert!(entities.binary_sensors[0].is_on().is_none());
        assert!(entities.snapshot().iter().all(|s| s.state() == "unknown"));
        assert_eq!(entities.binary_sensors[0].state_string(), "unknown");
    }

    #[tokio::test]
    async fn value_matches_extractor_after_refresh() {
        let coordinator = coordinator();
        let entities = Tank::setup_entities(&coordinator, "dev1");

        let status = coordinator.refresh().await.unwrap();

        let sensor = &entities.sensors[0];
        assert_eq!(sensor.value(), (sensor.description().value_fn)(&status));
        assert_eq!(sensor.value(), Some(SensorValue::Number(42.5)));
        assert_eq!(entities.binary_sensors[0].is_on(), Some(true));
        assert_eq!(sensor.unique_id(), "dev1_level");
    }

    #[tokio::test]
    async fn stale_value_survives_failed_refresh() {
        let coordinator = coordinator();
        let entities = Tank::setup_entities(&coordinator, "dev1");

        coordinator.refresh().await.unwrap();
        coordinator.client().fail.store(true, Ordering::SeqCst);
        assert!(coordinator.refresh().await.is_err());

        let snap = entities.sensors[0].snapshot();
        assert_eq!(snap.value, Some(SensorValue::Number(42.5)));
        assert!(!snap.available);
        assert_eq!(snap.unit, Some("%"));
    }

    #[tokio::test]
    async fn binary_snapshot_renders_on_off() {
        let coordinator = coordinator();
        let entities = Tank::setup_entities(&coordinator, "dev1");
        coordinator.refresh().await.unwrap();

        let snap = entities.binary_sensors[0].snapshot();
        assert_eq!(snap.kind, EntityKind::BinarySensor);
        assert_eq!(snap.device_class.as_deref(), Some("running"));
        assert_eq!(snap.state(), "on");
    }

    #[test]
    fn descriptor_listing_covers_both_kinds() {
        let pool = descriptors(DeviceKind::PoolSense);
        assert_eq!(pool.len(), 11);
        assert!(pool.iter().any(|d| d.key == "water_temp"));

        let steam = descriptors(DeviceKind::Steamist);
        assert_eq!(steam.len(), 3);
        assert_eq!(steam[2].kind, EntityKind::BinarySensor);
    }

    #[test]
    fn sensor_value_display() {
        assert_eq!(SensorValue::Bool(false).to_string(), "off");
        assert_eq!(SensorValue::Integer(15).to_string(), "15");
        assert_eq!(SensorValue::Text("ok".into()).to_string(), "ok");
    }

    #[test]
    fn snapshot_serializes_untagged_value() {
        let snap = EntitySnapshot {
            unique_id: "dev1_level".into(),
            key: "level",
            name: "Level",
            kind: EntityKind::Sensor,
            device_class: None,
            value: Some(SensorValue::Number(1.5)),
            unit: Some("%"),
            icon: None,
            available: true,
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["value"], serde_json::json!(1.5));
        assert_eq!(json["kind"], "sensor");
    }
}
