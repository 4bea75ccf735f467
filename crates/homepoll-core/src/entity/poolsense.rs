//! PoolSense sensor tables.

use homepoll_api::PoolSenseClient;

use super::{
    BinarySensorDescriptor, BinarySensorDeviceClass, EntityPlatform, SensorDescriptor,
    SensorDeviceClass, SensorValue,
};
use crate::model::PoolSenseStatus;

const POOL_ICON: Option<&str> = Some("mdi:pool");
const MILLIVOLT: Option<&str> = Some("mV");

fn number(v: Option<f64>) -> Option<SensorValue> {
    v.map(SensorValue::Number)
}

pub const SENSORS: &[SensorDescriptor<PoolSenseStatus>] = &[
    SensorDescriptor {
        key: "chlorine",
        name: "Chlorine",
        device_class: None,
        unit: MILLIVOLT,
        icon: POOL_ICON,
        value_fn: |s| number(s.chlorine),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "ph",
        name: "pH",
        device_class: None,
        unit: None,
        icon: POOL_ICON,
        value_fn: |s| number(s.ph),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "battery",
        name: "Battery",
        device_class: Some(SensorDeviceClass::Battery),
        unit: Some("%"),
        icon: None,
        value_fn: |s| number(s.battery),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "water_temp",
        name: "Water Temp",
        device_class: Some(SensorDeviceClass::Temperature),
        unit: Some("°C"),
        icon: Some("mdi:coolant-temperature"),
        value_fn: |s| number(s.water_temp),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "last_seen",
        name: "Last Seen",
        device_class: Some(SensorDeviceClass::Timestamp),
        unit: None,
        icon: Some("mdi:clock"),
        value_fn: |s| s.last_seen.map(SensorValue::Timestamp),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "chlorine_high",
        name: "Chlorine High",
        device_class: None,
        unit: MILLIVOLT,
        icon: POOL_ICON,
        value_fn: |s| number(s.chlorine_high),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "chlorine_low",
        name: "Chlorine Low",
        device_class: None,
        unit: MILLIVOLT,
        icon: POOL_ICON,
        value_fn: |s| number(s.chlorine_low),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "ph_high",
        name: "pH High",
        device_class: None,
        unit: None,
        icon: POOL_ICON,
        value_fn: |s| number(s.ph_high),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "ph_low",
        name: "pH Low",
        device_class: None,
        unit: None,
        icon: POOL_ICON,
        value_fn: |s| number(s.ph_low),
        unit_fn: None,
    },
];

pub const BINARY_SENSORS: &[BinarySensorDescriptor<PoolSenseStatus>] = &[
    BinarySensorDescriptor {
        key: "ph_status",
        name: "pH Status",
        device_class: Some(BinarySensorDeviceClass::Problem),
        icon: None,
        value_fn: PoolSenseStatus::ph_problem,
    },
    BinarySensorDescriptor {
        key: "chlorine_status",
        name: "Chlorine Status",
        device_class: Some(BinarySensorDeviceClass::Problem),
        icon: None,
        value_fn: PoolSenseStatus::chlorine_problem,
    },
];

impl EntityPlatform for PoolSenseClient {
    const SENSORS: &'static [SensorDescriptor<PoolSenseStatus>] = SENSORS;
    const BINARY_SENSORS: &'static [BinarySensorDescriptor<PoolSenseStatus>] = BINARY_SENSORS;
}
