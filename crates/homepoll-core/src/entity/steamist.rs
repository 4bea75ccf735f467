//! Steamist sensor tables.

use homepoll_api::SteamistClient;

use super::{
    BinarySensorDescriptor, BinarySensorDeviceClass, EntityPlatform, SensorDescriptor,
    SensorDeviceClass, SensorValue,
};
use crate::model::SteamistStatus;

pub const SENSORS: &[SensorDescriptor<SteamistStatus>] = &[
    SensorDescriptor {
        key: "minutes_remain",
        name: "Steam Minutes Remain",
        device_class: Some(SensorDeviceClass::Duration),
        unit: Some("min"),
        icon: None,
        value_fn: |s| Some(SensorValue::Integer(i64::from(s.minutes_remain))),
        unit_fn: None,
    },
    SensorDescriptor {
        key: "temp",
        name: "Steam Temperature",
        device_class: Some(SensorDeviceClass::Temperature),
        unit: None,
        icon: None,
        value_fn: |s| Some(SensorValue::Integer(i64::from(s.temp))),
        unit_fn: Some(|s| s.temp_units.symbol()),
    },
];

pub const BINARY_SENSORS: &[BinarySensorDescriptor<SteamistStatus>] = &[BinarySensorDescriptor {
    key: "in_use",
    name: "In Use",
    device_class: Some(BinarySensorDeviceClass::Running),
    icon: None,
    value_fn: |s| Some(s.active),
}];

impl EntityPlatform for SteamistClient {
    const SENSORS: &'static [SensorDescriptor<SteamistStatus>] = SENSORS;
    const BINARY_SENSORS: &'static [BinarySensorDescriptor<SteamistStatus>] = BINARY_SENSORS;
}
