// PoolSense wire types
//
// Field names follow the cloud API's mixed casing (`ORP`, `pH`,
// `waterTemp`). Every reading is optional: a freshly paired sensor
// reports nothing until its first measurement cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST users/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}

/// Body of `GET sensors/details`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSenseData {
    /// Oxidation-reduction potential, millivolts (the chlorine proxy).
    #[serde(rename = "ORP", default)]
    pub orp: Option<f64>,

    #[serde(rename = "pH", default)]
    pub ph: Option<f64>,

    /// Water temperature, degrees Celsius.
    #[serde(default)]
    pub water_temp: Option<f64>,

    /// Battery level, percent.
    #[serde(default)]
    pub battery: Option<f64>,

    /// When the cloud last heard from the sensor.
    #[serde(default)]
    pub last_data: Option<DateTime<Utc>>,

    #[serde(rename = "ORPHigh", default)]
    pub orp_high: Option<f64>,

    #[serde(rename = "ORPLow", default)]
    pub orp_low: Option<f64>,

    #[serde(rename = "pHHigh", default)]
    pub ph_high: Option<f64>,

    #[serde(rename = "pHLow", default)]
    pub ph_low: Option<f64>,

    /// Traffic-light colour: `green`, `orange` or `red`.
    #[serde(rename = "pHStatus", default)]
    pub ph_status: Option<String>,

    #[serde(rename = "ORPStatus", default)]
    pub orp_status: Option<String>,
}
