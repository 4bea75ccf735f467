use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Traffic-light rating the PoolSense cloud assigns to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusColor {
    Green,
    Orange,
    Red,
}

/// One reading cycle of a PoolSense water monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolSenseStatus {
    /// ORP in millivolts.
    pub chlorine: Option<f64>,
    pub ph: Option<f64>,
    /// Degrees Celsius.
    pub water_temp: Option<f64>,
    /// Percent.
    pub battery: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub chlorine_high: Option<f64>,
    pub chlorine_low: Option<f64>,
    pub ph_high: Option<f64>,
    pub ph_low: Option<f64>,
    pub ph_status: Option<StatusColor>,
    pub chlorine_status: Option<StatusColor>,
}

impl PoolSenseStatus {
    /// `true` when the pH rating is red, `None` while unrated.
    pub fn ph_problem(&self) -> Option<bool> {
        self.ph_status.map(|c| c == StatusColor::Red)
    }

    /// `true` when the chlorine rating is red, `None` while unrated.
    pub fn chlorine_problem(&self) -> Option<bool> {
        self.chlorine_status.map(|c| c == StatusColor::Red)
    }
}
