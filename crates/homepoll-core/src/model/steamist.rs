use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum TemperatureUnit {
    #[strum(serialize = "F", to_string = "°F")]
    #[serde(rename = "F")]
    Fahrenheit,
    #[strum(serialize = "C", to_string = "°C")]
    #[serde(rename = "C")]
    Celsius,
}

impl TemperatureUnit {
    /// Unit symbol as shown next to a reading.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Fahrenheit => "°F",
            Self::Celsius => "°C",
        }
    }
}

/// Snapshot of a Steamist steam generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteamistStatus {
    pub temp: i32,
    pub temp_units: TemperatureUnit,
    pub minutes_remain: u32,
    pub active: bool,
}
