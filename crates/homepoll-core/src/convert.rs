// ── Wire-to-domain conversion ──
//
// Vendor payloads are translated into the canonical status types here.
// Conversions that can fail report `homepoll_api::Error::Deserialization`
// so the coordinator treats them like any other failed fetch.

use std::str::FromStr;

use homepoll_api::{PoolSenseData, SteamistStatusResponse};

use crate::model::{PoolSenseStatus, StatusColor, SteamistStatus, TemperatureUnit};

fn parse_color(raw: Option<&str>) -> Option<StatusColor> {
    raw.and_then(|s| StatusColor::from_str(s.trim()).ok())
}

impl From<PoolSenseData> for PoolSenseStatus {
    fn from(d: PoolSenseData) -> Self {
        Self {
            chlorine: d.orp,
            ph: d.ph,
            water_temp: d.water_temp,
            battery: d.battery,
            last_seen: d.last_data,
            chlorine_high: d.orp_high,
            chlorine_low: d.orp_low,
            ph_high: d.ph_high,
            ph_low: d.ph_low,
            ph_status: parse_color(d.ph_status.as_deref()),
            chlorine_status: parse_color(d.orp_status.as_deref()),
        }
    }
}

impl TryFrom<SteamistStatusResponse> for SteamistStatus {
    type Error = homepoll_api::Error;

    fn try_from(r: SteamistStatusResponse) -> Result<Self, Self::Error> {
        let temp_units = TemperatureUnit::from_str(r.units.trim()).map_err(|_| {
            homepoll_api::Error::Deserialization {
                message: format!("unknown temperature unit '{}'", r.units),
                body: r.units.clone(),
            }
        })?;

        Ok(Self {
            temp: r.temp0,
            temp_units,
            minutes_remain: r.tmr0,
            active: r.is_active(),
        })
    }
}
