// ── Domain model ──
//
// Canonical status snapshots, decoupled from the vendor wire formats.

mod poolsense;
mod steamist;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub use poolsense::{PoolSenseStatus, StatusColor};
pub use steamist::{SteamistStatus, TemperatureUnit};

/// Which vendor integration a device belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceKind {
    PoolSense,
    Steamist,
}
