//! `sensors`: list descriptor tables without contacting a device.

use homepoll_core::entity::{self, DescriptorInfo};
use homepoll_core::DeviceKind;
use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use crate::cli::{GlobalOpts, KindArg, SensorsArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct SensorListing {
    integration: DeviceKind,
    #[serde(flatten)]
    info: DescriptorInfo,
}

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Integration")]
    integration: String,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Unit")]
    unit: &'static str,
}

impl From<&SensorListing> for SensorRow {
    fn from(s: &SensorListing) -> Self {
        Self {
            integration: s.integration.to_string(),
            key: s.info.key,
            name: s.info.name,
            kind: s.info.kind.to_string(),
            class: s.info.device_class.clone().unwrap_or_default(),
            unit: s.info.unit.unwrap_or_default(),
        }
    }
}

fn selected(kind: Option<KindArg>) -> Vec<DeviceKind> {
    match kind {
        Some(KindArg::Poolsense) => vec![DeviceKind::PoolSense],
        Some(KindArg::Steamist) => vec![DeviceKind::Steamist],
        None => DeviceKind::iter().collect(),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn handle(args: SensorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let listings: Vec<SensorListing> = selected(args.kind)
        .into_iter()
        .flat_map(|integration| {
            entity::descriptors(integration)
                .into_iter()
                .map(move |info| SensorListing { integration, info })
        })
        .collect();

    let out = output::render_list(
        global.output,
        &listings,
        |s| SensorRow::from(s),
        |s| format!("{}.{}", s.integration, s.info.key),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
