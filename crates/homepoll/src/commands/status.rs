//! `status`: one refresh, then every entity.

use homepoll_core::{AnyCoordinator, EntityKind, EntitySnapshot};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Unique ID")]
    unique_id: String,
}

impl EntityRow {
    fn new(e: &EntitySnapshot, color: bool) -> Self {
        let state = e.state();
        let state = match (&e.value, e.kind) {
            (None, _) => output::dim(&state, color),
            _ if !e.available => output::dim(&format!("{state} (stale)"), color),
            (Some(_), EntityKind::BinarySensor) if state == "on" => output::good(&state, color),
            _ => state,
        };
        Self {
            name: e.name.to_owned(),
            state,
            unit: e.unit.unwrap_or_default().to_owned(),
            class: e.device_class.clone().unwrap_or_default(),
            unique_id: e.unique_id.clone(),
        }
    }
}

/// Render entity snapshots in the selected output format.
pub fn render_entities(entities: &[EntitySnapshot], global: &GlobalOpts) -> Result<String, CliError> {
    let color = output::should_color(global.color);
    output::render_list(
        global.output,
        entities,
        |e| EntityRow::new(e, color),
        |e| format!("{}={}", e.key, e.state()),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = config::build_integration_config(global)?;
    let device = AnyCoordinator::connect(&config)?;

    tracing::debug!(device = device.name(), kind = %device.kind(), "querying device");
    device.first_refresh().await?;

    let out = render_entities(&device.snapshot(), global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
