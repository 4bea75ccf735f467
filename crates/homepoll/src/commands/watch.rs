//! `watch`: scheduled polling, rendering every refresh outcome.

use std::time::Duration;

use chrono::Local;
use homepoll_core::{AnyCoordinator, UpdateHealth};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::status::render_entities;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = config::build_integration_config(global)?;

    if let Some(secs) = args.interval {
        config.coordinator.update_interval = Duration::from_secs(secs);
    }
    let interval = config.coordinator.update_interval;
    if interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "scheduled polling is disabled; pass --interval with a positive value".into(),
        });
    }

    let device = AnyCoordinator::connect(&config)?;
    let mut health = device.health();

    if !global.quiet {
        eprintln!(
            "Polling {} every {}; press Ctrl-C to stop",
            device.name(),
            humantime::format_duration(interval)
        );
    }

    // Failures land in `health`; polling continues either way.
    let _ = device.refresh().await;
    device.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = health.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = health.borrow_and_update().clone();
                report(&device, &snapshot, global)?;
            }
        }
    }

    tracing::debug!(device = device.name(), "stopping");
    device.shutdown().await;
    Ok(())
}

fn report(device: &AnyCoordinator, health: &UpdateHealth, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let stamp = Local::now().format("%H:%M:%S");

    if let Some(ref err) = health.last_error {
        let stale = if device.has_data() { " (showing last good data)" } else { "" };
        eprintln!("{}", output::bad(&format!("[{stamp}] {err}{stale}"), color));
        return Ok(());
    }

    if !global.quiet {
        eprintln!("{}", output::dim(&format!("[{stamp}] refresh #{}", health.attempts), color));
    }
    let out = render_entities(&device.snapshot(), global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
