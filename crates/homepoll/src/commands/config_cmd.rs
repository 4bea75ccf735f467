//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use homepoll_core::{AnyCoordinator, DeviceKind};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    cfg
}

/// TOML rendering of an already-redacted config.
fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Offer to store the password in the system keyring.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored
/// in the keyring.
fn prompt_password_storage(profile_name: &str, password: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

// ── Profiles table ──────────────────────────────────────────────────

#[derive(Serialize)]
struct ProfileListing<'a> {
    name: &'a str,
    default: bool,
    #[serde(flatten)]
    profile: &'a Profile,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Target")]
    target: String,
}

impl From<&ProfileListing<'_>> for ProfileRow {
    fn from(p: &ProfileListing<'_>) -> Self {
        let target = match p.profile.kind {
            DeviceKind::PoolSense => p.profile.email.clone(),
            DeviceKind::Steamist => p.profile.host.clone(),
        };
        Self {
            marker: if p.default { "*" } else { "" },
            name: p.name.to_owned(),
            kind: p.profile.kind.to_string(),
            target: target.unwrap_or_default(),
        }
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

async fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("homepoll configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let kinds = &["PoolSense (pool monitor, cloud)", "Steamist (steam shower, local)"];
    let kind = match Select::new()
        .with_prompt("Device type")
        .items(kinds)
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        0 => DeviceKind::PoolSense,
        _ => DeviceKind::Steamist,
    };

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(kind.to_string())
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(kind);
    let mut secret = None;

    match kind {
        DeviceKind::PoolSense => {
            let email: String = Input::new()
                .with_prompt("PoolSense account email")
                .interact_text()
                .map_err(prompt_err)?;
            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if email.is_empty() || password.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "email and password cannot be empty".into(),
                });
            }
            profile.email = Some(email);
            profile.password = Some(password.clone());
            secret = Some(password);
        }
        DeviceKind::Steamist => {
            let host: String = Input::new()
                .with_prompt("Steamist host (IP or IP:port)")
                .interact_text()
                .map_err(prompt_err)?;
            profile.host = Some(host);
        }
    }

    let check = Confirm::new()
        .with_prompt("Check the connection now?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;
    if check {
        let integration = config::resolve_profile(
            &profile,
            &profile_name,
            &config::Defaults::default(),
            global,
        )?;
        let device = AnyCoordinator::connect(&integration)?;
        if !device.validate().await? {
            return Err(CliError::AuthFailed {
                message: "PoolSense rejected the email/password".into(),
            });
        }
        eprintln!("   ✓ Connection OK");
    }

    if let Some(password) = secret {
        profile.password = prompt_password_storage(&profile_name, &password)?;
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    let path = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: homepoll status");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global).await,

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, format_config)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: homepoll config init");
                return Ok(());
            }
            let default = config::active_profile_name(global, &cfg);
            let listings: Vec<ProfileListing<'_>> = cfg
                .profiles
                .iter()
                .map(|(name, profile)| ProfileListing {
                    name,
                    default: *name == default,
                    profile,
                })
                .collect();
            let out = output::render_list(
                global.output,
                &listings,
                |p| ProfileRow::from(p),
                |p| p.name.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetPassword { name } => {
            let cfg = config::load_config_or_default();
            let profile_name = name.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let profile = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| profile_not_found(profile_name.clone(), &cfg))?;

            if profile.kind != DeviceKind::PoolSense {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: format!("'{profile_name}' is a {} profile and has no password", profile.kind),
                });
            }

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, &password)?;
            eprintln!("✓ Password for '{profile_name}' stored in system keyring");
            Ok(())
        }
    }
}
