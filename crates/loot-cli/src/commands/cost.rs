//! Cost per shot of the configured loadouts.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use loot_core::loadout::find_loadout;

use crate::Config;
use crate::config::default_config_file;

/// Prints every loadout with its cost per shot. With `select`, marks that
/// loadout as selected and saves the configuration to `config_path` (or the
/// default config file) first.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    config_path: Option<&Path>,
    select: Option<&str>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(name) = select {
        find_loadout(&config.loadouts, name)?;
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(default_config_file)
            .context("no config directory on this platform")?;
        config.selected_loadout = Some(name.to_string());
        config.save_to(&path)?;
        writeln!(writer, "Selected {name} (saved to {}).", path.display())?;
    }
    write_costs(writer, &config)
}

pub fn write_costs<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    if config.loadouts.is_empty() {
        writeln!(writer, "No loadouts configured.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "  {:<20}  {:<28}  {:>10}  {:>8}  {:>10}",
        "LOADOUT", "WEAPON", "AMMO", "DECAY", "PED/SHOT"
    )?;
    for loadout in &config.loadouts {
        let marker = if config.selected_loadout.as_deref() == Some(loadout.name.as_str()) {
            '*'
        } else {
            ' '
        };
        match (loadout.shot_cost(&config.catalog), loadout.cost_per_shot(&config.catalog)) {
            (Ok(stats), Ok(cost)) => {
                let ammo = format!("{:.2}", stats.ammo.round_dp(2));
                let decay = format!("{:.4}", stats.decay.round_dp(4));
                let cost = format!("{:.5}", cost.round_dp(5));
                writeln!(
                    writer,
                    "{marker} {:<20}  {:<28}  {ammo:>10}  {decay:>8}  {cost:>10}",
                    loadout.name, loadout.weapon
                )?;
            }
            (Err(e), _) | (_, Err(e)) => {
                writeln!(writer, "{marker} {:<20}  {e}", loadout.name)?;
            }
        }
    }
    Ok(())
}
