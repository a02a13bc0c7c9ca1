//! Shared utilities for CLI commands.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use fs2::FileExt;
use loot_core::RunSummary;
use rust_decimal::Decimal;

use crate::Config;

/// Takes the single-writer lock on the data directory.
///
/// The lock is held until the returned file is dropped. Fails at once if
/// another process holds it.
pub fn lock_data_dir(config: &Config) -> Result<File> {
    std::fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    let lock_file = File::create(config.lock_path()).context("failed to create lock file")?;
    lock_file.try_lock_exclusive().with_context(|| {
        format!(
            "another loot process is using {}",
            config.data_dir.display()
        )
    })?;
    Ok(lock_file)
}

/// PED amount with two decimals.
pub fn ped(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Percentage with two decimals, `-` when undefined.
pub fn percent(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v.round_dp(2)))
}

/// Writes the headline figures of one run.
pub fn write_summary<W: Write>(writer: &mut W, number: usize, summary: &RunSummary) -> Result<()> {
    let state = if summary.end.is_some() { "" } else { " (active)" };
    writeln!(writer, "Run #{number}{state}")?;
    writeln!(writer, "Start:       {}", summary.start.format("%Y-%m-%d %H:%M:%S"))?;
    if let Some(end) = summary.end {
        writeln!(writer, "End:         {}", end.format("%Y-%m-%d %H:%M:%S"))?;
    }
    writeln!(writer, "Duration:    {}", summary.duration)?;
    if !summary.notes.is_empty() {
        writeln!(writer, "Notes:       {}", summary.notes)?;
    }
    writeln!(
        writer,
        "Spend:       {} PED (+{} extra)",
        ped(summary.spend),
        ped(summary.extra_spend)
    )?;
    writeln!(
        writer,
        "TT return:   {} PED ({})",
        ped(summary.tt_return),
        percent(summary.return_perc)
    )?;
    writeln!(
        writer,
        "MU return:   {} PED ({})",
        ped(summary.mu_return),
        percent(summary.mu_perc)
    )?;
    writeln!(writer, "Loots:       {}", summary.loot_instances)?;
    writeln!(writer, "Globals:     {} ({} HoF)", summary.globals, summary.hofs)?;
    writeln!(writer, "Enhancers:   {} broken", summary.enhancer_breaks)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn formats_money_and_percent() {
        assert_eq!(ped(dec!(0.0068)), "0.01");
        assert_eq!(ped(dec!(12)), "12.00");
        assert_eq!(percent(Some(dec!(104.1666))), "104.17%");
        assert_eq!(percent(None), "-");
    }

    #[test]
    fn second_lock_fails() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().join("data"),
            ..Config::default()
        };
        let held = lock_data_dir(&config).unwrap();
        assert!(lock_data_dir(&config).is_err());
        drop(held);
        assert!(lock_data_dir(&config).is_ok());
    }
}
