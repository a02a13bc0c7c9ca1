//! Detailed view of one run.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use loot_core::{HuntingTrip, MarkupStore};

use super::util::{ped, write_summary};
use crate::Config;
use crate::tracker::Tracker;

pub fn run<W: Write>(writer: &mut W, config: &Config, number: usize, now: DateTime<Utc>) -> Result<()> {
    let tracker = Tracker::open(config)?;
    let id = tracker.run_number(number)?;
    let trip = tracker
        .registry()
        .get(id)
        .with_context(|| format!("no run #{number}"))?;
    write_run(writer, number, trip, tracker.markup(), now)
}

/// Writes the summary, combat figures and ledgers of a run.
pub fn write_run<W: Write>(
    writer: &mut W,
    number: usize,
    trip: &HuntingTrip,
    markup: &MarkupStore,
    now: DateTime<Utc>,
) -> Result<()> {
    write_summary(writer, number, &trip.summary(markup, now))?;

    writeln!(writer)?;
    writeln!(writer, "COMBAT")?;
    writeln!(writer, "Attacks:     {}", trip.combat.attacks)?;
    writeln!(writer, "Damage:      {:.1}", trip.combat.damage)?;
    writeln!(writer, "Crits:       {}", trip.crit_chance())?;
    writeln!(writer, "Misses:      {}", trip.miss_chance())?;
    writeln!(writer, "DPP:         {:.2}", trip.dpp().round_dp(2))?;

    let loot = trip.loot_table(markup);
    if !loot.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "{:<32}  {:>8}  {:>9}  {:>9}  {:>9}",
            "LOOT", "COUNT", "TT", "MARKUP", "TOTAL"
        )?;
        for row in loot {
            writeln!(
                writer,
                "{:<32}  {:>8}  {:>9}  {:>9}  {:>9}",
                row.item,
                row.count,
                ped(row.value),
                row.markup,
                ped(row.total_value)
            )?;
        }
    }

    let skills = trip.skill_table();
    if !skills.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{:<32}  {:>9}  {:>6}  {:>6}", "SKILL", "GAIN", "PROCS", "SHARE")?;
        for row in skills {
            let gain = format!("{:.4}", row.gain.round_dp(4));
            let share = format!("{}%", row.proc_percent);
            writeln!(
                writer,
                "{:<32}  {gain:>9}  {:>6}  {share:>6}",
                row.skill, row.procs
            )?;
        }
    }

    let enhancers = trip.enhancer_table();
    if !enhancers.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{:<32}  {:>6}", "ENHANCER", "BREAKS")?;
        for row in enhancers {
            writeln!(writer, "{:<32}  {:>6}", row.enhancer, row.breaks)?;
        }
    }
    Ok(())
}
