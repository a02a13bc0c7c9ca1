//! Edits to recorded runs: notes, extra spend and deletion.

use std::io::Write;

use anyhow::Result;

use super::util::{lock_data_dir, ped};
use crate::Config;
use crate::tracker::Tracker;

pub fn notes<W: Write>(writer: &mut W, config: &Config, run: usize, text: &str) -> Result<()> {
    let _lock = lock_data_dir(config)?;
    let mut tracker = Tracker::open(config)?;
    tracker.edit_notes(run, text)?;
    writeln!(writer, "Updated notes of run #{run}.")?;
    Ok(())
}

pub fn spend<W: Write>(writer: &mut W, config: &Config, run: usize, amount: &str) -> Result<()> {
    let _lock = lock_data_dir(config)?;
    let mut tracker = Tracker::open(config)?;
    let stored = tracker.set_extra_spend(run, amount)?;
    writeln!(writer, "Extra spend of run #{run}: {} PED.", ped(stored))?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, config: &Config, runs: &[usize]) -> Result<()> {
    let _lock = lock_data_dir(config)?;
    let mut tracker = Tracker::open(config)?;
    let removed = tracker.delete(runs)?;
    let noun = if removed == 1 { "run" } else { "runs" };
    writeln!(writer, "Deleted {removed} {noun}.")?;
    Ok(())
}
