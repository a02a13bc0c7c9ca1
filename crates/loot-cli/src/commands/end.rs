//! Ends the active run.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::util::lock_data_dir;
use crate::Config;
use crate::tracker::Tracker;

pub fn run<W: Write>(writer: &mut W, config: &Config, now: DateTime<Utc>) -> Result<()> {
    let _lock = lock_data_dir(config)?;
    let mut tracker = Tracker::open(config)?;
    match tracker.end_run(now)? {
        Some(id) => writeln!(writer, "Ended run {id}.")?,
        None => writeln!(writer, "No active run.")?,
    }
    Ok(())
}
