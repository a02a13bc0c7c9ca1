//! Folds a complete chat log into a new run.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use loot_core::{Event, classify};

use super::show::write_run;
use super::util::lock_data_dir;
use crate::Config;
use crate::tailer::decode_line;
use crate::tracker::Tracker;

/// Reads every line of `file` and records it as one finished run spanning
/// the first to the last recognised line. An active run is ended at `now`
/// first.
pub fn run<W: Write>(writer: &mut W, config: &Config, file: &Path, now: DateTime<Utc>) -> Result<()> {
    let raw = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let lines: Vec<&str> = raw.split(|b| *b == b'\n').filter_map(decode_line).collect();
    let events: Vec<Event> = lines.iter().filter_map(|line| classify(line)).collect();
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        writeln!(writer, "No events found in {}.", file.display())?;
        return Ok(());
    };
    let start = first.time().and_utc();
    let end = last.time().and_utc();

    let _lock = lock_data_dir(config)?;
    let mut tracker = Tracker::open(config)?;
    if tracker
        .registry()
        .runs()
        .iter()
        .any(|trip| trip.time_start == start)
    {
        anyhow::bail!(
            "a run starting {} already exists",
            start.format("%Y-%m-%d %H:%M:%S")
        );
    }

    tracker.end_run(now)?;
    tracker.start_run(start)?;
    let counted = tracker.ingest(&events, start);
    tracker.end_run(end)?;
    tracing::info!(lines = lines.len(), events = events.len(), counted, "replayed chat log");

    writeln!(
        writer,
        "Read {} lines: {} events, {} counted.",
        lines.len(),
        events.len(),
        counted
    )?;
    writeln!(writer)?;

    // The replayed run is the newest unless older than an existing run.
    let number = tracker
        .registry()
        .runs()
        .iter()
        .rev()
        .position(|trip| trip.time_start == start)
        .map_or(1, |i| i + 1);
    let id = tracker.run_number(number)?;
    if let Some(trip) = tracker.registry().get(id) {
        write_run(writer, number, trip, tracker.markup(), now)?;
    }
    Ok(())
}
