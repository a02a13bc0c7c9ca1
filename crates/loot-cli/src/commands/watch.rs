//! Follows the chat log and tracks the active run until interrupted.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::MissedTickBehavior;

use super::util::{lock_data_dir, write_summary};
use crate::Config;
use crate::tailer::{LineQueue, LogTailer};
use crate::tracker::Tracker;

pub fn run<W: Write>(writer: &mut W, config: &Config, from_start: bool, end_on_exit: bool) -> Result<()> {
    let log_path = config
        .log_path
        .as_deref()
        .context("no chat log configured; set log_path in the config file")?;

    let _lock = lock_data_dir(config)?;
    let mut tracker = Tracker::open(config)?;

    let queue = Arc::new(LineQueue::new());
    let tailer = LogTailer::spawn(
        log_path,
        from_start,
        Duration::from_millis(config.tail_poll_ms),
        Arc::clone(&queue),
    )?;
    writeln!(writer, "Watching {} (Ctrl-C to stop)", log_path.display())?;
    writeln!(writer, "Cost per shot: {} PED", tracker.cost_per_shot())?;
    writer.flush()?;

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let result = runtime.block_on(tick_loop(&mut tracker, &queue, config));
    tailer.stop();
    result?;

    // Lines read before Ctrl-C still count.
    let rest = queue.drain(queue.len());
    if !rest.is_empty() {
        let events: Vec<_> = rest.iter().filter_map(|line| loot_core::classify(line)).collect();
        tracker.ingest(&events, Utc::now());
    }

    let now = Utc::now();
    if end_on_exit {
        tracker.end_run(now)?;
    } else {
        tracker.save_active(true)?;
    }

    if let Some(trip) = tracker.registry().runs().last() {
        writeln!(writer)?;
        write_summary(writer, 1, &trip.summary(tracker.markup(), now))?;
    }
    Ok(())
}

async fn tick_loop(tracker: &mut Tracker, queue: &LineQueue, config: &Config) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = tracker.tick(queue, config.batch_size, Utc::now()) {
                    tracing::error!(error = %e, "tick failed");
                }
            }
            result = &mut shutdown => {
                result.context("failed to listen for Ctrl-C")?;
                tracing::info!("stopping");
                return Ok(());
            }
        }
    }
}
