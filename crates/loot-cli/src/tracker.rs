//! The single writer of run state.
//!
//! A [`Tracker`] owns the run registry, the markup store and the record store.
//! Every change to a run goes through it, and it decides when the active run
//! is written back to disk.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use loot_core::{Event, EventKind, MarkupStore, RunId, RunRegistry, classify};
use loot_store::RunStore;
use rust_decimal::Decimal;

use crate::config::{Config, ScreenshotConfig};
use crate::screenshot::{BackgroundScreenshots, NoScreenshots, ScreenshotTrigger};
use crate::tailer::LineQueue;

pub struct Tracker {
    registry: RunRegistry,
    markup: MarkupStore,
    store: RunStore,
    player_name: String,
    screenshot: ScreenshotConfig,
    trigger: Box<dyn ScreenshotTrigger>,
    cost_per_shot: Decimal,
    autosave: Duration,
    dirty: bool,
    last_save: Instant,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("runs", &self.registry.len())
            .field("active", &self.registry.active_id())
            .field("store", &self.store.dir())
            .field("cost_per_shot", &self.cost_per_shot)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(
        registry: RunRegistry,
        markup: MarkupStore,
        store: RunStore,
        config: &Config,
        trigger: Box<dyn ScreenshotTrigger>,
    ) -> Self {
        let cost_per_shot = config.cost_per_shot().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cannot price selected loadout, using 0 per shot");
            Decimal::ZERO
        });
        Self {
            registry,
            markup,
            store,
            player_name: config.player_name.clone(),
            screenshot: config.screenshot.clone(),
            trigger,
            cost_per_shot,
            autosave: Duration::from_secs(config.autosave_secs),
            dirty: false,
            last_save: Instant::now(),
        }
    }

    /// Loads every run and the markup store from the configured data
    /// directory, migrating the legacy run file first.
    pub fn open(config: &Config) -> Result<Self> {
        let store = RunStore::new(&config.data_dir);
        store
            .migrate_legacy(Duration::from_millis(config.migration_settle_ms))
            .context("failed to migrate legacy runs")?;
        let runs = store.load_all().context("failed to load runs")?;
        let markup = MarkupStore::load(&config.markup_path());
        Ok(Self::new(
            RunRegistry::from_loaded(runs),
            markup,
            store,
            config,
            screenshot_trigger(&config.screenshot),
        ))
    }

    pub const fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub const fn markup(&self) -> &MarkupStore {
        &self.markup
    }

    pub const fn cost_per_shot(&self) -> Decimal {
        self.cost_per_shot
    }

    /// Whether the active run has changes not yet saved.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Changes the cost per shot of the active run and of runs started later.
    pub fn set_cost_per_shot(&mut self, cost_per_shot: Decimal) {
        self.cost_per_shot = cost_per_shot;
        if let Some(trip) = self.registry.active_mut() {
            trip.cost_per_shot = cost_per_shot;
            self.dirty = true;
        }
    }

    /// Starts a new run at `start`, ending and saving any active one.
    pub fn start_run(&mut self, start: DateTime<Utc>) -> Result<RunId> {
        self.end_run(start)?;
        let id = self.registry.start_run(start, self.cost_per_shot);
        self.dirty = true;
        Ok(id)
    }

    /// Folds events into the active run, starting one at `now` if needed.
    ///
    /// Globals only count when the player is the actor; those also trigger a
    /// screenshot. Returns how many events changed the run.
    pub fn ingest(&mut self, events: &[Event], now: DateTime<Utc>) -> usize {
        if events.is_empty() {
            return 0;
        }
        let trip = self.registry.ensure_active(now, self.cost_per_shot);
        let mut changed = 0;
        for event in events {
            if let EventKind::Global { actor, value, .. } = event.kind() {
                if !is_player(&self.player_name, actor) {
                    continue;
                }
                if self.screenshot.enabled && *value >= self.screenshot.threshold {
                    self.trigger.capture(
                        Duration::from_millis(self.screenshot.delay_ms),
                        &self.screenshot.directory,
                        event,
                    );
                }
            }
            if trip.add(event) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    /// One pass of the watch loop: processes at most `batch_size` queued
    /// lines, then autosaves if due.
    pub fn tick(&mut self, queue: &LineQueue, batch_size: usize, now: DateTime<Utc>) -> Result<usize> {
        let events: Vec<Event> = queue
            .drain(batch_size)
            .iter()
            .filter_map(|line| classify(line))
            .collect();
        let changed = self.ingest(&events, now);
        self.save_active(false)?;
        Ok(changed)
    }

    /// Writes the active run if it changed. Unless `force` is set, waits until
    /// the autosave interval has passed since the last save.
    pub fn save_active(&mut self, force: bool) -> Result<bool> {
        if !self.dirty || (!force && self.last_save.elapsed() < self.autosave) {
            return Ok(false);
        }
        let Some(trip) = self.registry.active_mut() else {
            self.dirty = false;
            return Ok(false);
        };
        trip.refresh_cached_return_mu(&self.markup);
        self.store.save(trip).context("failed to save active run")?;
        self.dirty = false;
        self.last_save = Instant::now();
        Ok(true)
    }

    /// Ends the active run at `now` and saves it.
    pub fn end_run(&mut self, now: DateTime<Utc>) -> Result<Option<RunId>> {
        if let Some(trip) = self.registry.active_mut() {
            trip.refresh_cached_return_mu(&self.markup);
        }
        let Some(trip) = self.registry.end_active(now) else {
            return Ok(None);
        };
        self.store.save(trip).context("failed to save ended run")?;
        self.dirty = false;
        Ok(Some(RunId::of(trip)))
    }

    /// Resolves a run number as shown by `loot runs`.
    pub fn run_number(&self, number: usize) -> Result<RunId> {
        self.registry
            .nth_newest(number)
            .with_context(|| format!("no run #{number}"))
    }

    pub fn edit_notes(&mut self, number: usize, notes: &str) -> Result<()> {
        let id = self.run_number(number)?;
        self.registry.edit_notes(id, notes)?;
        self.save_run(id)
    }

    /// Sets a run's extra spend from user text; see
    /// [`RunRegistry::parse_extra_spend`].
    pub fn set_extra_spend(&mut self, number: usize, text: &str) -> Result<Decimal> {
        let id = self.run_number(number)?;
        let amount = self.registry.parse_extra_spend(id, text)?;
        self.save_run(id)?;
        Ok(amount)
    }

    /// Deletes runs by number, along with their records.
    pub fn delete(&mut self, numbers: &[usize]) -> Result<usize> {
        let ids = numbers
            .iter()
            .map(|n| self.run_number(*n))
            .collect::<Result<Vec<_>>>()?;
        let removed = self.registry.delete(&ids);
        for trip in &removed {
            self.store.remove(trip).context("failed to remove run record")?;
        }
        Ok(removed.len())
    }

    /// Writes an edited run. Only the active run is saved whole; older runs
    /// may be loaded without their loot detail, so only their editable fields
    /// are written back.
    fn save_run(&mut self, id: RunId) -> Result<()> {
        let Some(trip) = self.registry.get(id) else {
            return Ok(());
        };
        if self.registry.active_id() == Some(id) {
            self.store.save(trip).context("failed to save run")?;
        } else {
            self.store.save_edits(trip).context("failed to save run")?;
        }
        Ok(())
    }
}

/// Screenshot trigger for the given settings.
pub fn screenshot_trigger(settings: &ScreenshotConfig) -> Box<dyn ScreenshotTrigger> {
    match &settings.command {
        Some(command) if settings.enabled && !command.is_empty() => {
            Box::new(BackgroundScreenshots::new(command.clone()))
        }
        _ => Box::new(NoScreenshots),
    }
}

fn is_player(player_name: &str, actor: &str) -> bool {
    let player = player_name.trim();
    !player.is_empty() && player.eq_ignore_ascii_case(actor.trim())
}
