//! Storage layer for lootlog runs.
//!
//! Each run is one JSON file, `LootLog_<start-millis>.json`, in the data
//! directory. Files are overwritten in place on every save.
//!
//! # Loading
//!
//! Records that fail to parse are treated as corrupt: they are removed and
//! skipped, never fatal. Only the newest record is restored with its loot
//! ledger and graph series; older runs load as summaries.
//!
//! # Legacy layout
//!
//! Older versions kept every run in a single `runs.json` array.
//! [`RunStore::migrate_legacy`] splits it into per-run files and removes it.

mod record;
mod serde_count;
mod serde_timestamp;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use loot_core::HuntingTrip;
use rayon::prelude::*;
use thiserror::Error;

pub use record::{Detail, SessionRecord};

/// Name of the pre-split single-file store.
pub const LEGACY_FILE: &str = "runs.json";

const RECORD_PREFIX: &str = "LootLog_";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid run record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid record pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Run records in one directory.
#[derive(Debug, Clone)]
pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record file for a run.
    pub fn path_for(&self, trip: &HuntingTrip) -> PathBuf {
        self.record_path(trip.time_start)
    }

    fn record_path(&self, start: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("{RECORD_PREFIX}{}.json", start.timestamp_millis()))
    }

    /// Writes the run's record, replacing any previous version.
    pub fn save(&self, trip: &HuntingTrip) -> Result<PathBuf, StoreError> {
        self.write_record(&SessionRecord::from_trip(trip))
    }

    fn write_record(&self, record: &SessionRecord) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.record_path(record.start);
        let json = serde_json::to_string(record)?;
        std::fs::write(&path, json).map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), "saved run");
        Ok(path)
    }

    /// Saves the user-editable fields of a run (notes, extra spend, cached
    /// markup return) into its existing record, leaving the ledgers and graphs
    /// on disk untouched. Runs loaded as summaries must be saved this way.
    ///
    /// Without a readable record, the whole run is written instead.
    pub fn save_edits(&self, trip: &HuntingTrip) -> Result<PathBuf, StoreError> {
        let path = self.path_for(trip);
        let mut record = match read_record(&path) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no record to patch, saving whole run");
                return self.save(trip);
            }
        };
        record.notes.clone_from(&trip.notes);
        record.summary.extra_spend = trip.extra_spend;
        record.summary.cached_mu_return = trip.cached_total_return_mu;
        self.write_record(&record)
    }

    /// Removes the run's record. A missing record is not an error.
    pub fn remove(&self, trip: &HuntingTrip) -> Result<(), StoreError> {
        let path = self.path_for(trip);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed run record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    /// Loads every valid record, oldest first.
    pub fn load_all(&self) -> Result<Vec<HuntingTrip>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let pattern = self.dir.join(format!("{RECORD_PREFIX}*.json"));
        let paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(Result::ok)
            .collect();

        let mut records: Vec<SessionRecord> = paths
            .par_iter()
            .filter_map(|path| match read_record(path) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "removing corrupt run record");
                    if let Err(e) = std::fs::remove_file(path) {
                        tracing::warn!(path = %path.display(), error = %e, "failed to remove corrupt run record");
                    }
                    None
                }
            })
            .collect();
        records.sort_by_key(|record| record.start);

        let newest = records.len().saturating_sub(1);
        let trips: Vec<HuntingTrip> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let detail = if i == newest {
                    Detail::Full
                } else {
                    Detail::Summary
                };
                record.into_trip(detail)
            })
            .collect();
        tracing::info!(count = trips.len(), dir = %self.dir.display(), "loaded runs");
        Ok(trips)
    }

    /// Splits the legacy single-file store into per-run records.
    ///
    /// Returns how many runs were migrated. Every record is written before the
    /// legacy file is removed; `settle` is an extra wait afterwards and may be
    /// zero. Entries that fail to parse are skipped, and an unreadable legacy
    /// file is removed without migrating anything.
    pub fn migrate_legacy(&self, settle: Duration) -> Result<usize, StoreError> {
        let legacy = self.dir.join(LEGACY_FILE);
        let content = match std::fs::read_to_string(&legacy) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_error(&legacy)(e)),
        };

        let mut migrated = 0;
        match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(entries) => {
                for (index, entry) in entries.into_iter().enumerate() {
                    match serde_json::from_value::<SessionRecord>(entry) {
                        Ok(record) => {
                            self.write_record(&record)?;
                            migrated += 1;
                        }
                        Err(e) => {
                            tracing::warn!(index, error = %e, "skipping corrupt legacy run");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %legacy.display(), error = %e, "corrupt legacy run file");
            }
        }

        std::fs::remove_file(&legacy).map_err(io_error(&legacy))?;
        tracing::info!(migrated, "migrated legacy runs");
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
        Ok(migrated)
    }
}

fn read_record(path: &Path) -> Result<SessionRecord, StoreError> {
    let content = std::fs::read_to_string(path).map_err(io_error(path))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use loot_core::{LootEntry, Multipliers};
    use rust_decimal_macros::dec;

    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 9, 21, 9, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn trip_with_loot(start: i64, ended: bool) -> HuntingTrip {
        let mut trip = HuntingTrip::new(at(start), dec!(0.1));
        trip.tt_return = dec!(1.5);
        trip.total_cost = dec!(2);
        trip.looted_items.insert(
            "Animal Hide".to_string(),
            LootEntry {
                count: 3,
                value: dec!(1.5),
            },
        );
        trip.multipliers = Multipliers {
            costs: vec![2.0],
            values: vec![1.5],
        };
        trip.return_over_time = vec![0.75];
        if ended {
            trip.time_end = Some(at(start + 5));
        }
        trip
    }

    #[test]
    fn save_names_file_by_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        let path = store.save(&trip_with_loot(0, true)).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("LootLog_{}.json", at(0).timestamp_millis())
        );
    }

    #[test]
    fn load_all_restores_only_newest_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.save(&trip_with_loot(10, false)).unwrap();
        store.save(&trip_with_loot(0, true)).unwrap();

        let trips = store.load_all().unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].time_start, at(0));
        assert!(trips[0].looted_items.is_empty());
        assert!(trips[0].multipliers.is_empty());
        assert_eq!(trips[0].tt_return, dec!(1.5));

        assert_eq!(trips[1].time_start, at(10));
        assert_eq!(trips[1].looted_items["Animal Hide"].count, 3);
        assert_eq!(trips[1].return_over_time, vec![0.75]);
        assert!(trips[1].is_active());
    }

    #[test]
    fn save_edits_keeps_ledgers_of_summary_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.save(&trip_with_loot(0, true)).unwrap();
        store.save(&trip_with_loot(10, false)).unwrap();

        let mut old = store.load_all().unwrap().remove(0);
        assert!(old.looted_items.is_empty());
        old.notes = "old run".to_string();
        old.extra_spend = dec!(3);
        store.save_edits(&old).unwrap();

        let record = read_record(&store.path_for(&old)).unwrap();
        assert_eq!(record.notes, "old run");
        assert_eq!(record.summary.extra_spend, dec!(3));
        assert_eq!(record.loot["Animal Hide"].c, 3);
        assert_eq!(record.graphs.multis, (vec![2.0], vec![1.5]));
        assert_eq!(record.graphs.returns, vec![0.75]);
    }

    #[test]
    fn save_edits_without_record_saves_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        let trip = trip_with_loot(0, true);
        let path = store.save_edits(&trip).unwrap();
        let record = read_record(&path).unwrap();
        assert_eq!(record.loot["Animal Hide"].v, dec!(1.5));
    }

    #[test]
    fn summary_runs_keep_best_loots() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.save(&trip_with_loot(0, true)).unwrap();
        store.save(&trip_with_loot(10, false)).unwrap();

        let trips = store.load_all().unwrap();
        assert!(trips[0].multipliers.is_empty());
        assert_eq!(trips[0].best_loots(5), vec![1.5]);
    }

    #[test]
    fn corrupt_records_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.save(&trip_with_loot(0, true)).unwrap();
        let corrupt = dir.path().join("LootLog_123.json");
        std::fs::write(&corrupt, "{\"start\": ").unwrap();

        let trips = store.load_all().unwrap();
        assert_eq!(trips.len(), 1);
        assert!(!corrupt.exists());
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().join("nope"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn remove_deletes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        let trip = trip_with_loot(0, true);
        let path = store.save(&trip).unwrap();
        store.remove(&trip).unwrap();
        assert!(!path.exists());
        store.remove(&trip).unwrap();
    }

    #[test]
    fn migrates_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        let records = vec![
            serde_json::to_value(SessionRecord::from_trip(&trip_with_loot(0, true))).unwrap(),
            serde_json::json!({"start": "not a time"}),
            serde_json::to_value(SessionRecord::from_trip(&trip_with_loot(10, true))).unwrap(),
        ];
        std::fs::write(
            dir.path().join(LEGACY_FILE),
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();

        assert_eq!(store.migrate_legacy(Duration::ZERO).unwrap(), 2);
        assert!(!dir.path().join(LEGACY_FILE).exists());
        assert_eq!(store.load_all().unwrap().len(), 2);
        assert_eq!(store.migrate_legacy(Duration::ZERO).unwrap(), 0);
    }

    #[test]
    fn corrupt_legacy_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        std::fs::write(dir.path().join(LEGACY_FILE), "[{").unwrap();
        assert_eq!(store.migrate_legacy(Duration::ZERO).unwrap(), 0);
        assert!(!dir.path().join(LEGACY_FILE).exists());
    }
}
