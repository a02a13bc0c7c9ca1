//! The collection of runs and which one, if any, is active.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::markup::MarkupStore;
use crate::stats::RunSummary;
use crate::trip::HuntingTrip;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no run {0}")]
    UnknownRun(RunId),
}

/// Identity of a run: its start instant, which is also its persistence key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(DateTime<Utc>);

impl RunId {
    pub const fn of(trip: &HuntingTrip) -> Self {
        Self(trip.time_start)
    }

    pub const fn start(self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "started {}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Spend and return summed over every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllReturns {
    pub spend: Decimal,
    pub tt_return: Decimal,
    /// `None` when nothing was spent.
    pub percent: Option<Decimal>,
}

/// All known runs, oldest first, with at most one active.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Vec<HuntingTrip>,
    active: Option<RunId>,
}

impl RunRegistry {
    /// Builds the registry from loaded runs.
    ///
    /// If the newest run was never ended it becomes the active run again; this
    /// is how a run survives a crash or an unclean shutdown.
    pub fn from_loaded(mut runs: Vec<HuntingTrip>) -> Self {
        runs.sort_by_key(|trip| trip.time_start);
        let active = runs
            .last()
            .filter(|trip| trip.is_active())
            .map(RunId::of);
        if let Some(id) = active {
            tracing::info!(run = %id, "resuming unfinished run");
        }
        Self { runs, active }
    }

    /// Runs, oldest first.
    pub fn runs(&self) -> &[HuntingTrip] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, id: RunId) -> Option<&HuntingTrip> {
        self.runs.iter().find(|trip| RunId::of(trip) == id)
    }

    fn get_mut(&mut self, id: RunId) -> Result<&mut HuntingTrip, RegistryError> {
        self.runs
            .iter_mut()
            .find(|trip| RunId::of(trip) == id)
            .ok_or(RegistryError::UnknownRun(id))
    }

    /// The run shown as number `n` in newest-first listings, counting from 1.
    pub fn nth_newest(&self, n: usize) -> Option<RunId> {
        n.checked_sub(1)
            .and_then(|i| self.runs.iter().rev().nth(i))
            .map(RunId::of)
    }

    pub const fn active_id(&self) -> Option<RunId> {
        self.active
    }

    pub fn active(&self) -> Option<&HuntingTrip> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut HuntingTrip> {
        let id = self.active?;
        self.get_mut(id).ok()
    }

    /// Starts a new active run. Any run still active is ended at `start`.
    pub fn start_run(&mut self, start: DateTime<Utc>, cost_per_shot: Decimal) -> RunId {
        self.end_active(start);
        let trip = HuntingTrip::new(start, cost_per_shot);
        let id = RunId::of(&trip);
        tracing::info!(run = %id, %cost_per_shot, "started run");
        self.runs.push(trip);
        self.active = Some(id);
        id
    }

    /// The active run, starting one if there is none.
    pub fn ensure_active(&mut self, now: DateTime<Utc>, cost_per_shot: Decimal) -> &mut HuntingTrip {
        let index = match self.active_index() {
            Some(index) => index,
            None => {
                self.start_run(now, cost_per_shot);
                self.runs.len() - 1
            }
        };
        &mut self.runs[index]
    }

    fn active_index(&self) -> Option<usize> {
        let id = self.active?;
        self.runs.iter().position(|trip| RunId::of(trip) == id)
    }

    /// Ends the active run at `now` and returns it.
    pub fn end_active(&mut self, now: DateTime<Utc>) -> Option<&HuntingTrip> {
        let id = self.active.take()?;
        let trip = self.get_mut(id).ok()?;
        trip.time_end = Some(now);
        tracing::info!(run = %id, "ended run");
        Some(trip)
    }

    /// Removes the given runs and returns them so their records can be dropped.
    ///
    /// If the active run is among them there is no active run afterwards.
    pub fn delete(&mut self, ids: &[RunId]) -> Vec<HuntingTrip> {
        if self.active.is_some_and(|active| ids.contains(&active)) {
            self.active = None;
        }
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.runs)
            .into_iter()
            .partition(|trip| ids.contains(&RunId::of(trip)));
        self.runs = kept;
        removed
    }

    pub fn edit_notes(&mut self, id: RunId, notes: impl Into<String>) -> Result<(), RegistryError> {
        self.get_mut(id)?.notes = notes.into();
        Ok(())
    }

    pub fn set_extra_spend(&mut self, id: RunId, amount: Decimal) -> Result<(), RegistryError> {
        self.get_mut(id)?.extra_spend = amount;
        Ok(())
    }

    /// Sets extra spend from user text. Text that is not a number sets zero.
    /// Returns the value that was stored.
    pub fn parse_extra_spend(&mut self, id: RunId, text: &str) -> Result<Decimal, RegistryError> {
        let amount = Decimal::from_str(text.trim()).unwrap_or_else(|_| {
            tracing::warn!(input = text, "extra spend is not a number, using 0");
            Decimal::ZERO
        });
        self.set_extra_spend(id, amount)?;
        Ok(amount)
    }

    /// Spend (combat plus extra) and TT return over all runs.
    pub fn all_returns(&self) -> AllReturns {
        let spend: Decimal = self.runs.iter().map(HuntingTrip::total_spend).sum();
        let tt_return: Decimal = self.runs.iter().map(|trip| trip.tt_return).sum();
        AllReturns {
            spend,
            tt_return,
            percent: tt_return.checked_div(spend).map(|ratio| ratio * dec!(100)),
        }
    }

    /// The `n` most valuable loot instances across all runs.
    pub fn top_loots(&self, n: usize) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .runs
            .iter()
            .flat_map(|trip| trip.best_loots(n))
            .collect();
        values.sort_by(|a, b| b.total_cmp(a));
        values.truncate(n);
        values
    }

    /// One summary per run, newest first, numbered from 1.
    pub fn summaries(&self, markup: &MarkupStore, now: DateTime<Utc>) -> Vec<(usize, RunSummary)> {
        self.runs
            .iter()
            .rev()
            .enumerate()
            .map(|(i, trip)| (i + 1, trip.summary(markup, now)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 9, 21, 9, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn finished(start: i64) -> HuntingTrip {
        let mut trip = HuntingTrip::new(at(start), dec!(0.1));
        trip.time_end = Some(at(start + 5));
        trip
    }

    #[test]
    fn resumes_unfinished_newest_run() {
        let registry = RunRegistry::from_loaded(vec![
            HuntingTrip::new(at(20), dec!(0.1)),
            finished(0),
            finished(10),
        ]);
        assert_eq!(registry.active().map(|t| t.time_start), Some(at(20)));
        assert_eq!(registry.runs()[0].time_start, at(0));
    }

    #[test]
    fn finished_newest_run_leaves_nothing_active() {
        let registry = RunRegistry::from_loaded(vec![finished(0), finished(10)]);
        assert!(registry.active().is_none());
    }

    #[test]
    fn start_and_end_run() {
        let mut registry = RunRegistry::default();
        let first = registry.start_run(at(0), dec!(0.1));
        assert_eq!(registry.active_id(), Some(first));

        // Starting again ends the previous run.
        let second = registry.start_run(at(10), dec!(0.2));
        assert_eq!(registry.get(first).unwrap().time_end, Some(at(10)));
        assert_eq!(registry.active_id(), Some(second));

        let ended = registry.end_active(at(15)).unwrap();
        assert_eq!(ended.time_end, Some(at(15)));
        assert!(registry.active().is_none());
        assert!(registry.end_active(at(20)).is_none());
    }

    #[test]
    fn ensure_active_reuses_or_creates() {
        let mut registry = RunRegistry::default();
        registry.ensure_active(at(0), dec!(0.1)).notes = "first".to_string();
        let trip = registry.ensure_active(at(5), dec!(0.2));
        assert_eq!(trip.notes, "first");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn deleting_active_run_clears_active() {
        let mut registry = RunRegistry::from_loaded(vec![finished(0)]);
        let active = registry.start_run(at(10), dec!(0.1));
        let removed = registry.delete(&[active]);
        assert_eq!(removed.len(), 1);
        assert!(registry.active().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn deleting_other_run_keeps_active() {
        let mut registry = RunRegistry::from_loaded(vec![finished(0)]);
        let active = registry.start_run(at(10), dec!(0.1));
        let old = registry.nth_newest(2).unwrap();
        registry.delete(&[old]);
        assert_eq!(registry.active_id(), Some(active));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn numbers_count_from_newest() {
        let registry = RunRegistry::from_loaded(vec![finished(0), finished(10)]);
        assert_eq!(registry.nth_newest(1).map(RunId::start), Some(at(10)));
        assert_eq!(registry.nth_newest(2).map(RunId::start), Some(at(0)));
        assert_eq!(registry.nth_newest(0), None);
        assert_eq!(registry.nth_newest(3), None);
    }

    #[test]
    fn malformed_extra_spend_reverts_to_zero() {
        let mut registry = RunRegistry::from_loaded(vec![finished(0)]);
        let id = registry.nth_newest(1).unwrap();
        assert_eq!(registry.parse_extra_spend(id, " 12.5 ").unwrap(), dec!(12.5));
        assert_eq!(registry.parse_extra_spend(id, "twelve").unwrap(), Decimal::ZERO);
        assert_eq!(registry.get(id).unwrap().extra_spend, Decimal::ZERO);

        registry.edit_notes(id, "crafting").unwrap();
        assert_eq!(registry.get(id).unwrap().notes, "crafting");

        let missing = RunId::of(&finished(99));
        assert_eq!(
            registry.edit_notes(missing, "x"),
            Err(RegistryError::UnknownRun(missing))
        );
    }

    #[test]
    fn cross_run_stats() {
        let mut a = finished(0);
        a.total_cost = dec!(10);
        a.tt_return = dec!(9);
        a.multipliers.values = vec![1.0, 7.5];
        let mut b = finished(10);
        b.total_cost = dec!(10);
        b.tt_return = dec!(12);
        b.multipliers.values = vec![3.0, 0.5];
        b.extra_spend = dec!(5);
        // Loaded without graphs; only the saved best values remain.
        let mut c = finished(20);
        c.saved_best_loots = vec![4.0, 2.0];
        let registry = RunRegistry::from_loaded(vec![a, b, c]);

        let returns = registry.all_returns();
        assert_eq!(returns.spend, dec!(25));
        assert_eq!(returns.percent, Some(dec!(84)));
        assert_eq!(registry.top_loots(3), vec![7.5, 4.0, 3.0]);

        assert_eq!(RunRegistry::default().all_returns().percent, None);
    }
}
