//! Session aggregate: one hunting trip and the event fold that updates it.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::event::{Event, EventKind};
use crate::patterns::SHRAPNEL;

/// Width of the loot bucketing window in seconds.
pub const LOOT_BUCKET_SECS: i64 = 2;

/// How many of a trip's largest loot instances outlive its graph series.
pub const BEST_LOOTS_KEPT: usize = 10;

/// Loot that is credited to the ledger but never counted at all.
const IGNORED_LOOT: &str = "Universal Ammo";

/// Loot that never opens a new loot instance.
const NON_INSTANCE_LOOT: &str = "Vibrant Sweat";

/// Shrapnel stack sizes produced by enhancer breaks rather than kills.
const ENHANCER_SHRAPNEL: [u64; 3] = [4000, 6000, 8000];

/// Accumulated count and TT value of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LootEntry {
    pub count: u64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CombatLedger {
    pub attacks: u64,
    pub damage: f64,
    pub crits: u64,
    pub misses: u64,
}

/// Per-instance (cost, value) pairs, kept as two parallel series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Multipliers {
    pub costs: Vec<f64>,
    pub values: Vec<f64>,
}

impl Multipliers {
    pub fn len(&self) -> usize {
        self.costs.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value over cost for each recorded instance.
    pub fn ratios(&self) -> impl Iterator<Item = f64> + '_ {
        self.costs
            .iter()
            .zip(&self.values)
            .map(|(cost, value)| value / cost)
    }
}

/// The loot instance currently being filled.
#[derive(Debug, Clone, Default, PartialEq)]
struct LootBucket {
    /// Bucket index (`unix_seconds / 2`) of the last instance opened.
    last: Option<i64>,
    cost: Decimal,
    value: Decimal,
}

/// One continuous logging period with its own ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct HuntingTrip {
    /// Creation instant; also the persistence key.
    pub time_start: DateTime<Utc>,
    /// `None` while the run is active.
    pub time_end: Option<DateTime<Utc>>,
    pub notes: String,

    pub cost_per_shot: Decimal,
    pub total_cost: Decimal,
    pub extra_spend: Decimal,
    pub adjusted_cost: Decimal,

    pub looted_items: BTreeMap<String, LootEntry>,
    pub tt_return: Decimal,
    pub loot_instances: u64,
    pub multipliers: Multipliers,
    pub return_over_time: Vec<f64>,

    pub combat: CombatLedger,
    pub skill_gains: BTreeMap<String, Decimal>,
    pub skill_procs: BTreeMap<String, u64>,
    pub enhancer_breaks: BTreeMap<String, u64>,

    pub globals: u64,
    pub hofs: u64,

    /// Markup-adjusted return as of the last time loot detail was available.
    pub cached_total_return_mu: Decimal,
    /// Largest instance values as last saved, descending. Stands in for
    /// `multipliers.values` when the graphs were not loaded.
    pub saved_best_loots: Vec<f64>,

    bucket: LootBucket,
}

impl HuntingTrip {
    /// Starts an empty trip. `time_start` is truncated to milliseconds so it
    /// survives a save and reload unchanged.
    pub fn new(time_start: DateTime<Utc>, cost_per_shot: Decimal) -> Self {
        Self {
            time_start: time_start.trunc_subsecs(3),
            time_end: None,
            notes: String::new(),
            cost_per_shot,
            total_cost: Decimal::ZERO,
            extra_spend: Decimal::ZERO,
            adjusted_cost: Decimal::ZERO,
            looted_items: BTreeMap::new(),
            tt_return: Decimal::ZERO,
            loot_instances: 0,
            multipliers: Multipliers::default(),
            return_over_time: Vec::new(),
            combat: CombatLedger::default(),
            skill_gains: BTreeMap::new(),
            skill_procs: BTreeMap::new(),
            enhancer_breaks: BTreeMap::new(),
            globals: 0,
            hofs: 0,
            cached_total_return_mu: Decimal::ZERO,
            saved_best_loots: Vec::new(),
            bucket: LootBucket::default(),
        }
    }

    /// The `n` largest loot instance values, descending.
    pub fn best_loots(&self, n: usize) -> Vec<f64> {
        if self.multipliers.values.is_empty() {
            return self.saved_best_loots.iter().copied().take(n).collect();
        }
        let mut values = self.multipliers.values.clone();
        values.sort_by(|a, b| b.total_cmp(a));
        values.truncate(n);
        values
    }

    pub const fn is_active(&self) -> bool {
        self.time_end.is_none()
    }

    /// Folds one event into the ledgers. Returns whether any ledger changed.
    pub fn add(&mut self, event: &Event) -> bool {
        match event.kind() {
            EventKind::Combat {
                amount,
                critical,
                miss,
            } => {
                self.combat.attacks += 1;
                self.combat.damage += *amount;
                if *critical {
                    self.combat.crits += 1;
                }
                if *miss {
                    self.combat.misses += 1;
                }
                self.bucket.cost += self.cost_per_shot;
                self.total_cost += self.cost_per_shot;
                true
            }
            EventKind::Heal { .. } | EventKind::Marker { .. } => false,
            EventKind::Skill { amount, skill } => {
                *self.skill_gains.entry(skill.clone()).or_default() += *amount;
                *self.skill_procs.entry(skill.clone()).or_default() += 1;
                true
            }
            EventKind::EnhancerBreak { enhancer } => {
                *self.enhancer_breaks.entry(enhancer.clone()).or_default() += 1;
                true
            }
            EventKind::Loot {
                item,
                quantity,
                value,
            } => self.add_loot(event.unix_seconds(), item, *quantity, *value),
            EventKind::Global { hall_of_fame, .. } => {
                if *hall_of_fame {
                    self.hofs += 1;
                } else {
                    self.globals += 1;
                }
                true
            }
        }
    }

    /// Folds every event, returning how many changed a ledger.
    pub fn add_all<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> usize {
        events.into_iter().filter(|event| self.add(event)).count()
    }

    fn add_loot(&mut self, unix_seconds: i64, item: &str, quantity: u64, value: Decimal) -> bool {
        if item == IGNORED_LOOT {
            return false;
        }

        let bucket = unix_seconds.div_euclid(LOOT_BUCKET_SECS);
        if self.bucket.last != Some(bucket) && opens_instance(item, quantity) {
            self.open_instance(bucket);
        }

        self.tt_return += value;
        let entry = self.looted_items.entry(item.to_string()).or_default();
        entry.count += quantity;
        entry.value += value;
        self.bucket.value += value;
        true
    }

    /// Starts a new loot instance, closing out the previous one if it had
    /// both cost and value.
    fn open_instance(&mut self, bucket: i64) {
        self.bucket.last = Some(bucket);
        self.loot_instances += 1;

        if self.bucket.value.is_zero() || self.bucket.cost.is_zero() {
            return;
        }
        self.multipliers
            .costs
            .push(self.bucket.cost.to_f64().unwrap_or_default());
        self.multipliers
            .values
            .push(self.bucket.value.to_f64().unwrap_or_default());
        self.bucket.cost = Decimal::ZERO;
        self.bucket.value = Decimal::ZERO;

        if let Some(ratio) = self.tt_return.checked_div(self.total_cost) {
            self.return_over_time.push(ratio.to_f64().unwrap_or_default());
        }
    }
}

fn opens_instance(item: &str, quantity: u64) -> bool {
    let enhancer_byproduct = item == NON_INSTANCE_LOOT
        || (item == SHRAPNEL && ENHANCER_SHRAPNEL.contains(&quantity));
    !enhancer_byproduct
}
