//! On-disk shape of one run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use loot_core::{BEST_LOOTS_KEPT, HuntingTrip, LootEntry, Multipliers};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// How much of a record to restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Loot ledger and graph series included.
    Full,
    /// Totals and counters only.
    Summary,
}

/// A serialized [`HuntingTrip`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(with = "crate::serde_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(with = "crate::serde_timestamp::option", default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    pub config: RecordConfig,
    pub summary: RecordSummary,
    #[serde(default)]
    pub loot: BTreeMap<String, RecordLoot>,
    #[serde(default)]
    pub skills: BTreeMap<String, f64>,
    #[serde(default)]
    pub skillprocs: BTreeMap<String, u64>,
    #[serde(default)]
    pub enhancers: BTreeMap<String, u64>,
    pub combat: RecordCombat,
    #[serde(default)]
    pub graphs: RecordGraphs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    pub cps: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub tt_return: Decimal,
    /// Missing in older records; rebuilt from `cps * attacks`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub extra_spend: Decimal,
    #[serde(default)]
    pub globals: u64,
    #[serde(default)]
    pub hofs: u64,
    #[serde(default)]
    pub loots: u64,
    #[serde(default)]
    pub adj_cost: Decimal,
    #[serde(default)]
    pub cached_mu_return: Decimal,
    /// Largest loot instance values, descending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_loots: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLoot {
    #[serde(with = "crate::serde_count")]
    pub c: u64,
    pub v: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordCombat {
    pub attacks: u64,
    pub dmg: f64,
    pub crits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordGraphs {
    #[serde(default)]
    pub returns: Vec<f64>,
    /// `[costs, values]`.
    #[serde(default)]
    pub multis: (Vec<f64>, Vec<f64>),
}

impl SessionRecord {
    pub fn from_trip(trip: &HuntingTrip) -> Self {
        Self {
            start: trip.time_start,
            end: trip.time_end,
            notes: trip.notes.clone(),
            config: RecordConfig {
                cps: trip.cost_per_shot,
            },
            summary: RecordSummary {
                tt_return: trip.tt_return,
                total_cost: Some(trip.total_cost),
                extra_spend: trip.extra_spend,
                globals: trip.globals,
                hofs: trip.hofs,
                loots: trip.loot_instances,
                adj_cost: trip.adjusted_cost,
                cached_mu_return: trip.cached_total_return_mu,
                top_loots: trip.best_loots(BEST_LOOTS_KEPT),
            },
            loot: trip
                .looted_items
                .iter()
                .map(|(name, entry)| {
                    let loot = RecordLoot {
                        c: entry.count,
                        v: entry.value,
                    };
                    (name.clone(), loot)
                })
                .collect(),
            skills: trip
                .skill_gains
                .iter()
                .map(|(skill, gain)| (skill.clone(), gain.to_f64().unwrap_or_default()))
                .collect(),
            skillprocs: trip.skill_procs.clone(),
            enhancers: trip.enhancer_breaks.clone(),
            combat: RecordCombat {
                attacks: trip.combat.attacks,
                dmg: trip.combat.damage,
                crits: trip.combat.crits,
                misses: trip.combat.misses,
            },
            graphs: RecordGraphs {
                returns: trip.return_over_time.clone(),
                multis: (
                    trip.multipliers.costs.clone(),
                    trip.multipliers.values.clone(),
                ),
            },
        }
    }

    /// Rebuilds the trip. With [`Detail::Summary`] the loot ledger and graph
    /// series stay empty, so markup return falls back to the cached figure.
    pub fn into_trip(self, detail: Detail) -> HuntingTrip {
        let mut trip = HuntingTrip::new(self.start, self.config.cps);
        trip.time_end = self.end;
        trip.notes = self.notes;

        trip.tt_return = self.summary.tt_return;
        trip.total_cost = self
            .summary
            .total_cost
            .unwrap_or_else(|| self.config.cps * Decimal::from(self.combat.attacks));
        trip.extra_spend = self.summary.extra_spend;
        trip.globals = self.summary.globals;
        trip.hofs = self.summary.hofs;
        trip.loot_instances = self.summary.loots;
        trip.adjusted_cost = self.summary.adj_cost;
        trip.cached_total_return_mu = self.summary.cached_mu_return;
        trip.saved_best_loots = self.summary.top_loots;

        trip.combat.attacks = self.combat.attacks;
        trip.combat.damage = self.combat.dmg;
        trip.combat.crits = self.combat.crits;
        trip.combat.misses = self.combat.misses;

        trip.skill_gains = self
            .skills
            .into_iter()
            .map(|(skill, gain)| (skill, Decimal::from_f64(gain).unwrap_or_default()))
            .collect();
        trip.skill_procs = self.skillprocs;
        trip.enhancer_breaks = self.enhancers;

        if detail == Detail::Full {
            trip.looted_items = self
                .loot
                .into_iter()
                .map(|(name, loot)| {
                    let entry = LootEntry {
                        count: loot.c,
                        value: loot.v,
                    };
                    (name, entry)
                })
                .collect();
            trip.return_over_time = self.graphs.returns;
            let (costs, values) = self.graphs.multis;
            trip.multipliers = Multipliers { costs, values };
        }
        trip
    }
}
