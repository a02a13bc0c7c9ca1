//! Statistics derived on demand from a trip's ledgers.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::markup::MarkupStore;
use crate::trip::HuntingTrip;

/// One row of the loot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LootRow {
    pub item: String,
    pub value: Decimal,
    pub count: u64,
    /// Display form of the item's markup.
    pub markup: String,
    pub total_value: Decimal,
}

/// One row of the skill table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillRow {
    pub skill: String,
    pub gain: Decimal,
    pub procs: u64,
    /// Share of all procs, as a whole percent.
    pub proc_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancerRow {
    pub enhancer: String,
    pub breaks: u64,
}

/// Headline figures for one run, as shown in the runs table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub notes: String,
    pub duration: String,
    pub spend: Decimal,
    pub extra_spend: Decimal,
    pub enhancer_breaks: u64,
    pub tt_return: Decimal,
    /// `None` when nothing was spent.
    pub return_perc: Option<Decimal>,
    pub mu_return: Decimal,
    /// `None` when nothing was spent.
    pub mu_perc: Option<Decimal>,
    pub loot_instances: u64,
    pub globals: u64,
    pub hofs: u64,
}

fn percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "0.00%".to_string();
    }
    #[expect(clippy::cast_precision_loss, reason = "attack counts fit in f64")]
    let ratio = part as f64 / whole as f64 * 100.0;
    format!("{ratio:.2}%")
}

/// Formats a duration as `H:MM:SS`. Negative durations read as zero.
pub fn format_duration(duration: TimeDelta) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

impl HuntingTrip {
    /// Misses over attacks, e.g. `"12.50%"`.
    pub fn miss_chance(&self) -> String {
        percent(self.combat.misses, self.combat.attacks)
    }

    /// Critical hits over attacks, e.g. `"3.00%"`.
    pub fn crit_chance(&self) -> String {
        percent(self.combat.crits, self.combat.attacks)
    }

    /// Combat cost plus manually entered spend.
    pub fn total_spend(&self) -> Decimal {
        self.total_cost + self.extra_spend
    }

    /// Damage per PED spent. The spend is scaled to PEC (1/100 PED).
    pub fn dpp(&self) -> Decimal {
        if self.total_cost <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let damage = Decimal::from_f64(self.combat.damage).unwrap_or_default();
        damage
            .checked_div(self.total_spend() * dec!(100))
            .unwrap_or_default()
    }

    /// Return adjusted by each item's markup.
    ///
    /// A trip loaded without loot detail reports the cached figure instead.
    pub fn total_return_mu(&self, markup: &MarkupStore) -> Decimal {
        if self.looted_items.is_empty() {
            return self.cached_total_return_mu;
        }
        self.looted_items
            .iter()
            .map(|(name, entry)| markup.apply(name, entry.count, entry.value))
            .sum()
    }

    /// Markup-adjusted return as a percentage of spend, 0 when nothing was spent.
    pub fn total_return_mu_perc(&self, markup: &MarkupStore) -> Decimal {
        ratio_percent(self.total_return_mu(markup), self.total_spend()).unwrap_or_default()
    }

    /// TT return as a percentage of spend, 0 when nothing was spent.
    pub fn tt_return_perc(&self) -> Decimal {
        ratio_percent(self.tt_return, self.total_spend()).unwrap_or_default()
    }

    /// Recomputes the cached markup return from the current loot detail.
    pub fn refresh_cached_return_mu(&mut self, markup: &MarkupStore) {
        if !self.looted_items.is_empty() {
            self.cached_total_return_mu = self.total_return_mu(markup);
        }
    }

    pub fn total_enhancer_breaks(&self) -> u64 {
        self.enhancer_breaks.values().sum()
    }

    pub fn total_skill_gain(&self) -> Decimal {
        self.skill_gains.values().sum()
    }

    /// Elapsed time until `time_end`, or until `now` while active.
    pub fn duration(&self, now: DateTime<Utc>) -> TimeDelta {
        self.time_end.unwrap_or(now) - self.time_start
    }

    /// Loot rows, most valuable first.
    pub fn loot_table(&self, markup: &MarkupStore) -> Vec<LootRow> {
        let mut rows: Vec<LootRow> = self
            .looted_items
            .iter()
            .map(|(name, entry)| LootRow {
                item: name.clone(),
                value: entry.value,
                count: entry.count,
                markup: markup.format(name),
                total_value: markup.apply(name, entry.count, entry.value),
            })
            .collect();
        rows.sort_by(|a, b| b.value.cmp(&a.value));
        rows
    }

    /// Skill rows, largest gain first.
    pub fn skill_table(&self) -> Vec<SkillRow> {
        let total_procs: u64 = self.skill_procs.values().sum();
        let mut rows: Vec<SkillRow> = self
            .skill_gains
            .iter()
            .map(|(skill, gain)| {
                let procs = self.skill_procs.get(skill).copied().unwrap_or_default();
                let proc_percent = ratio_percent(Decimal::from(procs), Decimal::from(total_procs))
                    .unwrap_or_default()
                    .round_dp(0);
                SkillRow {
                    skill: skill.clone(),
                    gain: *gain,
                    procs,
                    proc_percent,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.gain.cmp(&a.gain));
        rows
    }

    /// Enhancer rows, most breaks first.
    pub fn enhancer_table(&self) -> Vec<EnhancerRow> {
        let mut rows: Vec<EnhancerRow> = self
            .enhancer_breaks
            .iter()
            .map(|(enhancer, breaks)| EnhancerRow {
                enhancer: enhancer.clone(),
                breaks: *breaks,
            })
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.breaks));
        rows
    }

    pub fn summary(&self, markup: &MarkupStore, now: DateTime<Utc>) -> RunSummary {
        let spend = self.total_spend();
        let mu_return = self.total_return_mu(markup);
        RunSummary {
            start: self.time_start,
            end: self.time_end,
            notes: self.notes.clone(),
            duration: format_duration(self.duration(now)),
            spend: self.total_cost,
            extra_spend: self.extra_spend,
            enhancer_breaks: self.total_enhancer_breaks(),
            tt_return: self.tt_return,
            return_perc: ratio_percent(self.tt_return, spend),
            mu_return,
            mu_perc: ratio_percent(mu_return, spend),
            loot_instances: self.loot_instances,
            globals: self.globals,
            hofs: self.hofs,
        }
    }
}

/// `part / whole * 100`, or `None` when `whole` is zero.
fn ratio_percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole).map(|ratio| ratio * dec!(100))
}
