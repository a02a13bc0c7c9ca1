//! Lists every run, newest first.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use loot_core::{AllReturns, MarkupStore, RunRegistry, RunSummary};
use rust_decimal::Decimal;
use serde::Serialize;

use super::util::{ped, percent};
use crate::Config;
use crate::tracker::Tracker;

/// How many of the best loot instances the listing shows.
const TOP_LOOTS: usize = 5;

#[derive(Serialize)]
struct JsonRun<'a> {
    number: usize,
    active: bool,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

#[derive(Serialize)]
struct JsonTotals {
    spend: Decimal,
    tt_return: Decimal,
    return_perc: Option<Decimal>,
    top_loots: Vec<f64>,
}

#[derive(Serialize)]
struct JsonRuns<'a> {
    runs: Vec<JsonRun<'a>>,
    totals: JsonTotals,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool, now: DateTime<Utc>) -> Result<()> {
    let tracker = Tracker::open(config)?;
    if json {
        writeln!(writer, "{}", format_json(tracker.registry(), tracker.markup(), now)?)?;
    } else {
        write!(writer, "{}", format_table(tracker.registry(), tracker.markup(), now))?;
    }
    Ok(())
}

/// The runs table with cross-run totals underneath.
pub fn format_table(registry: &RunRegistry, markup: &MarkupStore, now: DateTime<Utc>) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    if registry.is_empty() {
        output.push_str("No runs recorded.\n");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>3}  {:<19}  {:>9}  {:>9}  {:>9}  {:>8}  {:>9}  {:>8}  NOTES",
        "#", "START", "DURATION", "SPEND", "TT", "TT %", "MU", "MU %"
    );
    for (number, summary) in registry.summaries(markup, now) {
        let marker = if summary.end.is_none() { "*" } else { "" };
        let label = format!("{marker}{number}");
        let start = summary.start.format("%Y-%m-%d %H:%M:%S").to_string();
        let line = format!(
            "{label:>3}  {start:<19}  {:>9}  {:>9}  {:>9}  {:>8}  {:>9}  {:>8}  {}",
            summary.duration,
            ped(summary.spend + summary.extra_spend),
            ped(summary.tt_return),
            percent(summary.return_perc),
            ped(summary.mu_return),
            percent(summary.mu_perc),
            summary.notes
        );
        let _ = writeln!(output, "{}", line.trim_end());
    }

    let AllReturns {
        spend,
        tt_return,
        percent: all_percent,
    } = registry.all_returns();
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "All runs: {} PED spent, {} PED returned ({})",
        ped(spend),
        ped(tt_return),
        percent(all_percent)
    );
    let top = registry.top_loots(TOP_LOOTS);
    if !top.is_empty() {
        let values: Vec<String> = top.iter().map(|v| format!("{v:.2}")).collect();
        let _ = writeln!(output, "Best loots: {} PED", values.join(", "));
    }
    output
}

/// The runs and totals as pretty JSON.
pub fn format_json(registry: &RunRegistry, markup: &MarkupStore, now: DateTime<Utc>) -> Result<String> {
    let summaries = registry.summaries(markup, now);
    let runs = summaries
        .iter()
        .map(|(number, summary)| JsonRun {
            number: *number,
            active: summary.end.is_none(),
            summary,
        })
        .collect();
    let returns = registry.all_returns();
    let report = JsonRuns {
        runs,
        totals: JsonTotals {
            spend: returns.spend,
            tt_return: returns.tt_return,
            return_perc: returns.percent,
            top_loots: registry.top_loots(TOP_LOOTS),
        },
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
