//! Pattern-gap report for a chat log.
//!
//! Classifies every line of a log and groups the `System` and `Globals`
//! messages no pattern recognised, with digits folded so that messages
//! differing only in amounts land in one group.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use loot_core::{Classification, classify_detailed};

use crate::tailer::decode_line;

/// How many unmatched message shapes the report lists.
const MAX_GAPS: usize = 20;

#[derive(Debug, Default)]
pub struct GapReport {
    pub lines: usize,
    pub ignored: usize,
    pub events: BTreeMap<&'static str, usize>,
    /// `(channel, message shape)` to occurrences.
    pub unmatched: BTreeMap<(String, String), usize>,
}

impl GapReport {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut report = Self::default();
        for line in lines {
            report.lines += 1;
            match classify_detailed(line) {
                Classification::Event(event) => {
                    *report.events.entry(event.kind().name()).or_default() += 1;
                }
                Classification::Unmatched {
                    channel, message, ..
                } => {
                    *report
                        .unmatched
                        .entry((channel.to_string(), message_shape(&message)))
                        .or_default() += 1;
                }
                Classification::Ignored => report.ignored += 1,
            }
        }
        report
    }

    pub fn event_count(&self) -> usize {
        self.events.values().sum()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.values().sum()
    }
}

pub fn run<W: Write>(writer: &mut W, file: &Path) -> Result<()> {
    let raw = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let report = GapReport::from_lines(raw.split(|b| *b == b'\n').filter_map(decode_line));
    write_report(writer, &report)
}

pub fn write_report<W: Write>(writer: &mut W, report: &GapReport) -> Result<()> {
    writeln!(writer, "Lines:     {}", report.lines)?;
    writeln!(writer, "Events:    {}", report.event_count())?;
    for (kind, count) in &report.events {
        writeln!(writer, "  {kind:<10} {count}")?;
    }
    writeln!(writer, "Ignored:   {}", report.ignored)?;
    writeln!(writer, "Unmatched: {}", report.unmatched_count())?;

    if report.unmatched.is_empty() {
        return Ok(());
    }
    let mut gaps: Vec<_> = report.unmatched.iter().collect();
    gaps.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    writeln!(writer)?;
    writeln!(writer, "UNMATCHED")?;
    for ((channel, shape), count) in gaps.iter().take(MAX_GAPS) {
        writeln!(writer, "{count:>6}  [{channel}] {shape}")?;
    }
    if gaps.len() > MAX_GAPS {
        writeln!(writer, "   ... and {} more", gaps.len() - MAX_GAPS)?;
    }
    Ok(())
}

/// The message with every run of digits replaced by `#`.
fn message_shape(message: &str) -> String {
    let mut shape = String::with_capacity(message.len());
    let mut in_number = false;
    for c in message.chars() {
        if c.is_ascii_digit() {
            if !in_number {
                shape.push('#');
            }
            in_number = true;
        } else {
            shape.push(c);
            in_number = false;
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn folds_numbers_in_shapes() {
        assert_eq!(
            message_shape("You have claimed a resource! (Lysterium Stone 12.5)"),
            "You have claimed a resource! (Lysterium Stone #.#)"
        );
    }

    #[test]
    fn reports_gaps_most_frequent_first() {
        let log = [
            "2021-09-21 09:42:30 [System] [] You inflicted 120.5 points of damage",
            "2021-09-21 09:42:31 [System] [] You missed",
            "2021-09-21 09:42:32 [System] [] Your Evade attribute was boosted by 3",
            "2021-09-21 09:42:33 [System] [] Your Evade attribute was boosted by 12",
            "2021-09-21 09:42:34 [System] [] You are now logged in",
            "2021-09-21 09:42:35 [Rookie] [Someone] hello",
            "not a chat line",
        ];
        let report = GapReport::from_lines(log);
        let mut output = Vec::new();
        write_report(&mut output, &report).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Lines:     7
        Events:    2
          combat     2
        Ignored:   2
        Unmatched: 3

        UNMATCHED
             2  [System] Your Evade attribute was boosted by #
             1  [System] You are now logged in
        ");
    }
}
