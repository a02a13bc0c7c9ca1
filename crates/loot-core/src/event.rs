//! Typed events recognised in the chat log.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// A classified chat line.
///
/// The payload is fixed at construction; `time` is the envelope timestamp of
/// the line the event came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    time: NaiveDateTime,
    kind: EventKind,
}

impl Event {
    pub const fn new(time: NaiveDateTime, kind: EventKind) -> Self {
        Self { time, kind }
    }

    pub const fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Seconds since the epoch, reading the log clock as if it were UTC.
    ///
    /// Only differences and 2-second buckets are derived from this value, and
    /// every real timezone offset is a whole number of even seconds, so the
    /// local zone never changes a result.
    pub fn unix_seconds(&self) -> i64 {
        self.time.and_utc().timestamp()
    }
}

/// The kind of activity a line describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The player healed themselves.
    Heal { amount: f64 },
    /// One attack: a hit (possibly critical) or a miss.
    Combat {
        amount: f64,
        critical: bool,
        miss: bool,
    },
    /// Experience gained in a skill or attribute.
    Skill { amount: Decimal, skill: String },
    /// An enhancer on the equipped tool broke.
    EnhancerBreak { enhancer: String },
    /// One line of received loot.
    Loot {
        item: String,
        quantity: u64,
        value: Decimal,
    },
    /// A global (or hall of fame) broadcast.
    Global {
        actor: String,
        subject: String,
        value: Decimal,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        hall_of_fame: bool,
    },
    /// Recognised line without a payload.
    Marker { marker: Marker },
}

/// Payload-free combat notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Deflect,
    Evade,
    DamageTaken,
}

impl EventKind {
    /// Short name used in logs and diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Heal { .. } => "heal",
            Self::Combat { .. } => "combat",
            Self::Skill { .. } => "skill",
            Self::EnhancerBreak { .. } => "enhancer",
            Self::Loot { .. } => "loot",
            Self::Global { .. } => "global",
            Self::Marker { .. } => "marker",
        }
    }
}
