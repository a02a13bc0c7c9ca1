//! Core domain logic for the loot logger.
//!
//! This crate contains:
//! - Classification: chat log envelope, ordered message patterns, typed events
//! - Aggregation: folding events into a [`HuntingTrip`] and the statistics
//!   derived from it
//! - Valuation: player markup and weapon loadout cost
//! - Bookkeeping: the [`RunRegistry`] of past and active runs

mod classify;
pub mod envelope;
mod error;
pub mod event;
pub mod loadout;
pub mod markup;
pub mod patterns;
mod registry;
mod stats;
mod trip;

pub use classify::{Classification, classify, classify_detailed};
pub use envelope::{Channel, LogEnvelope};
pub use error::ParseError;
pub use event::{Event, EventKind, Marker};
pub use loadout::{EnhancerCount, Loadout, LoadoutError, ToolCatalog, ToolStats};
pub use markup::{MarkupEntry, MarkupError, MarkupStore};
pub use registry::{AllReturns, RegistryError, RunId, RunRegistry};
pub use stats::{EnhancerRow, LootRow, RunSummary, SkillRow, format_duration};
pub use trip::{BEST_LOOTS_KEPT, CombatLedger, HuntingTrip, LootEntry, Multipliers};
