//! Player-declared markup over TT value.
//!
//! The store is an ordinary value owned by whoever needs it and passed by
//! reference to statistics that depend on it. Mutations persist immediately
//! when the store was loaded from a file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns::SHRAPNEL;

/// Errors from parsing or persisting markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("invalid markup {0:?}: expected e.g. 101%, 1.01 or +0.05")]
    Invalid(String),

    #[error("failed to write markup file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize markup: {0}")]
    Json(#[from] serde_json::Error),
}

/// Markup for one item.
///
/// A relative entry multiplies the TT value (1.01 is +1%); an absolute entry
/// adds `value` per unit looted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredEntry", into = "StoredEntry")]
pub struct MarkupEntry {
    pub value: Decimal,
    pub is_absolute: bool,
}

/// On-disk shape: `["1.01", false]`.
#[derive(Serialize, Deserialize)]
struct StoredEntry(Decimal, bool);

impl From<StoredEntry> for MarkupEntry {
    fn from(StoredEntry(value, is_absolute): StoredEntry) -> Self {
        Self { value, is_absolute }
    }
}

impl From<MarkupEntry> for StoredEntry {
    fn from(entry: MarkupEntry) -> Self {
        Self(entry.value, entry.is_absolute)
    }
}

impl MarkupEntry {
    /// Pass-through markup used for items the player never priced.
    pub const DEFAULT: Self = Self::relative(Decimal::ONE);

    pub const fn relative(value: Decimal) -> Self {
        Self {
            value,
            is_absolute: false,
        }
    }

    pub const fn absolute(value: Decimal) -> Self {
        Self {
            value,
            is_absolute: true,
        }
    }

    /// Markup-adjusted value of `count` units worth `tt_value` in total.
    pub fn apply(self, count: u64, tt_value: Decimal) -> Decimal {
        if self.is_absolute {
            tt_value + Decimal::from(count) * self.value
        } else {
            tt_value * self.value
        }
    }
}

impl Default for MarkupEntry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MarkupEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absolute {
            write!(f, "+{:.3}", self.value)
        } else {
            write!(f, "{:.3}%", self.value * dec!(100))
        }
    }
}

impl FromStr for MarkupEntry {
    type Err = MarkupError;

    /// Parses user text: `+0.05` is absolute, `101%` and `1.01` are relative.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || MarkupError::Invalid(s.to_string());
        if let Some(rest) = text.strip_prefix('+') {
            let value = Decimal::from_str(rest.trim()).map_err(|_| invalid())?;
            Ok(Self::absolute(value))
        } else if let Some(rest) = text.strip_suffix('%') {
            let percent = Decimal::from_str(rest.trim()).map_err(|_| invalid())?;
            Ok(Self::relative(percent / dec!(100)))
        } else {
            let value = Decimal::from_str(text).map_err(|_| invalid())?;
            Ok(Self::relative(value))
        }
    }
}

/// Item name to markup, with optional backing file.
#[derive(Debug, Clone)]
pub struct MarkupStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, MarkupEntry>,
}

fn builtin_entries() -> BTreeMap<String, MarkupEntry> {
    BTreeMap::from([(SHRAPNEL.to_string(), MarkupEntry::relative(dec!(1.01)))])
}

impl Default for MarkupStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl MarkupStore {
    /// A store with built-in defaults that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: builtin_entries(),
        }
    }

    /// Loads the store from `path`.
    ///
    /// A missing file yields the built-in defaults. A file that cannot be read
    /// or parsed is reported with a warning and also yields the defaults; it is
    /// overwritten on the next [`set`](Self::set).
    pub fn load(path: &Path) -> Self {
        let mut entries = builtin_entries();
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, MarkupEntry>>(&content) {
                Ok(saved) => entries.extend(saved),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt markup file, using defaults");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read markup file, using defaults");
            }
        }
        Self {
            path: Some(path.to_path_buf()),
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Markup for `name`, or the pass-through default.
    pub fn get(&self, name: &str) -> MarkupEntry {
        self.entries.get(name).copied().unwrap_or_default()
    }

    /// Sets markup for `name` and persists the store.
    pub fn set(&mut self, name: impl Into<String>, entry: MarkupEntry) -> Result<(), MarkupError> {
        self.entries.insert(name.into(), entry);
        self.save()
    }

    /// Parses user text and stores it. On a parse error nothing changes and
    /// the prior entry stays in effect.
    pub fn set_from_text(&mut self, name: &str, text: &str) -> Result<MarkupEntry, MarkupError> {
        let entry: MarkupEntry = text.parse()?;
        self.set(name, entry)?;
        Ok(entry)
    }

    /// Markup-adjusted value for `count` units of `name` worth `tt_value`.
    pub fn apply(&self, name: &str, count: u64, tt_value: Decimal) -> Decimal {
        self.get(name).apply(count, tt_value)
    }

    /// Display form of the markup for `name` (`+0.050` or `101.000%`).
    pub fn format(&self, name: &str) -> String {
        self.get(name).to_string()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, MarkupEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), *entry))
    }

    /// Writes the store to its file, if it has one.
    pub fn save(&self) -> Result<(), MarkupError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
