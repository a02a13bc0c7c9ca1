//! Shows and edits item markup.

use std::io::Write;

use anyhow::{Context, Result};
use loot_core::MarkupStore;

use super::util::lock_data_dir;
use crate::Config;

pub fn list<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let store = MarkupStore::load(&config.markup_path());
    write_entries(writer, &store)
}

pub fn set<W: Write>(writer: &mut W, config: &Config, item: &str, value: &str) -> Result<()> {
    let _lock = lock_data_dir(config)?;
    let mut store = MarkupStore::load(&config.markup_path());
    let entry = store
        .set_from_text(item, value)
        .with_context(|| format!("failed to set markup for {item}"))?;
    writeln!(writer, "{item}: {entry}")?;
    Ok(())
}

fn write_entries<W: Write>(writer: &mut W, store: &MarkupStore) -> Result<()> {
    writeln!(writer, "{:<32}  {:>10}", "ITEM", "MARKUP")?;
    for (item, entry) in store.entries() {
        let markup = entry.to_string();
        writeln!(writer, "{item:<32}  {markup:>10}")?;
    }
    Ok(())
}
