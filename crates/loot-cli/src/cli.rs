//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hunting run tracker.
///
/// Follows the game's chat log and totals cost, loot, skill gains and combat
/// statistics for each hunting run.
#[derive(Debug, Parser)]
#[command(name = "loot", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Follow the chat log and track the active run until Ctrl-C.
    Watch {
        /// Read the whole log instead of only new lines.
        #[arg(long)]
        from_start: bool,

        /// End the active run on exit instead of leaving it open.
        #[arg(long)]
        end_on_exit: bool,
    },

    /// Fold a complete chat log into a new, finished run.
    Replay {
        /// Chat log to read.
        file: PathBuf,
    },

    /// List runs, newest first.
    Runs {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one run in detail.
    Show {
        /// Run number from `loot runs` (default: newest).
        #[arg(long, default_value_t = 1)]
        run: usize,
    },

    /// End the active run.
    End,

    /// Set a run's notes.
    Notes {
        /// Run number from `loot runs`.
        run: usize,

        /// New notes.
        text: String,
    },

    /// Set spend outside combat for a run, in PED.
    Spend {
        /// Run number from `loot runs`.
        run: usize,

        /// Amount in PED.
        amount: String,
    },

    /// Delete runs.
    Delete {
        /// Run numbers from `loot runs`.
        #[arg(required = true)]
        runs: Vec<usize>,
    },

    /// Show or change item markup.
    #[command(subcommand)]
    Markup(MarkupAction),

    /// Report which lines of a chat log the patterns do not recognise.
    Classify {
        /// Chat log to read.
        file: PathBuf,
    },

    /// Show cost per shot of the configured loadouts.
    Cost {
        /// Select a loadout and save it to the config file.
        #[arg(long)]
        select: Option<String>,
    },
}

/// Markup subcommands.
#[derive(Debug, Subcommand)]
pub enum MarkupAction {
    /// List items with a markup set.
    List,

    /// Set markup for an item: `+0.05` adds per unit, `105%` or `1.05`
    /// multiplies.
    Set {
        /// Item name as it appears in loot messages.
        item: String,

        /// Markup value.
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}
