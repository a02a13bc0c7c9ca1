//! Hunting run tracker CLI library.
//!
//! This crate provides the `loot` command: configuration, the chat log
//! tailer, the tracker that owns run state, and the subcommands.

mod cli;
pub mod commands;
mod config;
pub mod screenshot;
pub mod tailer;
pub mod tracker;

pub use cli::{Cli, Commands, MarkupAction};
pub use config::{Config, ScreenshotConfig, default_config_file, dirs_data_path};
