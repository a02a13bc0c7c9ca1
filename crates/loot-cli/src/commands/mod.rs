//! CLI subcommand implementations.

pub mod classify;
pub mod cost;
pub mod edit;
pub mod end;
pub mod markup;
pub mod replay;
pub mod runs;
pub mod show;
pub mod util;
pub mod watch;
