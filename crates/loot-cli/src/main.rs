use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loot_cli::commands::{classify, cost, edit, end, markup, replay, runs, show, watch};
use loot_cli::{Cli, Commands, Config, MarkupAction};

/// Loads the configuration. A file that does not parse is reported and the
/// defaults are used instead.
fn load_config(cli: &Cli) -> Config {
    match Config::load_from(cli.config.as_deref()) {
        Ok(config) => {
            tracing::debug!(?config, "loaded configuration");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid configuration, using defaults");
            Config::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Watch {
            from_start,
            end_on_exit,
        }) => {
            watch::run(&mut stdout, &load_config(&cli), *from_start, *end_on_exit)?;
        }
        Some(Commands::Replay { file }) => {
            replay::run(&mut stdout, &load_config(&cli), file, Utc::now())?;
        }
        Some(Commands::Runs { json }) => {
            runs::run(&mut stdout, &load_config(&cli), *json, Utc::now())?;
        }
        Some(Commands::Show { run }) => {
            show::run(&mut stdout, &load_config(&cli), *run, Utc::now())?;
        }
        Some(Commands::End) => {
            end::run(&mut stdout, &load_config(&cli), Utc::now())?;
        }
        Some(Commands::Notes { run, text }) => {
            edit::notes(&mut stdout, &load_config(&cli), *run, text)?;
        }
        Some(Commands::Spend { run, amount }) => {
            edit::spend(&mut stdout, &load_config(&cli), *run, amount)?;
        }
        Some(Commands::Delete { runs }) => {
            edit::delete(&mut stdout, &load_config(&cli), runs)?;
        }
        Some(Commands::Markup(action)) => {
            let config = load_config(&cli);
            match action {
                MarkupAction::List => markup::list(&mut stdout, &config)?,
                MarkupAction::Set { item, value } => markup::set(&mut stdout, &config, item, value)?,
            }
        }
        Some(Commands::Classify { file }) => {
            // Classify doesn't need config - it only reads the given log
            classify::run(&mut stdout, file)?;
        }
        Some(Commands::Cost { select }) => {
            cost::run(
                &mut stdout,
                &load_config(&cli),
                cli.config.as_deref(),
                select.as_deref(),
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
