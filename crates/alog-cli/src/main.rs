use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use alog_cli::commands::{distribution, export, summary, timeline};
use alog_cli::{Cli, Commands, Config};

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

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Commands::Timeline {
            filters,
            window,
            json,
        }) => {
            timeline::run(&config, &filters, window, json)?;
        }
        Some(Commands::Distribution {
            by,
            all,
            filters,
            window,
            no_dedup,
            json,
        }) => {
            let view = if all {
                distribution::View::Overview
            } else {
                distribution::View::Single(by)
            };
            distribution::run(&config, &filters, view, window, no_dedup, json)?;
        }
        Some(Commands::Summary { filters, json }) => {
            summary::run(&config, &filters, json)?;
        }
        Some(Commands::Export {
            report,
            filters,
            window,
            raw,
            out_dir,
            stdout,
        }) => {
            let options = export::ExportOptions {
                report,
                window,
                raw,
                out_dir,
                to_stdout: stdout,
            };
            export::run(&config, &filters, &options)?;
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
