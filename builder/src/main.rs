//! CLI entry point for fundpie.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use fundpie::FirstMatch;
use fundpie_builder::config::Config;
use fundpie_builder::context::RunContext;
use fundpie_builder::error::{Error, Result};
use fundpie_builder::execution::{self, RunOptions};

#[derive(Parser)]
#[command(name = "fundpie")]
#[command(about = "Mirror an ETF's holdings into a Trading 212 pie")]
#[command(version)]
struct Cli {
    /// Path to fundpie.toml
    #[arg(long, default_value = "fundpie.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize the holdings, confirm, and create the pie
    Run {
        /// Holdings CSV (defaults to holdings.file)
        #[arg(long)]
        holdings: Option<PathBuf>,

        /// Show the pie without creating it
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Download the holdings CSV from the fund's product page
    FetchHoldings {
        /// Product page (defaults to holdings.source_url)
        #[arg(long)]
        url: Option<String>,

        /// Where to write the CSV (defaults to holdings.file)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Take the first holdings link instead of asking
        #[arg(long)]
        first: bool,
    },

    /// Show the tradable universe and how symbols resolve
    Instruments {
        symbols: Vec<String>,
    },

    /// Check the API connection
    Status,
}

fn dispatch(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Run {
            holdings,
            dry_run,
            force,
        } => {
            let broker = execution::connect(config)?;
            let mut ctx = RunContext::interactive(config)?;
            let opts = RunOptions {
                dry_run,
                force,
                holdings_file: holdings,
            };
            execution::run(config, &broker, &mut ctx, &opts).map(|_| ())
        }
        Command::FetchHoldings { url, out, first } => {
            let mut ctx = RunContext::interactive(config)?;
            if first {
                ctx.selector = Box::new(FirstMatch);
            }
            execution::fetch(config, &ctx, url.as_deref(), out.as_deref()).map(|_| ())
        }
        Command::Instruments { symbols } => {
            let broker = execution::connect(config)?;
            let ctx = RunContext::interactive(config)?;
            execution::show_instruments(config, &broker, &ctx, &symbols)
        }
        Command::Status => {
            let broker = execution::connect(config)?;
            execution::check_status(config, &broker)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = dispatch(&config, cli.command) {
        match &e {
            Error::Normalize(err) => eprintln!("\nCannot build pie: {err}"),
            _ => eprintln!("Error: {e}"),
        }
        process::exit(e.exit_code());
    }
}
