//! Fund terminal CLI
//!
//! Browse the fund's charts and transactions from a shell.
//!
//! # Commands
//!
//! - `fund-terminal` / `fund-terminal repl` - Interactive terminal session
//! - `fund-terminal exec <command...>` - Run one terminal command and print the reply
//! - `fund-terminal render <plot>` - Write a chart as SVG

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fund_terminal_core::models::settings::DashboardConfig;
use fund_terminal_core::storage::preferences::PreferenceStore;
use fund_terminal_core::FundDashboard;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Fund dashboard terminal
#[derive(Parser)]
#[command(name = "fund-terminal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding transactions.csv and output/
    #[arg(short, long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Base URL to fetch the data files from when they are not on disk
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Preferences file
    #[arg(long, global = true, default_value = "fund-terminal.json")]
    prefs: PathBuf,

    /// Display currency (USD, CNY, JPY, KRW); saved to the preferences file
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Disable chart animations
    #[arg(long, global = true)]
    no_animations: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal session (default)
    Repl,

    /// Run a single terminal command
    Exec {
        /// Command words, e.g. `plot performance 2023`
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Render a chart to SVG
    Render {
        /// Plot subcommand, e.g. `performance`, `composition-abs`, `fx`
        plot: String,

        /// Date range, e.g. `2023`, `2022:2023`, `from:2022q3`
        #[arg(long)]
        date: Option<String>,

        /// Output file
        #[arg(short, long, default_value = "chart.svg")]
        out: PathBuf,

        #[arg(long, default_value = "960")]
        width: f64,

        #[arg(long, default_value = "540")]
        height: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = DashboardConfig {
        data_dir: Some(cli.data_dir.clone()),
        base_url: cli.base_url.clone(),
        animations_enabled: !cli.no_animations,
        ..DashboardConfig::default()
    };
    debug!(?config, "starting");

    let mut dashboard = FundDashboard::new(config, PreferenceStore::new(&cli.prefs));
    if let Some(code) = &cli.currency {
        dashboard.set_currency(code)?;
    }
    dashboard.load_data().await;

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => commands::repl::run(&mut dashboard).await,
        Commands::Exec { command } => commands::exec::run(&mut dashboard, &command.join(" ")).await,
        Commands::Render {
            plot,
            date,
            out,
            width,
            height,
        } => commands::render::run(&mut dashboard, &plot, date.as_deref(), &out, width, height).await,
    }
}
