use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use puroview_lib::{config::AppConfig, Job};

#[derive(Parser)]
#[command(name = "puroview", about = "Puroview results and schedule scraper")]
struct Cli {
    /// Config file (defaults to config.json in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database to write to
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Run as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the promotions catalog
    Promotions,
    /// Refresh promotions, then scrape the last 7 days of results
    Results,
    /// Scrape today's schedule
    Schedule,
    /// Render and publish the weekly newsletter
    Newsletter,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    let job = match cli.command {
        Commands::Promotions => Job::Promotions,
        Commands::Results => Job::Results,
        Commands::Schedule => Job::Schedule,
        Commands::Newsletter => Job::Newsletter,
    };
    puroview_lib::run(job, &config, cli.today)
}
