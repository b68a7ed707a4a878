pub mod config;
pub mod db;
pub mod models;
pub mod newsletter;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod scraping;
pub mod utils;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use config::AppConfig;
use db::Store;
use newsletter::DirectoryPublisher;
use scraping::HttpSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Promotions,
    Results,
    Schedule,
    Newsletter,
}

/// Runs one job end to end. `today` overrides the configured clock.
pub fn run(job: Job, config: &AppConfig, today: Option<NaiveDate>) -> Result<()> {
    let today = match today {
        Some(date) => date,
        None => config.today()?,
    };
    let database = config.database_path();
    let store = Store::open(&database)
        .with_context(|| format!("unable to open store {}", database.display()))?;

    match job {
        Job::Promotions => {
            let source = HttpSource::from_config(config)?;
            let report = pipeline::run_promotions(&source, &store, config)?;
            info!(
                added = report.added.len(),
                updated = report.updated,
                failed = report.failed,
                "promotions run complete"
            );
        }
        Job::Results => {
            info!("Launching results scraper");
            let source = HttpSource::from_config(config)?;
            pipeline::run_promotions(&source, &store, config)?;

            let dates = utils::trailing_week(today);
            let report = pipeline::run_results(&source, &store, config, &dates)?;
            info!(
                added = report.added.len(),
                updated = report.updated,
                failed = report.failed,
                "results run complete"
            );

            notify::from_config(config).send(&notify::results_message(&report.summary()));
        }
        Job::Schedule => {
            info!("Launching schedule scraper");
            let source = HttpSource::from_config(config)?;
            let run = pipeline::run_schedule(&source, &store, config, today)?;
            info!(
                shows = run.shows.len(),
                added = run.report.added.len(),
                "schedule run complete"
            );

            if let Some(message) = notify::schedule_message(&run.report.summary()) {
                notify::from_config(config).send(&message);
            }
        }
        Job::Newsletter => {
            let output_dir = config.newsletter_dir();
            let public_dir = config
                .newsletter_public_dir
                .clone()
                .unwrap_or_else(|| output_dir.join("public"));
            let base_url = config
                .newsletter_base_url
                .clone()
                .unwrap_or_else(|| format!("file://{}", public_dir.display()));
            let publisher = DirectoryPublisher::new(public_dir, base_url);

            let edition = newsletter::build_newsletter(&store, &publisher, &output_dir, today)?;
            info!(url = %edition.url, week = %edition.week, "newsletter published");
        }
    }
    Ok(())
}
