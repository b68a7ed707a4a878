//! Scrape -> clean -> upsert runs, one per collection.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::db::{Document, Store, UpsertOutcome};
use crate::models::{Promotion, ResultShow, ScheduleShow};
use crate::scraping::{promotions, results, schedule, PageSource};

/// What a run wrote. `added` holds one display line per inserted record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub added: Vec<String>,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn summary(&self) -> String {
        self.added.join("\n")
    }

    fn record<T: Document>(&mut self, store: &Store, record: &T, label: String) {
        match store.upsert(record) {
            Ok(UpsertOutcome::Inserted) => {
                info!("Added {label} to {}", T::COLLECTION);
                self.added.push(label);
            }
            Ok(UpsertOutcome::Updated) => {
                info!("Updated {label} in {}", T::COLLECTION);
                self.updated += 1;
            }
            Ok(UpsertOutcome::Unchanged) => {
                debug!("{label} already in {}", T::COLLECTION);
                self.unchanged += 1;
            }
            Err(err) => {
                warn!("failed to store {label}: {err}");
                self.failed += 1;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleReport {
    pub shows: Vec<ScheduleShow>,
    pub report: RunReport,
}

pub fn run_promotions(
    source: &dyn PageSource,
    store: &Store,
    config: &AppConfig,
) -> Result<RunReport> {
    info!("Updating promotions");
    let found = promotions::fetch_promotions(source, &config.promotions_url)?;

    let mut report = RunReport::default();
    for promotion in &found {
        report.record(store, promotion, promotion.name.clone());
    }
    Ok(report)
}

/// Scrapes every stored promotion for the given dates. A promotion whose pages
/// cannot be fetched is logged and skipped.
pub fn run_results(
    source: &dyn PageSource,
    store: &Store,
    config: &AppConfig,
    dates: &[NaiveDate],
) -> Result<RunReport> {
    info!("Updating events");
    let mut report = RunReport::default();

    for promotion in store.list::<Promotion>()? {
        let events = match results::get_events(source, &config.cagematch_base, &promotion, dates)
        {
            Ok(events) => events,
            Err(err) => {
                warn!("skipping {}: {err:#}", promotion.name);
                report.failed += 1;
                continue;
            }
        };
        if events.is_empty() {
            info!("No events found for {}", promotion.name);
            continue;
        }

        info!("Found {} events for {}", events.len(), promotion.name);
        for event in &events {
            report.record(store, event, result_label(event));
        }
    }
    Ok(report)
}

pub fn run_schedule(
    source: &dyn PageSource,
    store: &Store,
    config: &AppConfig,
    today: NaiveDate,
) -> Result<ScheduleReport> {
    info!("Updating schedule for {today}");
    let shows = schedule::get_today_schedule(source, &config.schedule_url, today)?;

    let mut report = RunReport::default();
    for show in &shows {
        report.record(store, show, show.label());
    }
    Ok(ScheduleReport { shows, report })
}

fn result_label(show: &ResultShow) -> String {
    format!("{} - {}", show.promotion, show.title)
}
