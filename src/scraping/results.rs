use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::base;
use super::PageSource;
use crate::models::{Promotion, ResultShow};
use crate::normalize;
use crate::utils;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.TableContents").expect("results table selector"));
static SHOW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.QuickResults").expect("results show selector"));
static HEADER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.QuickResultsHeader").expect("results header selector"));
static MATCH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.MatchResults").expect("results match selector"));

/// A show block as it appears on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawShow {
    pub title: String,
    pub date: String,
    pub results: Vec<String>,
}

pub fn events_url(base_url: &str, promotion: &Promotion, date: NaiveDate) -> String {
    format!(
        "{base_url}{id}&page=8&name=&vDay={day}&vMonth={month}&vYear={year}&showtype=&location=&arena=&region=",
        id = promotion.external_id,
        day = date.format("%d"),
        month = date.format("%m"),
        year = date.format("%Y"),
    )
}

/// Scrapes every date for one promotion. Dates without a results table add
/// nothing; the list is empty, not an error, when the whole week was quiet.
/// A date whose page cannot be fetched is skipped. Only a promotion for which
/// every fetch failed is an error.
pub fn get_events(
    source: &dyn PageSource,
    base_url: &str,
    promotion: &Promotion,
    dates: &[NaiveDate],
) -> Result<Vec<ResultShow>> {
    info!("Getting events for {}", promotion.name);
    let mut raw_shows = Vec::new();
    let mut failures = 0usize;
    let mut last_error = None;

    for date in dates {
        let date_text = utils::results_date(*date);
        let url = events_url(base_url, promotion, *date);
        debug!(%url, "scrape url");

        let html = match source.fetch(&url) {
            Ok(html) => html,
            Err(err) => {
                warn!("Could not fetch {} for {date_text}: {err:#}", promotion.name);
                failures += 1;
                last_error = Some(err);
                continue;
            }
        };
        let found = parse_results_page(&html, &date_text);
        if found.is_empty() {
            info!("No events found for {}, {date_text}", promotion.name);
        }
        raw_shows.extend(found);
    }

    if !dates.is_empty() && failures == dates.len() {
        let err = last_error.unwrap_or_else(|| anyhow!("no pages fetched"));
        return Err(err.context(format!("every date failed for {}", promotion.name)));
    }

    Ok(raw_shows
        .into_iter()
        .filter_map(|raw| clean_show(raw, &promotion.name))
        .collect())
}

pub fn parse_results_page(html: &str, date: &str) -> Vec<RawShow> {
    let document = Html::parse_document(html);
    let table = match document.select(&TABLE_SELECTOR).next() {
        Some(table) => table,
        None => return Vec::new(),
    };

    let mut shows = Vec::new();
    for block in table.select(&SHOW_SELECTOR) {
        let title = match base::first_text(&block, &HEADER_SELECTOR) {
            Some(title) => title,
            None => {
                warn!("show block on {date} has no header, skipping");
                continue;
            }
        };
        let results = block
            .select(&MATCH_SELECTOR)
            .map(base::inner_text)
            .collect::<Vec<_>>();
        debug!(%title, matches = results.len(), "found show");

        shows.push(RawShow {
            title,
            date: date.to_string(),
            results,
        });
    }
    shows
}

fn clean_show(raw: RawShow, promotion: &str) -> Option<ResultShow> {
    let clean = match normalize::clean_title(&raw.title) {
        Ok(clean) => clean,
        Err(err) => {
            warn!("dropping show from {promotion}: {err}");
            return None;
        }
    };
    if clean.location.is_none() {
        warn!("no location in {:?}", raw.title);
    }

    Some(ResultShow {
        title: clean.title,
        date: raw.date,
        location: clean.location,
        promotion: promotion.to_string(),
        results: raw
            .results
            .iter()
            .map(|result| normalize::clean_match_result(result))
            .collect(),
    })
}
