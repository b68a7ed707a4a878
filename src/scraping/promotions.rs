use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::base;
use super::PageSource;
use crate::models::{Promotion, PromotionFields};

const HEADER_NAME: &str = "Name";

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.TableContents tr").expect("promotions row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("promotions cell selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("promotions link selector"));

pub fn fetch_promotions(source: &dyn PageSource, url: &str) -> Result<Vec<Promotion>> {
    info!("Scraping promotions page {url}");
    let html = source.fetch(url)?;
    Ok(parse_promotions_page(&html))
}

pub fn parse_promotions_page(html: &str) -> Vec<Promotion> {
    let document = Html::parse_document(html);
    let mut promotions = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        let name = row
            .select(&CELL_SELECTOR)
            .nth(2)
            .map(|cell| base::inner_text(cell).trim().to_string());
        if name.as_deref() == Some(HEADER_NAME) {
            continue;
        }
        let external_id = base::first_attr(&row, &LINK_SELECTOR, "href");

        match Promotion::new(PromotionFields { name, external_id }) {
            Ok(promotion) => {
                debug!(?promotion, "found promotion");
                promotions.push(promotion);
            }
            Err(err) => warn!("skipping promotions row: {err}"),
        }
    }

    info!("Found {} promotions", promotions.len());
    promotions
}
