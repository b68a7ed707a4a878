//! Weekly digest of stored results, grouped by promotion.

use std::{
    collections::HashSet,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::db::Store;
use crate::models::{NewsletterEdition, ResultShow};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionEvents {
    pub promotion: String,
    pub events: Vec<ResultShow>,
}

/// Makes a rendered file public and returns its URL.
pub trait Publisher {
    fn publish(&self, file: &Path) -> Result<String>;
}

/// Copies the file into a served directory.
pub struct DirectoryPublisher {
    target_dir: PathBuf,
    base_url: String,
}

impl DirectoryPublisher {
    pub fn new(target_dir: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            target_dir,
            base_url: base_url.into(),
        }
    }
}

impl Publisher for DirectoryPublisher {
    fn publish(&self, file: &Path) -> Result<String> {
        let name = file
            .file_name()
            .ok_or_else(|| anyhow!("{} has no file name", file.display()))?;
        fs::create_dir_all(&self.target_dir)
            .with_context(|| format!("unable to create {}", self.target_dir.display()))?;
        fs::copy(file, self.target_dir.join(name))
            .with_context(|| format!("unable to publish {}", file.display()))?;
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            name.to_string_lossy()
        ))
    }
}

pub fn file_name(today: NaiveDate) -> String {
    let week = today.iso_week();
    format!("puroview_week{:02}_{}.html", week.week(), week.year())
}

/// Stored results for the given dates, stably sorted by promotion.
pub fn gather_week(store: &Store, dates: &[NaiveDate]) -> Result<Vec<ResultShow>> {
    let wanted: HashSet<String> = dates.iter().map(|d| utils::results_date(*d)).collect();
    let mut shows: Vec<ResultShow> = store
        .list::<ResultShow>()?
        .into_iter()
        .filter(|show| wanted.contains(&show.date))
        .collect();
    shows.sort_by(|a, b| a.promotion.cmp(&b.promotion));
    Ok(shows)
}

pub fn group_by_promotion(shows: Vec<ResultShow>) -> Vec<PromotionEvents> {
    let mut groups: Vec<PromotionEvents> = Vec::new();
    for show in shows {
        match groups.last_mut() {
            Some(group) if group.promotion == show.promotion => group.events.push(show),
            _ => groups.push(PromotionEvents {
                promotion: show.promotion.clone(),
                events: vec![show],
            }),
        }
    }
    groups
}

/// Result lines already carry markup (`<b>TITLE CHANGE</b>`) and go in as-is;
/// every other field is escaped.
pub fn render(groups: &[PromotionEvents], firstdate: &str, lastdate: &str) -> String {
    let mut body = String::new();
    for group in groups {
        let _ = writeln!(body, "<h2>{}</h2>", escape_html(&group.promotion));
        for event in &group.events {
            let _ = writeln!(
                body,
                "<h3>{} ({})</h3>",
                escape_html(event.title.trim_end()),
                escape_html(&event.date)
            );
            if let Some(location) = &event.location {
                let _ = writeln!(body, "<p class=\"location\">{}</p>", escape_html(location));
            }
            body.push_str("<ul>\n");
            for result in &event.results {
                let _ = writeln!(body, "<li>{result}</li>");
            }
            body.push_str("</ul>\n");
        }
    }
    if groups.is_empty() {
        body.push_str("<p>No results this week.</p>\n");
    }

    let firstdate = escape_html(firstdate);
    let lastdate = escape_html(lastdate);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Puroview {firstdate} - {lastdate}</title>\n</head>\n<body>\n<h1>Puroview results {firstdate} - {lastdate}</h1>\n{body}</body>\n</html>\n"
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the week ending `today`, publishes it and records the edition.
pub fn build_newsletter(
    store: &Store,
    publisher: &dyn Publisher,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<NewsletterEdition> {
    let dates = utils::trailing_week(today);
    let firstdate = dates.first().map(|d| utils::results_date(*d)).unwrap_or_default();
    let lastdate = dates.last().map(|d| utils::results_date(*d)).unwrap_or_default();

    let shows = gather_week(store, &dates)?;
    info!("Rendering newsletter with {} shows", shows.len());
    let groups = group_by_promotion(shows);
    let html = render(&groups, &firstdate, &lastdate);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("unable to create {}", output_dir.display()))?;
    let path = output_dir.join(file_name(today));
    fs::write(&path, html).with_context(|| format!("unable to write {}", path.display()))?;

    let url = publisher.publish(&path)?;
    info!("Published newsletter at {url}");

    let week = today.iso_week();
    let edition = NewsletterEdition {
        url,
        year: week.year().to_string(),
        week: format!("{:02}", week.week()),
        firstdate,
        lastdate,
    };
    store.upsert(&edition)?;
    Ok(edition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Document;

    fn show(promotion: &str, title: &str, date: &str) -> ResultShow {
        ResultShow {
            title: title.into(),
            date: date.into(),
            location: Some("Korakuen Hall in Tokyo, Japan".into()),
            promotion: promotion.into(),
            results: vec!["<b>TITLE CHANGE</b> A defeats B".into()],
        }
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("puroview-{label}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn file_name_uses_iso_week() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
        assert_eq!(file_name(date), "puroview_week53_2020.html");
        let date = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        assert_eq!(file_name(date), "puroview_week18_2024.html");
    }

    #[test]
    fn groups_consecutive_promotions() {
        let groups = group_by_promotion(vec![
            show("DDT", "A ", "01.05.2024"),
            show("DDT", "B ", "02.05.2024"),
            show("NOAH", "C ", "01.05.2024"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].events.len(), 2);
        assert_eq!(groups[1].promotion, "NOAH");
    }

    #[test]
    fn gathers_only_the_week_sorted_by_promotion() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&show("NOAH", "In week ", "04.05.2024")).unwrap();
        store.upsert(&show("DDT", "Also in week ", "28.04.2024")).unwrap();
        store.upsert(&show("AJPW", "Too old ", "27.04.2024")).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let shows = gather_week(&store, &utils::trailing_week(today)).unwrap();
        let promotions: Vec<&str> = shows.iter().map(|s| s.promotion.as_str()).collect();
        assert_eq!(promotions, vec!["DDT", "NOAH"]);
    }

    #[test]
    fn render_keeps_result_markup() {
        let groups = group_by_promotion(vec![show("DDT", "Judgement ", "01.05.2024")]);
        let html = render(&groups, "28.04.2024", "04.05.2024");
        assert!(html.contains("<h2>DDT</h2>"));
        assert!(html.contains("<h3>Judgement (01.05.2024)</h3>"));
        assert!(html.contains("<li><b>TITLE CHANGE</b> A defeats B</li>"));
    }

    #[test]
    fn render_escapes_scraped_text() {
        let mut event = show("Dragon <Gate> & Friends", "Kobe \"Pro\" <Night> ", "01.05.2024");
        event.location = Some("Hall A & B".into());
        let html = render(&group_by_promotion(vec![event]), "28.04.2024", "04.05.2024");

        assert!(html.contains("<h2>Dragon &lt;Gate&gt; &amp; Friends</h2>"));
        assert!(html.contains("<h3>Kobe &quot;Pro&quot; &lt;Night&gt; (01.05.2024)</h3>"));
        assert!(html.contains("<p class=\"location\">Hall A &amp; B</p>"));
        assert!(html.contains("<li><b>TITLE CHANGE</b> A defeats B</li>"));
    }

    #[test]
    fn builds_publishes_and_records_edition() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&show("DDT", "Judgement ", "01.05.2024")).unwrap();

        let output = scratch_dir("out");
        let public = scratch_dir("public");
        let publisher = DirectoryPublisher::new(public.clone(), "https://news.example/");
        let today = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();

        let edition = build_newsletter(&store, &publisher, &output, today).unwrap();
        assert_eq!(edition.url, "https://news.example/puroview_week18_2024.html");
        assert_eq!(edition.week, "18");
        assert_eq!(edition.year, "2024");
        assert_eq!(edition.firstdate, "28.04.2024");
        assert_eq!(edition.lastdate, "04.05.2024");
        assert!(public.join("puroview_week18_2024.html").exists());
        assert_eq!(store.count(NewsletterEdition::COLLECTION).unwrap(), 1);

        let _ = fs::remove_dir_all(output);
        let _ = fs::remove_dir_all(public);
    }
}
