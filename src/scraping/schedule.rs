use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::base;
use super::PageSource;
use crate::models::ScheduleShow;
use crate::normalize;
use crate::utils;

/// `color01` marks puro promotions, `color02` joshi promotions.
const CATEGORY_CLASSES: [&str; 2] = ["color01", "color02"];

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("schedule item selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("schedule link selector"));

pub fn get_today_schedule(
    source: &dyn PageSource,
    url: &str,
    today: NaiveDate,
) -> Result<Vec<ScheduleShow>> {
    info!("Retrieving schedule page {url}");
    let html = source.fetch(url)?;
    let shows = parse_schedule_page(&html, url, today)
        .into_iter()
        .map(normalize::clean_schedule_show)
        .collect();
    Ok(shows)
}

/// Reads the raw (uncleaned) shows listed under today's date marker.
pub fn parse_schedule_page(html: &str, base_url: &str, today: NaiveDate) -> Vec<ScheduleShow> {
    let today = utils::schedule_date(today);
    let document = Html::parse_document(html);

    // Document order: the marker script, then the list that follows it.
    let mut elements = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap);
    let marker_found = elements
        .by_ref()
        .any(|el| el.value().name() == "script" && base::inner_text(el).contains(&today));
    if !marker_found {
        warn!("no schedule marker for {today}");
        return Vec::new();
    }
    let list = match elements.find(|el| el.value().name() == "ul") {
        Some(list) => list,
        None => {
            warn!("no schedule list after the {today} marker");
            return Vec::new();
        }
    };

    let items: Vec<ElementRef<'_>> = list.select(&ITEM_SELECTOR).collect();
    let mut shows = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if !is_category_item(item) {
            continue;
        }

        let promotion = base::clean_text(&base::inner_text(*item));
        if promotion.is_empty() {
            debug!("discarding schedule entry without a promotion name");
            continue;
        }

        let mut show = ScheduleShow {
            promotion,
            date: today.clone(),
            time: None,
            location: None,
            venue: None,
            link: None,
        };

        let details = items
            .get(index + 1)
            .filter(|next| !is_category_item(next))
            .and_then(|next| next.select(&LINK_SELECTOR).next());
        match details {
            Some(link) => fill_details(&mut show, link, base_url),
            None => warn!("no details link for {}", show.promotion),
        }

        info!(
            "Found show: {}, {:?}, {:?}, {:?}",
            show.promotion, show.time, show.location, show.venue
        );
        shows.push(show);
    }
    shows
}

fn is_category_item(item: &ElementRef<'_>) -> bool {
    item.value()
        .classes()
        .any(|class| CATEGORY_CLASSES.contains(&class))
}

fn fill_details(show: &mut ScheduleShow, link: ElementRef<'_>, base_url: &str) {
    show.link = base::absolute_url(base_url, link.value().attr("href").map(str::to_string));
    if show.link.is_none() {
        warn!("no link for {}", show.promotion);
    }

    let mut lines = base::stripped_strings(link).into_iter();
    match lines.next() {
        Some(first) => {
            let (time, location) = split_time_location(&first);
            show.time = time;
            show.location = location;
        }
        None => warn!("no time or location for {}", show.promotion),
    }
    show.venue = lines.next();
    if show.venue.is_none() {
        warn!("no venue for {}", show.promotion);
    }
}

/// `"18:30 korakuen"` -> time and location. The first token is the time
/// whatever it looks like (`18:30~`, `TBA`); the location is absent when
/// nothing follows it.
fn split_time_location(line: &str) -> (Option<String>, Option<String>) {
    let mut tokens = line.split_whitespace();
    let time = match tokens.next() {
        Some(token) => token.to_string(),
        None => return (None, None),
    };
    let location = tokens.collect::<Vec<_>>().join(" ");
    (Some(time), Some(location).filter(|rest| !rest.is_empty()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Document;
    use crate::scraping::testing::FakeSource;

    pub const URL: &str = "https://en.puwota.com";

    pub const SCHEDULE_HTML: &str = r#"
    <html><body>
    <script>var day = "2024-05-03";</script>
    <ul><li class="color01">yesterday show</li><li><a href="/e/1">12:00 tokyo<br>old hall</a></li></ul>
    <script>var day = "2024-05-04";</script>
    <ul>
      <li class="color01">AJPW</li>
      <li><a href="/events/100">18:30 tokyo<br>korakuen hall</a></li>
      <li class="color02">NOAH</li>
      <li><a href="/events/101">12:00 webcast</a></li>
      <li class="color02">gatoh move</li>
      <li><a href="https://chocopro.example/live">19:00 ichigaya<br>ChocoPro</a></li>
      <li class="color01"></li>
      <li><a href="/events/103">17:00 osaka<br>edion arena</a></li>
      <li class="color01">michinoku pro</li>
      <li><a href="/events/104">TBA takizawa<br>Takizawa Ipponmatsu</a></li>
    </ul>
    </body></html>
    "#;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
    }

    #[test]
    fn parses_shows_after_todays_marker() {
        let shows = parse_schedule_page(SCHEDULE_HTML, URL, today());
        let promotions: Vec<&str> = shows.iter().map(|s| s.promotion.as_str()).collect();
        assert_eq!(promotions, vec!["AJPW", "NOAH", "gatoh move", "michinoku pro"]);

        let first = &shows[0];
        assert_eq!(first.date, "2024-05-04");
        assert_eq!(first.time.as_deref(), Some("18:30"));
        assert_eq!(first.location.as_deref(), Some("tokyo"));
        assert_eq!(first.venue.as_deref(), Some("korakuen hall"));
        assert_eq!(first.link.as_deref(), Some("https://en.puwota.com/events/100"));
    }

    #[test]
    fn missing_venue_line_is_absent_and_processing_continues() {
        let shows = parse_schedule_page(SCHEDULE_HTML, URL, today());
        let noah = &shows[1];
        assert_eq!(noah.time.as_deref(), Some("12:00"));
        assert_eq!(noah.location.as_deref(), Some("webcast"));
        assert_eq!(noah.venue, None);
        assert_eq!(shows.len(), 4);
    }

    #[test]
    fn first_token_is_time_even_when_not_a_clock() {
        let shows = parse_schedule_page(SCHEDULE_HTML, URL, today());
        let michinoku = &shows[3];
        assert_eq!(michinoku.time.as_deref(), Some("TBA"));
        assert_eq!(michinoku.location.as_deref(), Some("takizawa"));
        assert_eq!(michinoku.venue.as_deref(), Some("Takizawa Ipponmatsu"));

        let html = r#"<script>"2024-05-04"</script>
            <ul><li class="color01">dragongate</li><li><a href="/e/1">18:30~ kobe<br>world hall</a></li>
            <li class="color01">sendai girls</li><li><a href="/e/2">TBA sendai<br>sendai sun plaza</a></li>
            <li class="color01">marvelous</li><li><a href="/e/3">OPEN17:00</a></li></ul>"#;
        let shows = parse_schedule_page(html, URL, today());
        assert_eq!(shows[0].time.as_deref(), Some("18:30~"));
        assert_eq!(shows[0].location.as_deref(), Some("kobe"));
        assert_eq!(shows[1].time.as_deref(), Some("TBA"));
        assert_eq!(shows[1].location.as_deref(), Some("sendai"));
        assert_eq!(shows[2].time.as_deref(), Some("OPEN17:00"));
        assert_eq!(shows[2].location, None);
    }

    #[test]
    fn odd_times_keep_same_day_shows_apart() {
        let html = r#"<script>"2024-05-04"</script>
            <ul><li class="color01">sendai girls</li><li><a href="/e/1">TBA sendai<br>a</a></li>
            <li class="color01">sendai girls</li><li><a href="/e/2">18:30~ sendai<br>b</a></li></ul>"#;
        let shows = parse_schedule_page(html, URL, today());
        assert_ne!(shows[0].natural_key(), shows[1].natural_key());
    }

    #[test]
    fn category_without_details_keeps_promotion_only() {
        let html = r#"<script>"2024-05-04"</script>
            <ul><li class="color01">pure-j</li><li class="color02">oz academy</li>
            <li><a href="/e/9">18:00 tokyo<br>shinjuku face</a></li></ul>"#;
        let shows = parse_schedule_page(html, URL, today());
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].promotion, "pure-j");
        assert_eq!(shows[0].time, None);
        assert_eq!(shows[0].link, None);
        assert_eq!(shows[1].venue.as_deref(), Some("shinjuku face"));
    }

    #[test]
    fn page_without_marker_is_empty() {
        let other_day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(parse_schedule_page(SCHEDULE_HTML, URL, other_day).is_empty());
    }

    #[test]
    fn get_today_schedule_cleans_shows() {
        let source = FakeSource::default().with_page(URL, SCHEDULE_HTML);
        let shows = get_today_schedule(&source, URL, today()).expect("schedule");

        assert_eq!(shows[0].promotion, "All Japan Pro Wrestling");
        assert_eq!(shows[0].location.as_deref(), Some("Tokyo"));
        assert_eq!(shows[0].venue.as_deref(), Some("Korakuen Hall"));

        assert_eq!(shows[1].promotion, "Pro Wrestling NOAH");
        assert_eq!(shows[1].location.as_deref(), Some("Live Stream"));

        assert_eq!(shows[2].promotion, "Gatoh Move");
        assert_eq!(shows[2].venue.as_deref(), Some("Ichigaya Chocolate Square"));

        assert_eq!(shows[3].promotion, "Michinoku Pro");
    }
}
