use std::time::Duration;

use scraper::{ElementRef, Selector};

const MAX_BACKOFF: Duration = Duration::from_secs(8);

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text pieces of an element with surrounding whitespace removed and empty
/// pieces dropped, one per line of source markup.
pub fn stripped_strings(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| inner_text(node).trim().to_string())
        .filter(|text| !text.is_empty())
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

pub fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let multiplier = 1u32 << attempt.min(6);
    base.checked_mul(multiplier)
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 10), MAX_BACKOFF);
    }

    #[test]
    fn stripped_strings_split_on_markup() {
        let html = Html::parse_fragment("<a href=\"/x\">\n  18:30 Tokyo <br>\n Korakuen Hall \n</a>");
        let link = html
            .select(&Selector::parse("a").unwrap())
            .next()
            .unwrap();
        assert_eq!(stripped_strings(link), vec!["18:30 Tokyo", "Korakuen Hall"]);
    }

    #[test]
    fn absolute_url_joins_relative_links() {
        assert_eq!(
            absolute_url("https://en.puwota.com", Some("/event/123".into())).as_deref(),
            Some("https://en.puwota.com/event/123")
        );
        assert_eq!(
            absolute_url("https://en.puwota.com", Some("https://other.example/a".into()))
                .as_deref(),
            Some("https://other.example/a")
        );
        assert_eq!(absolute_url("https://en.puwota.com", None), None);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Pro \n Wrestling\tNOAH "), "Pro Wrestling NOAH");
    }
}
