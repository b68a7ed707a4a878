//! Fixed text clean-up rules for the two source sites.
//!
//! Everything here is pure. Results titles come from cagematch listings and
//! carry German labels plus a parenthetical promotion tag; schedule entries
//! come from puwota and are mostly lower case.

use thiserror::Error;

use crate::models::ScheduleShow;

const FREELANCE_NAME: &str = "Wrestling In Japan - Freelance Shows";
const FREELANCE_RENAME: &str = "Others";

const WEBCAST: &str = "webcast";
const LIVE_STREAM: &str = "Live Stream";

const CHOCOPRO_VENUE: &str = "ChocoPro";
const CHOCOPRO_PROMOTION: &str = "Gatoh Move";
const CHOCOPRO_LOCATION: &str = "Ichigaya";
const CHOCOPRO_CANONICAL_VENUE: &str = "Ichigaya Chocolate Square";

/// Schedule-site labels mapped to the promotion's public name.
pub const PROMOTION_ALIASES: &[(&str, &str)] = &[
    ("AJPW", "All Japan Pro Wrestling"),
    ("NJPW", "New Japan Pro-Wrestling"),
    ("NOAH", "Pro Wrestling NOAH"),
    ("DDT", "DDT Pro-Wrestling"),
    ("TJPW", "Tokyo Joshi Pro-Wrestling"),
    ("BJW", "Big Japan Pro Wrestling"),
    ("ZERO1", "Pro Wrestling ZERO1"),
    ("STARDOM", "World Wonder Ring Stardom"),
    ("marigold", "Dream Star Fighting Marigold"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("title {title:?} has no {delimiter:?} delimiter")]
    MissingDelimiter {
        delimiter: &'static str,
        title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTitle {
    pub title: String,
    pub location: Option<String>,
}

/// Turns a raw cagematch header such as
/// `"01.05.2024 (NJPW) Wrestling Dontaku - Tag 2 - Event @ Fukuoka Kokusai Center in Fukuoka, Japan"`
/// into the display title and its location.
///
/// The location is read from the raw header before any rewriting happens.
pub fn clean_title(raw: &str) -> Result<CleanTitle, NormalizeError> {
    let location = raw
        .split_once("@ ")
        .map(|(_, after)| after.to_string());

    let title = raw
        .replace("- Event @", "@")
        .replace("- TV-Show @", "@");

    let (_, after_tag) = title
        .split_once(") ")
        .ok_or_else(|| NormalizeError::MissingDelimiter {
            delimiter: ") ",
            title: raw.to_string(),
        })?;
    let (name, _) = after_tag
        .split_once('@')
        .ok_or_else(|| NormalizeError::MissingDelimiter {
            delimiter: "@",
            title: raw.to_string(),
        })?;

    Ok(CleanTitle {
        title: translate_labels(name),
        location,
    })
}

/// German day and round labels to English.
pub fn translate_labels(title: &str) -> String {
    title.replace("- Tag ", "- Day ").replace("Runde ", "Round ")
}

pub fn clean_match_result(raw: &str) -> String {
    raw.replace("TITLE CHANGE !!!", "<b>TITLE CHANGE</b>")
}

pub fn clean_schedule_show(mut show: ScheduleShow) -> ScheduleShow {
    if show.venue.as_deref() == Some(CHOCOPRO_VENUE) {
        show.promotion = CHOCOPRO_PROMOTION.to_string();
        show.location = Some(CHOCOPRO_LOCATION.to_string());
        show.venue = Some(CHOCOPRO_CANONICAL_VENUE.to_string());
        return show;
    }

    if show.location.as_deref() == Some(WEBCAST) {
        show.location = Some(LIVE_STREAM.to_string());
    }

    show.promotion = canonical_promotion(&show.promotion);
    show.location = show.location.as_deref().map(place_case);
    show.venue = show.venue.as_deref().map(place_case);
    show
}

/// Alias lookup first; an aliased name is already canonical and is not re-cased.
pub fn canonical_promotion(name: &str) -> String {
    let trimmed = name.trim();
    match PROMOTION_ALIASES
        .iter()
        .find(|(label, _)| *label == trimmed)
    {
        Some((_, canonical)) => canonical.to_string(),
        None => promotion_case(trimmed),
    }
}

/// Title case, except for names that are already all caps (acronyms).
pub fn promotion_case(name: &str) -> String {
    if is_upper(name) {
        name.to_string()
    } else {
        title_case(name)
    }
}

/// Title-cases only the words that have no capital letter yet, so names like
/// "Tokyo FACE arena" keep their internal capitals.
pub fn place_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if word.chars().any(char::is_uppercase) {
                word.to_string()
            } else {
                title_case(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases the first cased character of every run of cased characters and
/// lower-cases the rest, so "o'reilly hall-b" becomes "O'Reilly Hall-B".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_cased = false;
    for ch in text.chars() {
        let cased = ch.is_uppercase() || ch.is_lowercase();
        if cased && previous_cased {
            out.extend(ch.to_lowercase());
        } else if cased {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        previous_cased = cased;
    }
    out
}

fn is_upper(text: &str) -> bool {
    let mut saw_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            saw_cased = true;
        }
    }
    saw_cased
}

pub fn promotion_display_name(name: &str) -> String {
    if name == FREELANCE_NAME {
        FREELANCE_RENAME.to_string()
    } else {
        name.to_string()
    }
}

/// Strips ASCII punctuation, then spaces.
pub fn short_name(name: &str) -> String {
    name.chars()
        .filter(|ch| !ch.is_ascii_punctuation())
        .filter(|ch| *ch != ' ')
        .collect()
}
