use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Document;
use crate::normalize;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("promotion is missing required field `{0}`")]
pub struct MissingFieldError(pub &'static str);

/// Raw promotion columns as scraped, before validation.
#[derive(Debug, Default, Clone)]
pub struct PromotionFields {
    pub name: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Promotion {
    pub name: String,
    pub external_id: String, // cagematch link, e.g. "?id=8&nr=7"
    pub short_name: String,
}

impl Promotion {
    pub fn new(fields: PromotionFields) -> Result<Self, MissingFieldError> {
        let name = fields
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(MissingFieldError("name"))?;
        let external_id = fields
            .external_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(MissingFieldError("external_id"))?;

        let name = normalize::promotion_display_name(&name);
        let short_name = normalize::short_name(&name);
        Ok(Self {
            name,
            external_id,
            short_name,
        })
    }
}

impl Document for Promotion {
    const COLLECTION: &'static str = "promotions";

    fn natural_key(&self) -> String {
        self.external_id.clone()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResultShow {
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub promotion: String,
    pub results: Vec<String>,
}

impl Document for ResultShow {
    const COLLECTION: &'static str = "results";

    fn natural_key(&self) -> String {
        key_of(&(&self.title, &self.date))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScheduleShow {
    pub promotion: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl ScheduleShow {
    /// `"<promotion>, <time>"`, or just the promotion when no time was listed.
    pub fn label(&self) -> String {
        match &self.time {
            Some(time) => format!("{}, {time}", self.promotion),
            None => self.promotion.clone(),
        }
    }
}

impl Document for ScheduleShow {
    // One promotion can run several shows on the same day, so time is part of the key.
    const COLLECTION: &'static str = "schedule";

    fn natural_key(&self) -> String {
        key_of(&(&self.promotion, &self.date, &self.time))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewsletterEdition {
    pub url: String,
    pub year: String,
    pub week: String,
    pub firstdate: String,
    pub lastdate: String,
}

impl Document for NewsletterEdition {
    const COLLECTION: &'static str = "newsletters";

    fn natural_key(&self) -> String {
        self.url.clone()
    }
}

fn key_of<T: Serialize>(parts: &T) -> String {
    // Tuples of strings and options always serialize.
    serde_json::to_string(parts).unwrap_or_default()
}
