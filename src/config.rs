use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils;

pub const DEFAULT_CAGEMATCH_BASE: &str = "https://www.cagematch.net/";
pub const DEFAULT_PROMOTIONS_URL: &str =
    "https://www.cagematch.net/?id=8&view=promotions&region=&status=aktiv&name=&location=japan";
pub const DEFAULT_SCHEDULE_URL: &str = "https://en.puwota.com";
pub const DEFAULT_USER_AGENT: &str = "puroview-scraper/0.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cagematch_base: String,
    pub promotions_url: String,
    pub schedule_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub http_retries: u32,
    pub retry_backoff_ms: u64,
    /// IANA zone used to decide what "today" is; the local clock when unset.
    pub timezone: Option<String>,
    pub database_path: Option<PathBuf>,
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
    pub newsletter_dir: Option<PathBuf>,
    pub newsletter_public_dir: Option<PathBuf>,
    pub newsletter_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cagematch_base: DEFAULT_CAGEMATCH_BASE.to_string(),
            promotions_url: DEFAULT_PROMOTIONS_URL.to_string(),
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: 30,
            http_retries: 3,
            retry_backoff_ms: 500,
            timezone: None,
            database_path: None,
            pushover_token: None,
            pushover_user: None,
            newsletter_dir: None,
            newsletter_public_dir: None,
            newsletter_base_url: None,
        }
    }
}

impl AppConfig {
    /// Reads the JSON config (a missing file means defaults), then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(utils::config_path);
        let mut config = read_config(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("PUSHOVER_TOKEN") {
            self.pushover_token = Some(token);
        }
        if let Some(user) = lookup("PUSHOVER_USER") {
            self.pushover_user = Some(user);
        }
        if let Some(zone) = lookup("PUROVIEW_TIMEZONE") {
            self.timezone = Some(zone);
        }
        if let Some(path) = lookup("PUROVIEW_DATABASE") {
            self.database_path = Some(PathBuf::from(path));
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(utils::database_path)
    }

    pub fn newsletter_dir(&self) -> PathBuf {
        self.newsletter_dir
            .clone()
            .unwrap_or_else(utils::newsletter_dir)
    }

    pub fn today(&self) -> Result<NaiveDate> {
        match self.timezone.as_deref() {
            Some(name) => {
                let tz: Tz = name
                    .parse()
                    .map_err(|err| anyhow::anyhow!("invalid timezone {name:?}: {err}"))?;
                Ok(Utc::now().with_timezone(&tz).date_naive())
            }
            None => Ok(Local::now().date_naive()),
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))
}
