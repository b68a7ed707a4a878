pub mod base;
pub mod promotions;
pub mod results;
pub mod schedule;

use std::{thread, time::Duration};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Where page HTML comes from. The HTTP source is the only production one;
/// tests hand in canned pages.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpSource {
    client: Client,
    retries: u32,
    backoff: Duration,
}

impl HttpSource {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("unable to build http client")?;
        Ok(Self {
            client,
            retries: config.http_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    fn get_once(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .header(reqwest::header::ACCEPT_ENCODING, "identity")
            .send()?
            .error_for_status()?
            .text()
    }
}

impl PageSource for HttpSource {
    /// Connection failures and timeouts are retried with exponential backoff;
    /// HTTP error statuses are returned straight away.
    fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            debug!(url, attempt, "fetching page");
            match self.get_once(url) {
                Ok(body) => return Ok(body),
                Err(err) if base::is_retryable(&err) && attempt < self.retries => {
                    let delay = base::backoff_delay(self.backoff, attempt);
                    warn!(url, attempt, ?delay, "request failed, retrying: {err}");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("request failed for {url}"));
                }
            }
        }
    }
}
