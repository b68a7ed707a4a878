use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("missing pushover token")]
    MissingToken,
    #[error("missing pushover user")]
    MissingUser,
    #[error("http error: {0}")]
    Http(String),
    #[error("pushover api error: {0}")]
    Api(String),
}

/// Fire-and-forget delivery; implementations log failures instead of returning them.
pub trait Notifier {
    fn send(&self, message: &str);
}

pub struct Pushover {
    token: String,
    user: String,
    client: Client,
}

impl Pushover {
    pub fn from_config(config: &AppConfig) -> Result<Self, NotifyError> {
        let token = config
            .pushover_token
            .as_ref()
            .ok_or(NotifyError::MissingToken)?
            .trim()
            .to_string();
        if token.is_empty() {
            return Err(NotifyError::MissingToken);
        }

        let user = config
            .pushover_user
            .as_ref()
            .ok_or(NotifyError::MissingUser)?
            .trim()
            .to_string();
        if user.is_empty() {
            return Err(NotifyError::MissingUser);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|err| NotifyError::Http(err.to_string()))?;

        debug!("Pushover token: ****{}", masked(&token));
        Ok(Self {
            token,
            user,
            client,
        })
    }

    pub fn push_message(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(PUSHOVER_ENDPOINT)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("message", message),
            ])
            .send()
            .map_err(|err| NotifyError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NotifyError::Api(format!("{status}: {body}")));
        }
        Ok(())
    }
}

impl Notifier for Pushover {
    fn send(&self, message: &str) {
        info!("Sending Pushover notification");
        debug!("Pushover message: {message}");
        if let Err(err) = self.push_message(message) {
            warn!("pushover notification failed: {err}");
        }
    }
}

/// Used when no push credentials are configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &str) {
        info!("notification (not delivered): {message}");
    }
}

pub fn from_config(config: &AppConfig) -> Box<dyn Notifier> {
    match Pushover::from_config(config) {
        Ok(pushover) => Box::new(pushover),
        Err(err) => {
            warn!("push notifications disabled: {err}");
            Box::new(LogNotifier)
        }
    }
}

pub fn results_message(summary: &str) -> String {
    if summary.is_empty() {
        "Scraper complete, no shows added.".to_string()
    } else {
        format!("Scraper complete, added shows:\n{summary}")
    }
}

pub fn schedule_message(summary: &str) -> Option<String> {
    if summary.is_empty() {
        None
    } else {
        Some(format!("Schedule updated, added shows:\n{summary}"))
    }
}

fn masked(secret: &str) -> &str {
    secret.get(..4).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_message_depends_on_summary() {
        assert_eq!(results_message(""), "Scraper complete, no shows added.");
        assert_eq!(
            results_message("NOAH - Star Navigation \nDDT - Judgement "),
            "Scraper complete, added shows:\nNOAH - Star Navigation \nDDT - Judgement "
        );
    }

    #[test]
    fn schedule_message_only_when_something_was_added() {
        assert_eq!(schedule_message(""), None);
        assert_eq!(
            schedule_message("Pro Wrestling NOAH, 18:30").as_deref(),
            Some("Schedule updated, added shows:\nPro Wrestling NOAH, 18:30")
        );
    }

    #[test]
    fn pushover_needs_credentials() {
        let config = AppConfig::default();
        assert!(matches!(
            Pushover::from_config(&config),
            Err(NotifyError::MissingToken)
        ));

        let config = AppConfig {
            pushover_token: Some("abcd1234".into()),
            pushover_user: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(matches!(
            Pushover::from_config(&config),
            Err(NotifyError::MissingUser)
        ));
    }

    #[test]
    fn mask_shows_only_prefix() {
        assert_eq!(masked("abcd1234"), "abcd");
        assert_eq!(masked("ab"), "");
    }
}
