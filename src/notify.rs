//! Outbound webhook notifications.
//!
//! Delivery is fire-and-forget: callers go through [`deliver_permissive`], which
//! logs transport failures and never lets them change a run's outcome.

use crate::config::NotifyConfig;
use crate::error::{ReleaseError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Actor used when the config does not name one
pub const DEFAULT_ACTOR: &str = "release-health";

/// JSON body posted to the webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub repository: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub project: String,
    pub url: String,
}

impl WebhookPayload {
    /// Start a payload for `event` with the static fields taken from `config`.
    pub fn new(event: impl Into<String>, config: &NotifyConfig) -> Self {
        WebhookPayload {
            event: event.into(),
            repository: config.repository.clone(),
            git_ref: String::new(),
            sha: String::new(),
            actor: config
                .actor
                .clone()
                .filter(|actor| !actor.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
            timestamp: Utc::now(),
            message: String::new(),
            project: config.project.clone(),
            url: config.url.clone(),
        }
    }

    pub fn git_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = git_ref.into();
        self
    }

    pub fn sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = sha.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Delivers payloads to an external collaborator
pub trait Notifier {
    fn send(&self, payload: &WebhookPayload) -> Result<()>;
}

/// Posts payloads as JSON over HTTP
pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| ReleaseError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(WebhookNotifier {
            client,
            url: url.into(),
        })
    }

    /// Build a notifier when a webhook URL is configured.
    pub fn from_config(config: &NotifyConfig) -> Result<Option<Self>> {
        config
            .webhook_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(WebhookNotifier::new)
            .transpose()
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, payload: &WebhookPayload) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .map_err(|e| ReleaseError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ReleaseError::transport(format!(
                "webhook responded with {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Send `payload`, logging and swallowing any failure.
///
/// Returns whether delivery succeeded.
pub fn deliver_permissive(notifier: &dyn Notifier, payload: &WebhookPayload) -> bool {
    match notifier.send(payload) {
        Ok(()) => {
            tracing::info!(event = %payload.event, "notification delivered");
            true
        }
        Err(e) => {
            tracing::warn!(event = %payload.event, error = %e, "notification failed, ignoring");
            false
        }
    }
}
