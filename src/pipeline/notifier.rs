//! Alert delivery
//!
//! `LarkNotifier` posts a text message to a Lark/Feishu custom bot webhook.
//! `DryRunNotifier` only logs what would have been sent.

use super::alert::Alert;
use crate::error::NotifyError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert; any error means it was not delivered
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError>;
}

/// Lark bot reply; `code == 0` means accepted
#[derive(Debug, Deserialize)]
struct LarkResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

pub struct LarkNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl LarkNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    pub fn payload(alert: &Alert) -> serde_json::Value {
        json!({
            "msg_type": "text",
            "content": {
                "text": alert.render_text(),
            }
        })
    }
}

#[async_trait]
impl Notifier for LarkNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(alert))
            .send()
            .await?
            .error_for_status()?;

        let reply: LarkResponse = response.json().await?;
        check_reply(reply)
    }
}

fn check_reply(reply: LarkResponse) -> Result<(), NotifyError> {
    if reply.code != 0 {
        return Err(NotifyError::Rejected(format!("code {}: {}", reply.code, reply.msg)));
    }
    Ok(())
}

/// Logs alerts instead of delivering them
#[derive(Debug, Default)]
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        log::info!("[dry-run] would send:\n{}", alert.render_text());
        Ok(())
    }
}
