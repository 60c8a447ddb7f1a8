//! HTTP client for the ZapMeow REST API.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ChannelError;
use crate::jid::bare_address;

const CONNECT_TIMEOUT_SECS: u64 = 5;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    phone: &'a str,
    text: &'a str,
}

pub struct ZapMeowClient {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl ZapMeowClient {
    pub fn new(config: Arc<Config>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self { client, config }
    }

    /// Endpoint for plain text sends on the configured instance.
    pub fn send_url(&self) -> String {
        format!(
            "{}/{}/chat/send/text",
            self.config.zapmeow.base_url.trim_end_matches('/'),
            self.config.zapmeow.instance_id
        )
    }

    /// Text as it should appear on the wire. Without a dedicated number the
    /// assistant shares the user's account, so its messages carry a name prefix.
    pub fn outbound_text(&self, text: &str) -> String {
        if self.config.assistant.has_own_number {
            text.to_string()
        } else {
            format!("{}: {}", self.config.assistant.name, text)
        }
    }

    /// Send a text message to the chat identified by `jid`.
    pub async fn send_text(&self, jid: &str, text: &str) -> Result<(), ChannelError> {
        let text = self.outbound_text(text);
        let phone = bare_address(jid);
        let url = self.send_url();

        debug!("Sending message to ZapMeow: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&SendTextRequest { phone, text: &text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected { status, body });
        }

        info!(jid, length = text.len(), "Message sent via ZapMeow");
        Ok(())
    }
}
