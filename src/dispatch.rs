use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::platform::{ChannelEvents, InboundMessage};

/// Dispatch layer for running the bridge standalone: it only logs traffic.
#[derive(Debug, Default)]
pub struct LoggingDispatcher;

impl LoggingDispatcher {
    /// Log line for a message, or `None` for the assistant's own output.
    fn describe(chat_jid: &str, message: &InboundMessage) -> Option<String> {
        if message.is_bot_message {
            return None;
        }
        Some(format!(
            "Message in {} from {} ({}): {}",
            chat_jid, message.sender_name, message.sender, message.content
        ))
    }
}

#[async_trait]
impl ChannelEvents for LoggingDispatcher {
    async fn on_message(&self, chat_jid: &str, message: InboundMessage) -> Result<()> {
        match Self::describe(chat_jid, &message) {
            Some(line) => info!("{}", line),
            None => debug!("Skipping own message in {}: {}", chat_jid, message.id),
        }
        Ok(())
    }

    async fn on_chat_metadata(
        &self,
        chat_jid: &str,
        timestamp: &str,
        name: Option<&str>,
        channel: &str,
        is_group: bool,
    ) -> Result<()> {
        debug!(
            chat_jid,
            timestamp,
            name,
            channel,
            is_group,
            "Chat activity"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(is_bot_message: bool) -> InboundMessage {
        InboundMessage {
            id: "1".to_string(),
            chat_jid: "447906616842@s.whatsapp.net".to_string(),
            sender: "447700900123@s.whatsapp.net".to_string(),
            sender_name: "447700900123".to_string(),
            content: "hi".to_string(),
            timestamp: "2026-01-01T10:00:00Z".to_string(),
            is_from_me: false,
            is_bot_message,
        }
    }

    #[test]
    fn test_describe_user_message() {
        let line = LoggingDispatcher::describe("447906616842@s.whatsapp.net", &message(false));
        assert_eq!(
            line.as_deref(),
            Some("Message in 447906616842@s.whatsapp.net from 447700900123 (447700900123@s.whatsapp.net): hi")
        );
    }

    #[test]
    fn test_describe_skips_bot_message() {
        assert!(LoggingDispatcher::describe("447906616842@s.whatsapp.net", &message(true)).is_none());
    }
}
