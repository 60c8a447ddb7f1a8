pub mod zapmeow;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::ChannelError;

/// A normalized message received from any platform
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Platform message id
    pub id: String,
    /// JID of the conversation
    pub chat_jid: String,
    /// JID of the author
    pub sender: String,
    /// Display name of the author
    pub sender_name: String,
    /// The message text
    pub content: String,
    /// Timestamp string as reported by the platform
    pub timestamp: String,
    /// Whether the platform says the message came from our own account
    pub is_from_me: bool,
    /// Whether the message looks like the assistant's own output
    pub is_bot_message: bool,
}

/// Registration record of a chat the dispatch layer is actively serving.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredGroup {
    pub name: String,
    pub folder: String,
    pub trigger: Option<String>,
    pub added_at: Option<String>,
}

/// Returns the current registry snapshot. Called once per inbound notification.
pub type RegistryAccessor = Arc<dyn Fn() -> HashMap<String, RegisteredGroup> + Send + Sync>;

/// Callbacks a channel uses to hand traffic to the dispatch layer.
#[async_trait]
pub trait ChannelEvents: Send + Sync {
    /// Message content for a registered chat.
    async fn on_message(&self, chat_jid: &str, message: InboundMessage) -> Result<()>;

    /// Activity seen on any chat, registered or not.
    async fn on_chat_metadata(
        &self,
        chat_jid: &str,
        timestamp: &str,
        name: Option<&str>,
        channel: &str,
        is_group: bool,
    ) -> Result<()>;
}

/// Capability contract shared by every channel adapter.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Platform identifier (e.g., "whatsapp", "telegram")
    fn name(&self) -> &str;

    /// Start receiving traffic. Returns once the channel is live.
    async fn connect(&self) -> Result<(), ChannelError>;

    /// Best-effort delivery; failures are logged, never returned.
    async fn send_message(&self, jid: &str, text: &str);

    fn is_connected(&self) -> bool;

    /// Whether outbound traffic for `jid` should go through this channel.
    fn owns_jid(&self, jid: &str) -> bool;

    async fn disconnect(&self);

    async fn set_typing(&self, jid: &str, is_typing: bool) -> Result<(), ChannelError>;

    async fn sync_group_metadata(&self, force: bool) -> Result<(), ChannelError>;
}

/// First channel that claims the JID.
pub fn find_channel<'a>(channels: &'a [Arc<dyn Channel>], jid: &str) -> Option<&'a Arc<dyn Channel>> {
    channels.iter().find(|c| c.owns_jid(jid))
}

/// Send text through whichever channel owns the JID.
pub async fn route_outbound(channels: &[Arc<dyn Channel>], jid: &str, text: &str) -> Result<()> {
    let channel = find_channel(channels, jid)
        .ok_or_else(|| anyhow::anyhow!("No channel owns JID: {}", jid))?;
    channel.send_message(jid, text).await;
    Ok(())
}
