//! WhatsApp channel backed by a ZapMeow gateway.
//!
//! ZapMeow owns the WhatsApp connection. Inbound traffic arrives as webhooks
//! (`POST /webhook`), outbound text goes through its REST API. The channel
//! only translates between ZapMeow's bare numbers and JIDs and applies the
//! registered-chat filter.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::ZapMeowClient;
use crate::config::Config;
use crate::error::ChannelError;
use crate::jid::{bare_address, is_group_jid, is_whatsapp_jid, to_jid};
use crate::platform::{Channel, ChannelEvents, InboundMessage, RegistryAccessor};
use crate::webhook::{WebhookBody, WebhookServer};

/// Platform tag reported to the dispatch layer
pub const CHANNEL_NAME: &str = "whatsapp";

/// Treat empty strings from the gateway the same as missing fields.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Turns decoded webhooks into dispatch-layer callbacks.
pub struct InboundHandler {
    config: Arc<Config>,
    events: Arc<dyn ChannelEvents>,
    registered_groups: RegistryAccessor,
}

impl InboundHandler {
    pub fn new(
        config: Arc<Config>,
        events: Arc<dyn ChannelEvents>,
        registered_groups: RegistryAccessor,
    ) -> Self {
        Self {
            config,
            events,
            registered_groups,
        }
    }

    /// Metadata is reported for every chat; content only for registered ones.
    pub async fn handle(&self, payload: WebhookBody) -> Result<()> {
        let Some(msg) = payload.message else {
            return Ok(());
        };
        let Some(chat) = non_empty(msg.chat.as_deref()) else {
            return Ok(());
        };

        debug!(
            instance = ?payload.instance_id,
            chat,
            media_type = ?msg.media_type,
            "ZapMeow webhook received"
        );

        let chat_jid = to_jid(chat);
        let sender = non_empty(msg.sender.as_deref());
        let sender_jid = sender.map(to_jid).unwrap_or_else(|| chat_jid.clone());
        let timestamp = non_empty(msg.timestamp.as_deref())
            .map(str::to_string)
            .unwrap_or_else(now_timestamp);
        let is_group = is_group_jid(&chat_jid);

        self.events
            .on_chat_metadata(&chat_jid, &timestamp, None, CHANNEL_NAME, is_group)
            .await?;

        let groups = (self.registered_groups)();
        if !groups.contains_key(&chat_jid) {
            return Ok(());
        }

        let content = msg.body.clone().unwrap_or_default();
        let is_from_me = msg.from_me.unwrap_or(false);
        let is_bot_message = self.is_bot_message(&content, is_from_me);

        let id = non_empty(msg.message_id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| msg.id.unwrap_or_default().to_string());
        let sender_name = sender
            .map(str::to_string)
            .unwrap_or_else(|| bare_address(&sender_jid).to_string());

        let message = InboundMessage {
            id,
            chat_jid: chat_jid.clone(),
            sender: sender_jid,
            sender_name,
            content,
            timestamp,
            is_from_me,
            is_bot_message,
        };

        self.events.on_message(&chat_jid, message).await
    }

    /// With its own number the gateway's from_me flag is reliable. Without
    /// one the assistant shares the user's account, so its messages are
    /// recognised by the name prefix the sender adds.
    ///
    /// A person typing the prefix by hand is misclassified as the assistant.
    fn is_bot_message(&self, content: &str, is_from_me: bool) -> bool {
        if self.config.assistant.has_own_number {
            is_from_me
        } else {
            content.starts_with(&format!("{}:", self.config.assistant.name))
        }
    }
}

pub struct ZapMeowChannel {
    config: Arc<Config>,
    handler: Arc<InboundHandler>,
    client: ZapMeowClient,
    connected: Arc<AtomicBool>,
    server: Mutex<Option<WebhookServer>>,
}

impl ZapMeowChannel {
    pub fn new(
        config: Arc<Config>,
        events: Arc<dyn ChannelEvents>,
        registered_groups: RegistryAccessor,
    ) -> Self {
        let handler = Arc::new(InboundHandler::new(
            Arc::clone(&config),
            events,
            registered_groups,
        ));
        let client = ZapMeowClient::new(Arc::clone(&config));
        Self {
            config,
            handler,
            client,
            connected: Arc::new(AtomicBool::new(false)),
            server: Mutex::new(None),
        }
    }

    /// Address the webhook listener is bound to, while it runs.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().await.as_ref().map(|s| s.local_addr())
    }
}

#[async_trait]
impl Channel for ZapMeowChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn connect(&self) -> Result<(), ChannelError> {
        let mut server = self.server.lock().await;
        if server.is_some() {
            debug!("ZapMeow webhook listener already running");
            return Ok(());
        }

        let addr = format!(
            "{}:{}",
            self.config.zapmeow.webhook_bind, self.config.zapmeow.webhook_port
        );
        let started = WebhookServer::start(
            &addr,
            Arc::clone(&self.handler),
            Arc::clone(&self.connected),
        )
        .await?;

        self.connected.store(true, Ordering::SeqCst);
        info!(addr = %started.local_addr(), "ZapMeow webhook listener started");
        *server = Some(started);
        Ok(())
    }

    async fn send_message(&self, jid: &str, text: &str) {
        match self.client.send_text(jid, text).await {
            Ok(()) => {}
            Err(ChannelError::Rejected { status, body }) => {
                warn!(jid, %status, "ZapMeow send failed: {}", body);
            }
            Err(e) => {
                error!(jid, "Failed to send message via ZapMeow: {}", e);
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn owns_jid(&self, jid: &str) -> bool {
        is_whatsapp_jid(jid)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let server = self.server.lock().await.take();
        if let Some(server) = server {
            server.shutdown().await;
            info!("ZapMeow webhook listener stopped");
        }
    }

    async fn set_typing(&self, _jid: &str, _is_typing: bool) -> Result<(), ChannelError> {
        // ZapMeow has no typing indicator API
        Ok(())
    }

    async fn sync_group_metadata(&self, _force: bool) -> Result<(), ChannelError> {
        // ZapMeow keeps its own group state
        Ok(())
    }
}
