//! Test doubles for the dispatch layer and the chat registry.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::platform::{ChannelEvents, InboundMessage, RegisteredGroup, RegistryAccessor};

/// One recorded callback invocation.
#[derive(Debug, Clone)]
pub enum Event {
    Metadata {
        chat_jid: String,
        timestamp: String,
        name: Option<String>,
        channel: String,
        is_group: bool,
    },
    Message {
        chat_jid: String,
        message: InboundMessage,
    },
}

/// Forwards every callback into a channel so tests can await them.
pub struct RecordingEvents {
    tx: mpsc::UnboundedSender<Event>,
}

pub fn recording_events() -> (Arc<RecordingEvents>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingEvents { tx }), rx)
}

#[async_trait]
impl ChannelEvents for RecordingEvents {
    async fn on_message(&self, chat_jid: &str, message: InboundMessage) -> Result<()> {
        let _ = self.tx.send(Event::Message {
            chat_jid: chat_jid.to_string(),
            message,
        });
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
        let _ = self.tx.send(Event::Metadata {
            chat_jid: chat_jid.to_string(),
            timestamp: timestamp.to_string(),
            name: name.map(str::to_string),
            channel: channel.to_string(),
            is_group,
        });
        Ok(())
    }
}

/// Dispatch layer whose metadata callback always fails.
pub struct FailingEvents;

#[async_trait]
impl ChannelEvents for FailingEvents {
    async fn on_message(&self, _chat_jid: &str, _message: InboundMessage) -> Result<()> {
        Ok(())
    }

    async fn on_chat_metadata(
        &self,
        _chat_jid: &str,
        _timestamp: &str,
        _name: Option<&str>,
        _channel: &str,
        _is_group: bool,
    ) -> Result<()> {
        anyhow::bail!("metadata store unavailable")
    }
}

/// Fixed registry containing the given JIDs.
pub fn registry_of(jids: &[&str]) -> RegistryAccessor {
    let groups: HashMap<String, RegisteredGroup> = jids
        .iter()
        .map(|jid| {
            (
                jid.to_string(),
                RegisteredGroup {
                    name: jid.to_string(),
                    folder: "test".to_string(),
                    trigger: None,
                    added_at: None,
                },
            )
        })
        .collect();
    Arc::new(move || groups.clone())
}
