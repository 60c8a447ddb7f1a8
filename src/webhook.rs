//! HTTP listener for ZapMeow webhooks.
//!
//! ZapMeow POSTs every message it sees to `/webhook`. The request is
//! acknowledged before the payload is even decoded; decoding and dispatch run
//! on a detached task so a slow dispatch layer never stalls the gateway.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::ChannelError;
use crate::platform::zapmeow::InboundHandler;

/// Longest body excerpt written to the log when a payload fails to decode.
const BODY_EXCERPT_CHARS: usize = 200;

/// Webhook payload sent by ZapMeow.
///
/// Every field is optional so that partially filled payloads still decode;
/// the handler decides what is usable.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookBody {
    #[serde(rename = "instanceId", default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub message: Option<WebhookMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookMessage {
    pub id: Option<i64>,
    /// Bare phone number, no @server
    pub sender: Option<String>,
    /// Bare phone number or group id, no @server
    pub chat: Option<String>,
    pub message_id: Option<String>,
    pub from_me: Option<bool>,
    pub timestamp: Option<String>,
    pub body: Option<String>,
    pub media_type: Option<String>,
}

/// A running webhook listener.
pub struct WebhookServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WebhookServer {
    /// Bind `addr` and start serving. Returns only after the bind succeeded.
    ///
    /// `running` is cleared if the server stops on its own because of an error.
    pub async fn start(
        addr: &str,
        handler: Arc<InboundHandler>,
        running: Arc<AtomicBool>,
    ) -> Result<Self, ChannelError> {
        let bind_err = |source| ChannelError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(handler);

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                running.store(false, Ordering::SeqCst);
                error!("ZapMeow webhook server error: {}", e);
            }
        });

        Ok(Self {
            local_addr,
            shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait until the server has fully closed.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!("ZapMeow webhook server task failed: {}", e);
        }
    }
}

/// Routes: `POST /webhook`, everything else is a bare 404.
///
/// The gateway is acknowledged whatever it sends, so there is no body size limit.
pub fn router(handler: Arc<InboundHandler>) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .with_state(handler)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn receive_webhook(
    State(handler): State<Arc<InboundHandler>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> StatusCode {
    // Only the exact path is accepted, "/webhook?..." included
    if query.is_some() {
        return StatusCode::NOT_FOUND;
    }
    tokio::spawn(process_notification(handler, body));
    StatusCode::OK
}

/// Decode a webhook body. Valid JSON that is not an object (e.g. `null`)
/// carries no message and decodes to `None`.
fn decode_payload(body: &[u8]) -> Result<Option<WebhookBody>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some)
}

/// Decode and dispatch one notification. Every failure ends here as a log line.
async fn process_notification(handler: Arc<InboundHandler>, body: Bytes) {
    let payload = match decode_payload(&body) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!("Ignoring ZapMeow webhook without a message object");
            return;
        }
        Err(e) => {
            warn!(
                error = %e,
                body = %body_excerpt(&body),
                "Failed to parse ZapMeow webhook body"
            );
            return;
        }
    };

    let chat = payload.message.as_ref().and_then(|m| m.chat.clone());
    if let Err(e) = handler.handle(payload).await {
        error!(chat = ?chat, "ZapMeow webhook handler error: {:#}", e);
    }
}

fn body_excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_EXCERPT_CHARS)
        .collect()
}
