//! Lifecycle of one producer WebSocket.
//!
//! ```text
//! upgrade ──> derive id ──> attach ──> read until disconnect ──> remove
//!                 │            │
//!                 └─ rejected ─┴──> one text frame, close
//! ```
//!
//! The session task owns the read half for its whole life. The write half is
//! moved into the registry entry so access handlers can push to it.

use std::sync::Arc;

use futures::Stream;
use futures::StreamExt;
use tracing::debug;
use tracing::info;
use tracing::warn;
use warp::ws::Message;
use warp::ws::WebSocket;

use super::NotificationChannel;
use super::NotificationSink;
use super::WsSink;
use crate::constants::ALREADY_ATTACHED_MSG;
use crate::constants::INVALID_SECRET_MSG;
use crate::constants::MISSING_SECRET_MSG;
use crate::ConfigId;
use crate::ConfigRegistry;
use crate::RegistryError;

/// Why the read loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// Peer sent a close frame
    Closed,
    /// Peer sent a data frame; producers are not supposed to talk
    UnexpectedMessage,
    /// Transport error while reading
    ReadError(String),
    /// Stream ended without a close frame
    EndOfStream,
}

/// Drive an upgraded socket from attach to removal.
pub async fn run_session(
    registry: Arc<ConfigRegistry>,
    socket: WebSocket,
    secret: Option<String>,
) {
    let (tx, rx) = socket.split();
    let mut sink = WsSink::new(tx);

    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        warn!("Websocket without X-Secret header");
        reject(&mut sink, MISSING_SECRET_MSG).await;
        return;
    };

    let id = ConfigId::derive(&secret);
    let channel = Arc::new(NotificationChannel::new(id.clone(), sink));

    if let Err(e) = registry.attach(&id, channel.clone()) {
        warn!(%id, "Websocket attach rejected: {}", e);
        if let Err(e) = channel.send(rejection_message(&e)).await {
            debug!(%id, "Failed to explain rejection: {:?}", e);
        }
        channel.close().await;
        return;
    }

    let reason = wait_for_disconnect(rx).await;
    info!(%id, ?reason, "Websocket connection finished");

    registry.remove(&id).await;
}

/// Block on the read half until the peer goes away.
///
/// Ping/pong frames keep the loop alive; anything else ends it.
pub async fn wait_for_disconnect<S>(mut stream: S) -> Disconnect
where
    S: Stream<Item = Result<Message, warp::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(msg) if msg.is_ping() || msg.is_pong() => continue,
            Ok(msg) if msg.is_close() => return Disconnect::Closed,
            Ok(_) => return Disconnect::UnexpectedMessage,
            Err(e) => return Disconnect::ReadError(e.to_string()),
        }
    }
    Disconnect::EndOfStream
}

fn rejection_message(e: &RegistryError) -> &'static str {
    match e {
        RegistryError::NotFound(_) => INVALID_SECRET_MSG,
        RegistryError::AlreadyAttached(_) | RegistryError::AlreadyActive(_) => ALREADY_ATTACHED_MSG,
    }
}

async fn reject(
    sink: &mut impl NotificationSink,
    reason: &str,
) {
    if let Err(e) = sink.send_text(reason.to_string()).await {
        debug!("Failed to explain rejection: {:?}", e);
    }
    if let Err(e) = sink.close().await {
        debug!("Failed to close rejected websocket: {:?}", e);
    }
}
