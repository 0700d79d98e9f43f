use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::NotificationChannel;

/// One uploaded config as seen by readers.
///
/// `get` hands out clones: the content is an immutable `Bytes` generation and
/// the channel is a shared handle, so a reader never observes a half-replaced
/// entry. Only the registry decides which channel an entry carries.
#[derive(Clone)]
pub struct ConfigEntry {
    content: Bytes,
    channel: Option<Arc<NotificationChannel>>,
}

impl ConfigEntry {
    pub(crate) fn new(content: Bytes) -> Self {
        Self {
            content,
            channel: None,
        }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// An entry is active once a notification channel is attached
    pub fn is_active(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel(&self) -> Option<&Arc<NotificationChannel>> {
        self.channel.as_ref()
    }

    pub(crate) fn set_channel(
        &mut self,
        channel: Arc<NotificationChannel>,
    ) {
        self.channel = Some(channel);
    }

    pub(crate) fn take_channel(&mut self) -> Option<Arc<NotificationChannel>> {
        self.channel.take()
    }

    /// Push one text notification to the owner, if anyone is listening.
    ///
    /// Best-effort: failures are logged and dropped. The read loop of the
    /// channel notices a dead connection and removes the entry.
    pub async fn notify(
        &self,
        text: &str,
    ) {
        let Some(channel) = &self.channel else {
            return;
        };
        if let Err(e) = channel.send(text).await {
            warn!(id = %channel.id(), "Failed to send message to websocket: {:?}", e);
        }
    }
}

impl std::fmt::Debug for ConfigEntry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("content_len", &self.content.len())
            .field("active", &self.is_active())
            .finish()
    }
}
