use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::Mutex;
use tokio::time;
use tracing::debug;

use crate::constants::MAX_PENDING_NOTIFICATIONS;
use crate::constants::NOTIFY_SEND_TIMEOUT_IN_SECS;
use crate::ConfigId;
use crate::NotifyError;
use crate::Result;

/// Write half of a producer's live connection.
///
/// The server only ever pushes text to the owner; reading is done by the
/// session that owns the other half.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSink: Send + 'static {
    async fn send_text(
        &mut self,
        text: String,
    ) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Push side of the channel attached to one registry entry.
///
/// The sink sits behind its own async mutex: concurrent pushes to the same
/// entry are serialized, pushes to different entries never contend.
///
/// A peer that stops reading can stall a write. Each write is bounded by
/// `NOTIFY_SEND_TIMEOUT_IN_SECS` and at most `MAX_PENDING_NOTIFICATIONS`
/// pushes may wait for the sink; further pushes are dropped.
pub struct NotificationChannel {
    id: ConfigId,
    sink: Mutex<Box<dyn NotificationSink>>,
    pending: AtomicUsize,
}

/// Holds one pending slot until dropped, including on cancellation
struct PendingSlot<'a>(&'a AtomicUsize);

impl<'a> PendingSlot<'a> {
    fn acquire(pending: &'a AtomicUsize) -> Option<Self> {
        if pending.fetch_add(1, Ordering::AcqRel) >= MAX_PENDING_NOTIFICATIONS {
            pending.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(Self(pending))
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl NotificationChannel {
    pub fn new(
        id: ConfigId,
        sink: impl NotificationSink,
    ) -> Self {
        Self {
            id,
            sink: Mutex::new(Box::new(sink)),
            pending: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &ConfigId {
        &self.id
    }

    /// Pushes currently queued on or writing to the sink
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Write one text frame. Not retried.
    pub async fn send(
        &self,
        text: &str,
    ) -> Result<()> {
        let Some(_slot) = PendingSlot::acquire(&self.pending) else {
            return Err(NotifyError::Backlogged(MAX_PENDING_NOTIFICATIONS).into());
        };

        let mut sink = self.sink.lock().await;
        time::timeout(
            Duration::from_secs(NOTIFY_SEND_TIMEOUT_IN_SECS),
            sink.send_text(text.to_string()),
        )
        .await
        .map_err(|_| NotifyError::Timeout(NOTIFY_SEND_TIMEOUT_IN_SECS))?
    }

    /// Close the network connection. Errors mean it was already gone.
    pub async fn close(&self) {
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!(id = %self.id, "close on finished connection: {:?}", e);
        }
    }
}
