use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::SinkExt;
use warp::ws::Message;
use warp::ws::WebSocket;

use super::NotificationSink;
use crate::NotifyError;
use crate::Result;

/// `NotificationSink` over the write half of an upgraded warp WebSocket
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl NotificationSink for WsSink {
    async fn send_text(
        &mut self,
        text: String,
    ) -> Result<()> {
        self.inner
            .send(Message::text(text))
            .await
            .map_err(|e| NotifyError::Send(e.to_string()).into())
    }

    async fn close(&mut self) -> Result<()> {
        self.inner
            .close()
            .await
            .map_err(|e| NotifyError::Close(e.to_string()).into())
    }
}
