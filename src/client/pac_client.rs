use std::time::Duration;

use futures::StreamExt;
use reqwest::StatusCode;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use tracing::warn;

use crate::constants::PAC_CONTENT_TYPE;
use crate::constants::SECRET_HEADER;
use crate::constants::UPLOAD_TIMEOUT_IN_SECS;
use crate::ClientError;
use crate::ConfigId;
use crate::Result;

/// Producer side of the relay: upload a script, then listen for accesses.
pub struct PacClient {
    http: reqwest::Client,
    server_url: String,
}

impl PacClient {
    /// # Arguments
    /// * `server_url` - Base URL such as `http://127.0.0.1:8008`. Only plain
    ///   `http://` is supported; the client carries no TLS stack.
    pub fn new(server_url: &str) -> Result<Self> {
        if !server_url.starts_with("http://") {
            return Err(ClientError::UnsupportedScheme(server_url.to_string()).into());
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_IN_SECS))
            .build()?;
        Ok(Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    /// `POST /upload`; returns the id the server derived from `secret`.
    pub async fn upload(
        &self,
        pac_content: &str,
        secret: &str,
    ) -> Result<ConfigId> {
        let response = self
            .http
            .post(format!("{}/upload", self.server_url))
            .header("Content-Type", PAC_CONTENT_TYPE)
            .header(SECRET_HEADER, secret)
            .body(pac_content.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(ClientError::Upload {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(ConfigId::from(body))
    }

    pub fn pac_url(
        &self,
        id: &ConfigId,
    ) -> String {
        format!("{}/pac/{}", self.server_url, id)
    }

    /// Notification endpoint, with the scheme switched to ws
    pub fn ws_url(&self) -> String {
        let host = self
            .server_url
            .strip_prefix("http://")
            .unwrap_or(&self.server_url);
        format!("ws://{}/ws", host)
    }

    /// Open the notification socket and hand every text frame to
    /// `on_message` until the server closes the connection.
    pub async fn listen<F>(
        &self,
        secret: &str,
        mut on_message: F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        let mut request = self.ws_url().into_client_request()?;
        let secret = HeaderValue::from_str(secret).map_err(|_| ClientError::InvalidSecret)?;
        request.headers_mut().insert(SECRET_HEADER, secret);

        let (mut stream, _) = tokio_tungstenite::connect_async(request).await?;
        debug!("Notification socket connected");

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => on_message(&text),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Websocket error, closing connection: {}", e);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}
