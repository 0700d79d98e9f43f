//! Error hierarchy for the PAC relay
//!
//! Errors are grouped by the layer that raises them: configuration, the
//! config registry, the notification channel and the producer client.

use config::ConfigError;

use crate::ConfigId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration source failures (missing file, bad TOML, bad env value)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration that loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Registry rule violations (conflicting upload, unknown id on attach)
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Notification channel transport failures
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Producer-side client failures
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Prometheus registry failures (duplicate or inconsistent collectors)
    #[error(transparent)]
    Metrics(#[from] prometheus::Error),

    /// HTTP listener failures (bind errors)
    #[error(transparent)]
    Server(#[from] warp::Error),

    /// Shutdown signal could not reach the server task
    #[error("{0}")]
    SignalSenderClosed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Re-upload while a notification channel is attached
    #[error("Active config for the same secret already exists")]
    AlreadyActive(ConfigId),

    /// Attach for an identifier nobody uploaded
    #[error("No config registered for {0}")]
    NotFound(ConfigId),

    /// Attach for an entry that already has a listener
    #[error("Config {0} already has an attached listener")]
    AlreadyAttached(ConfigId),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    Send(String),

    #[error("Failed to close notification channel: {0}")]
    Close(String),

    /// Too many pushes already waiting on a stalled connection
    #[error("Notification dropped: {0} pushes already pending")]
    Backlogged(usize),

    #[error("Notification send timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Server answered the upload with a non-200 status
    #[error("Error {status}: {body}")]
    Upload { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Secret store error: {0}")]
    SecretStore(String),

    /// Secret that cannot travel in an HTTP header
    #[error("Secret is not a valid header value")]
    InvalidSecret,

    #[error("Failed to get local IP")]
    NoLocalAddress,

    /// Server URL that is not plain `http://`
    #[error("Unsupported server URL {0}: only http:// is supported")]
    UnsupportedScheme(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Client(ClientError::Http(e))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Client(ClientError::WebSocket(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Client(ClientError::SecretStore(e.to_string()))
    }
}
