use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_address: SocketAddr,

    /// Upper bound for an uploaded PAC script, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.port() == 0 {
            return Err(Error::InvalidConfig(
                "server.listen_address port cannot be 0".into(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(Error::InvalidConfig(
                "server.max_upload_bytes must be > 0".into(),
            ));
        }

        Ok(())
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8008))
}

fn default_max_upload_bytes() -> u64 {
    64 * 1024
}
