use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::constants::DEFAULT_SECRET_FILE;
use crate::ClientError;
use crate::Result;

#[derive(Debug, Serialize, Deserialize)]
struct SecretFile {
    secret: String,
}

/// `~/.pac-relay.json`, or `None` when there is no home directory
pub fn default_secret_path() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DEFAULT_SECRET_FILE))
}

/// Read the producer secret, creating the file with a fresh random secret on
/// first use. The same secret across runs means the same PAC URL.
pub fn load_or_create_secret(path: &Path) -> Result<String> {
    if !path.exists() {
        info!("No secret file found at {}, creating one", path.display());
        let file = SecretFile {
            secret: nanoid::nanoid!(32),
        };
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;
    }

    let raw = fs::read(path)?;
    let file: SecretFile = serde_json::from_slice(&raw)?;
    if file.secret.is_empty() {
        return Err(ClientError::SecretStore(format!(
            "{} contains an empty secret",
            path.display()
        ))
        .into());
    }
    Ok(file.secret)
}
