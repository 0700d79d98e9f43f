use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;

/// Registry key and public URL segment for one uploaded config.
///
/// Derived from the producer secret, so two producers sharing a secret claim
/// the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(String);

impl ConfigId {
    /// Hex-encoded SHA-1 of the secret (40 characters)
    pub fn derive(secret: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(secret.as_bytes());
        ConfigId(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ids taken verbatim from a request path or a server response
impl From<&str> for ConfigId {
    fn from(raw: &str) -> Self {
        ConfigId(raw.to_string())
    }
}

impl From<String> for ConfigId {
    fn from(raw: String) -> Self {
        ConfigId(raw)
    }
}
