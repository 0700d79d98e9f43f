//! Producer-side helpers: secret persistence, PAC generation, upload and
//! the notification listener used by the `pac-client` binary.

mod pac;
mod pac_client;
mod secret_store;

pub use pac::*;
pub use pac_client::*;
pub use secret_store::*;
