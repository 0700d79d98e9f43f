mod config_registry;
mod entry;
mod identifier;

pub use config_registry::*;
pub use entry::*;
pub use identifier::*;
