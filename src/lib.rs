//! PAC relay: serves proxy auto-config scripts under secret-derived ids and
//! pushes a notification to the script's owner every time it is fetched.

mod client;
mod config;
pub mod constants;
mod errors;
mod http;
mod metrics;
mod notify;
mod registry;

pub use client::*;
pub use config::*;
pub use errors::*;
pub use http::*;
pub use metrics::*;
pub use notify::*;
pub use registry::*;
