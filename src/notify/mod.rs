mod channel;
mod session;
mod ws_sink;

pub use channel::*;
pub use session::*;
pub use ws_sink::*;
