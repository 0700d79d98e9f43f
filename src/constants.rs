// -
// HTTP surface

/// Header carrying the producer secret on `/upload` and `/ws`
pub const SECRET_HEADER: &str = "x-secret";

/// Header a fronting proxy sets with the original client address
pub const REAL_IP_HEADER: &str = "x-real-ip";

pub const PAC_CONTENT_TYPE: &str = "application/javascript";

/// Served for identifiers with no registered config
pub const DIRECT_PAC_CONTENT: &str = r#"function FindProxyForURL(url, host) { return "DIRECT"; }"#;

/// Route patterns used as the `handler` metric label
pub const UPLOAD_ROUTE: &str = "/upload";
pub const WS_ROUTE: &str = "/ws";
pub const PAC_ROUTE: &str = "/pac/{pac_id}";

/// Every instrumented (method, route) pair, pre-registered at startup
pub const INSTRUMENTED_ROUTES: &[(&str, &str)] =
    &[("POST", UPLOAD_ROUTE), ("GET", WS_ROUTE), ("GET", PAC_ROUTE)];

// -
// Notification texts

pub const MISSING_SECRET_MSG: &str = "Missing X-Secret header";
pub const INVALID_SECRET_MSG: &str = "Invalid X-Secret";
pub const ALREADY_ATTACHED_MSG: &str = "Config already has an attached listener";

/// Pushes allowed to wait on one channel before new ones are dropped
pub const MAX_PENDING_NOTIFICATIONS: usize = 32;
pub const NOTIFY_SEND_TIMEOUT_IN_SECS: u64 = 10;

// -
// Producer client

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8008";
pub const DEFAULT_SECRET_FILE: &str = ".pac-relay.json";
pub const DEFAULT_PROXY_PORTS: &[u16] = &[8888, 8080];
pub const UPLOAD_TIMEOUT_IN_SECS: u64 = 10;
