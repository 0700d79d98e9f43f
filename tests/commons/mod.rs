use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pac_relay::api_routes;
use pac_relay::ConfigId;
use pac_relay::ConfigRegistry;
use prometheus::IntGauge;
use tokio::time;

pub const MAX_UPLOAD_BYTES: u64 = 64 * 1024;

/// Frames that should arrive well before this
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to watch for a frame that must not come
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

pub fn test_registry() -> Arc<ConfigRegistry> {
    let gauge = IntGauge::new("integration_active_configs", "test gauge").unwrap();
    Arc::new(ConfigRegistry::with_gauge(gauge))
}

/// Attach happens inside the upgrade callback, after the handshake returns
pub async fn wait_until_active(
    registry: &ConfigRegistry,
    id: &ConfigId,
) {
    wait_for(|| registry.is_active(id), "listener to attach").await;
}

pub async fn wait_until_removed(
    registry: &ConfigRegistry,
    id: &ConfigId,
) {
    wait_for(|| registry.get(id).is_none(), "entry removal").await;
}

async fn wait_for(
    condition: impl Fn() -> bool,
    what: &str,
) {
    let deadline = time::Instant::now() + FRAME_TIMEOUT;
    while !condition() {
        if time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        time::sleep(Duration::from_millis(10)).await;
    }
}

/// Real TCP listener on an ephemeral port
pub fn spawn_server(registry: Arc<ConfigRegistry>) -> SocketAddr {
    let (addr, server) =
        warp::serve(api_routes(registry, MAX_UPLOAD_BYTES)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}
