//! HTTP surface of the relay.
//!
//! | Route            | Purpose                                           |
//! |------------------|---------------------------------------------------|
//! | `POST /upload`   | Register a PAC script under `sha1(X-Secret)`      |
//! | `GET /ws`        | Attach the owner's notification WebSocket         |
//! | `GET /pac/{id}`  | Serve the script (or go-direct) and notify owner  |
//! | `GET /metrics`   | Prometheus exposition, not instrumented itself    |

mod handlers;
mod rejection;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use prometheus::Registry;
use tokio::sync::watch;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::constants::PAC_ROUTE;
use crate::constants::REAL_IP_HEADER;
use crate::constants::SECRET_HEADER;
use crate::constants::UPLOAD_ROUTE;
use crate::constants::WS_ROUTE;
use crate::metrics;
use crate::notify::run_session;
use crate::ConfigRegistry;
use crate::Result;

/// Upload, notification and PAC routes, with rejections recovered into
/// plain-text replies and every reply recorded in the request metrics.
pub fn api_routes(
    registry: Arc<ConfigRegistry>,
    max_upload_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    upload_route(registry.clone(), max_upload_bytes)
        .or(ws_route(registry.clone()))
        .or(pac_route(registry))
        .recover(rejection::handle_rejection)
        .with(warp::log::custom(|info| {
            if let Some(route) = route_label(info.path()) {
                metrics::record_request(
                    info.method().as_str(),
                    route,
                    info.status().as_u16(),
                    info.elapsed(),
                );
            }
        }))
}

/// Everything the server binary exposes
pub fn routes(
    registry: Arc<ConfigRegistry>,
    max_upload_bytes: u64,
    metrics_registry: Registry,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    metrics::metrics_route(metrics_registry).or(api_routes(registry, max_upload_bytes))
}

/// Serve until `shutdown_signal` fires.
pub async fn start_server(
    addr: SocketAddr,
    registry: Arc<ConfigRegistry>,
    max_upload_bytes: u64,
    metrics_registry: Registry,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<()> {
    let (bound, server) = warp::serve(routes(registry, max_upload_bytes, metrics_registry))
        .try_bind_with_graceful_shutdown(addr, async move {
            let _ = shutdown_signal.changed().await;
        })?;

    info!("PAC server is listening on {}", bound);
    server.await;
    info!("PAC server stopped");
    Ok(())
}

fn upload_route(
    registry: Arc<ConfigRegistry>,
    max_upload_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("upload")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::header::optional::<String>(SECRET_HEADER))
        .and(warp::body::stream())
        .and(warp::any().map(move || max_upload_bytes))
        .and(with_registry(registry))
        .and_then(handlers::upload)
}

fn ws_route(
    registry: Arc<ConfigRegistry>
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("ws")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::ws())
        .and(warp::header::optional::<String>(SECRET_HEADER))
        .and(with_registry(registry))
        .map(
            |ws: warp::ws::Ws, secret: Option<String>, registry: Arc<ConfigRegistry>| {
                ws.on_upgrade(move |socket| run_session(registry, socket, secret))
            },
        )
}

fn pac_route(
    registry: Arc<ConfigRegistry>
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("pac")
        .and(warp::path::tail())
        .and(warp::get())
        .and(warp::addr::remote())
        .and(warp::header::optional::<String>(REAL_IP_HEADER))
        .and(warp::header::optional::<String>("user-agent"))
        .and(with_registry(registry))
        .and_then(handlers::pac)
}

fn with_registry(
    registry: Arc<ConfigRegistry>
) -> impl Filter<Extract = (Arc<ConfigRegistry>,), Error = Infallible> + Clone {
    warp::any().map(move || registry.clone())
}

/// Metric `handler` label for a request path; `None` for paths outside the
/// instrumented routes.
pub(crate) fn route_label(path: &str) -> Option<&'static str> {
    match path {
        "/upload" => Some(UPLOAD_ROUTE),
        "/ws" => Some(WS_ROUTE),
        p if p == "/pac" || p.starts_with("/pac/") => Some(PAC_ROUTE),
        _ => None,
    }
}
