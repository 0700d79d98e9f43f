use std::collections::HashMap;
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::constants::INSTRUMENTED_ROUTES;
use crate::Result;

lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "The total number of processed requests"),
        &["method", "handler", "code"]
    )
    .expect("metric can not be created");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("http_requests_duration_seconds", "The timings of all requests"),
        &["method", "handler"]
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_CONFIGS: IntGauge = IntGauge::new(
        "pac_active_configs",
        "Active configs served by the server"
    )
    .expect("metric can not be created");
}

/// Registry whose series all carry the constant `hostname` label
pub fn new_metrics_registry(hostname: &str) -> Result<Registry> {
    let labels = HashMap::from([("hostname".to_string(), hostname.to_string())]);
    Ok(Registry::new_custom(None, Some(labels))?)
}

pub fn register_custom_metrics(registry: &Registry) -> Result<()> {
    registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    registry.register(Box::new(ACTIVE_CONFIGS.clone()))?;
    Ok(())
}

/// Create the zero-valued series of every instrumented route so they are
/// exported before the first request.
pub fn set_default_routes_metrics() {
    for (method, route) in INSTRUMENTED_ROUTES {
        set_default_route_metrics(method, route);
    }
}

fn set_default_route_metrics(
    method: &str,
    route: &str,
) {
    HTTP_REQUESTS_TOTAL.with_label_values(&[method, route, "200"]).inc_by(0);
    HTTP_REQUESTS_TOTAL.with_label_values(&[method, route, "500"]).inc_by(0);
    // Histograms have no zero observation; touching the label set exports
    // the series with count 0.
    let _ = HTTP_REQUEST_DURATION_SECONDS.with_label_values(&[method, route]);
}

pub fn record_request(
    method: &str,
    route: &str,
    status: u16,
    elapsed: Duration,
) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed.as_secs_f64());
}

/// `GET /metrics`
pub fn metrics_route(
    registry: Registry
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("metrics")
        .and(warp::get())
        .map(move || registry.clone())
        .and_then(metrics_handler)
}

async fn metrics_handler(registry: Registry) -> std::result::Result<impl Reply, Rejection> {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    let res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    Ok(warp::reply::with_header(
        res,
        "Content-Type",
        encoder.format_type(),
    ))
}
