use std::convert::Infallible;

use tracing::debug;
use tracing::error;
use warp::http::StatusCode;
use warp::reject::MethodNotAllowed;
use warp::reject::MissingHeader;
use warp::reply::Response;
use warp::Rejection;

use super::handlers::text_reply;

/// Turn warp rejections into plain-text 4xx/5xx replies
pub(crate) async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(text_reply("Not found", StatusCode::NOT_FOUND));
    }

    if let Some(e) = err.find::<MissingHeader>() {
        debug!("Rejected request: {}", e);
        return Ok(text_reply(&e.to_string(), StatusCode::BAD_REQUEST));
    }

    if err.find::<warp::reject::InvalidHeader>().is_some()
        || err.find::<warp::reject::InvalidQuery>().is_some()
    {
        return Ok(text_reply("Invalid request", StatusCode::BAD_REQUEST));
    }

    if err.find::<MethodNotAllowed>().is_some() {
        return Ok(text_reply(
            "Invalid method",
            StatusCode::METHOD_NOT_ALLOWED,
        ));
    }

    error!("Unhandled rejection: {:?}", err);
    Ok(text_reply(
        "Internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}
