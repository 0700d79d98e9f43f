use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;
use futures::Stream;
use futures::StreamExt;
use tracing::error;
use tracing::info;
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::constants::DIRECT_PAC_CONTENT;
use crate::constants::MISSING_SECRET_MSG;
use crate::constants::PAC_CONTENT_TYPE;
use crate::ConfigId;
use crate::ConfigRegistry;
use crate::RegistryError;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BodyError {
    TooLarge,
    Read(String),
}

/// `POST /upload`
pub(crate) async fn upload<S, B, E>(
    secret: Option<String>,
    body: S,
    max_upload_bytes: u64,
    registry: Arc<ConfigRegistry>,
) -> Result<Response, Infallible>
where
    S: Stream<Item = Result<B, E>>,
    B: Buf,
    E: std::fmt::Display,
{
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return Ok(text_reply(MISSING_SECRET_MSG, StatusCode::BAD_REQUEST));
    };

    let content = match read_body(body, max_upload_bytes).await {
        Ok(content) => content,
        Err(BodyError::TooLarge) => {
            warn!(max_upload_bytes, "Rejected oversized upload");
            return Ok(text_reply(
                "Request body too large",
                StatusCode::PAYLOAD_TOO_LARGE,
            ));
        }
        Err(BodyError::Read(e)) => {
            error!("Failed to read request body: {}", e);
            return Ok(text_reply(
                "Failed to read request body",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let id = ConfigId::derive(&secret);
    match registry.add(id.clone(), content) {
        Ok(()) => Ok(text_reply(id.as_str(), StatusCode::OK)),
        Err(e @ RegistryError::AlreadyActive(_)) => {
            Ok(text_reply(&e.to_string(), StatusCode::CONFLICT))
        }
        Err(e) => {
            error!(%id, "Unexpected registry error on upload: {}", e);
            Ok(text_reply(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// `GET /pac/{id}`
///
/// Unknown ids get the go-direct script. Known ids get their content and the
/// owner gets a notification, pushed from a separate task so a slow socket
/// never delays the reply.
pub(crate) async fn pac(
    tail: warp::path::Tail,
    remote: Option<SocketAddr>,
    real_ip: Option<String>,
    user_agent: Option<String>,
    registry: Arc<ConfigRegistry>,
) -> Result<Response, Infallible> {
    let raw_id = tail.as_str();
    if raw_id.is_empty() {
        return Ok(text_reply("Missing id parameter", StatusCode::BAD_REQUEST));
    }
    let id = ConfigId::from(raw_id);

    let client_ip = client_ip(real_ip, remote);
    let user_agent = user_agent.unwrap_or_default();
    info!(%id, %client_ip, %user_agent, "Config accessed");

    let Some(entry) = registry.get(&id) else {
        return Ok(script_reply(Bytes::from_static(DIRECT_PAC_CONTENT.as_bytes())));
    };

    let response = script_reply(entry.content().clone());

    if entry.is_active() {
        let text = format!("Config accessed by {} {}", client_ip, user_agent);
        tokio::spawn(async move {
            entry.notify(&text).await;
        });
    }

    Ok(response)
}

/// `X-Real-IP` wins over the socket peer
pub(crate) fn client_ip(
    real_ip: Option<String>,
    remote: Option<SocketAddr>,
) -> String {
    if let Some(ip) = real_ip.filter(|ip| !ip.is_empty()) {
        return ip;
    }
    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) async fn read_body<S, B, E>(
    body: S,
    limit: u64,
) -> Result<Bytes, BodyError>
where
    S: Stream<Item = Result<B, E>>,
    B: Buf,
    E: std::fmt::Display,
{
    futures::pin_mut!(body);
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let mut chunk = chunk.map_err(|e| BodyError::Read(e.to_string()))?;
        if (buffer.len() + chunk.remaining()) as u64 > limit {
            return Err(BodyError::TooLarge);
        }
        while chunk.has_remaining() {
            let part = chunk.chunk();
            let len = part.len();
            buffer.extend_from_slice(part);
            chunk.advance(len);
        }
    }
    Ok(buffer.freeze())
}

pub(crate) fn text_reply(
    text: &str,
    status: StatusCode,
) -> Response {
    warp::reply::with_status(text.to_string(), status).into_response()
}

fn script_reply(content: Bytes) -> Response {
    warp::reply::with_header(content.to_vec(), "Content-Type", PAC_CONTENT_TYPE).into_response()
}
