use crate::message_handler::MessageHandler;
use hyper::body::HttpBody;
use hyper::{Body, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
pub mod dto;

pub type SharedStore = Arc<MessageHandler>;

pub const SEND_CONFIRMATION: &str = "Message enqueued and saved successfully.";

fn with_status(status: StatusCode, body: Body) -> Response<Body> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp
}

fn bad_request(m: &str) -> Response<Body> {
    with_status(StatusCode::BAD_REQUEST, Body::from(m.to_string()))
}

fn internal_server_error(m: &str) -> Response<Body> {
    with_status(StatusCode::INTERNAL_SERVER_ERROR, Body::from(m.to_string()))
}

fn no_content() -> Response<Body> {
    with_status(StatusCode::NO_CONTENT, Body::empty())
}

fn ok(m: String) -> Response<Body> {
    let mut resp = with_status(StatusCode::OK, Body::from(m));
    resp.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

fn json_ok(message: String) -> Response<Body> {
    match serde_json::to_string(&dto::MessageResponse { message }) {
        Ok(v) => ok(v),
        Err(e) => {
            log::error!("Error encoding response as json: {e}");
            internal_server_error("Error encoding response as json")
        }
    }
}

fn exceeds_limit(len: u64, max_body_bytes: usize) -> bool {
    len > max_body_bytes as u64
}

fn declared_len(req: &Request<Body>) -> u64 {
    let content_length = req
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    content_length.max(req.body().size_hint().lower())
}

pub async fn send_handler(
    req: Request<Body>,
    store: SharedStore,
    max_body_bytes: usize,
) -> Result<Response<Body>, Infallible> {
    if exceeds_limit(declared_len(&req), max_body_bytes) {
        log::error!("[SendMessage] Body exceeds {max_body_bytes} byte limit");
        return Ok(bad_request("Message exceeds size limit."));
    }

    let full_body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(b) => b,
        Err(e) => {
            log::error!("[SendMessage] Error reading request body: {e}");
            return Ok(bad_request("error reading request body"));
        }
    };

    // chunked bodies carry no length up front
    if exceeds_limit(full_body.len() as u64, max_body_bytes) {
        log::error!("[SendMessage] Body exceeds {max_body_bytes} byte limit");
        return Ok(bad_request("Message exceeds size limit."));
    }

    let req_body: dto::SendRequest = match serde_json::from_slice(&full_body) {
        Ok(v) => v,
        Err(e) => {
            log::error!("[SendMessage] Error destructuring request body: {e}");
            return Ok(bad_request("error reading request body"));
        }
    };

    let message = match req_body {
        Some(m) if !m.is_empty() => m,
        _ => {
            log::error!("[SendMessage] Message cannot be empty.");
            return Ok(bad_request("Message cannot be empty."));
        }
    };

    if let Err(e) = store.push_message(&message).await {
        log::error!("[SendMessage] An error occurred: {e}");
        return Ok(internal_server_error(
            "An error occurred while processing the message.",
        ));
    }

    log::info!("[SendMessage] Message enqueued and saved: {message}");

    Ok(json_ok(SEND_CONFIRMATION.to_string()))
}

pub async fn receive_handler(store: SharedStore) -> Result<Response<Body>, Infallible> {
    let message = match store.pull_message().await {
        Ok(Some(m)) => m,
        Ok(None) => {
            log::info!("[ReceiveMessage] No messages available.");
            return Ok(no_content());
        }
        Err(e) => {
            log::error!("[ReceiveMessage] An error occurred: {e}");
            return Ok(internal_server_error(
                "An error occurred while retrieving the message.",
            ));
        }
    };

    log::info!("[ReceiveMessage] Message received: {message}");

    Ok(json_ok(message))
}
