use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const RESPONSE_TARGET: &str = "diagram_docs::http::response";

/// Per-request identifier shared by the request and response extensions.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Log every response; failures carry the [`ErrorReport`] the handler attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis() as u64;

    if !(status.is_client_error() || status.is_server_error()) {
        debug!(
            target = RESPONSE_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            request_id = request_id.as_str(),
            "request served",
        );
        return response;
    }

    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = RESPONSE_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail,
            chain = ?messages,
            request_id = request_id.as_str(),
            "request failed",
        );
    } else {
        warn!(
            target = RESPONSE_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail,
            chain = ?messages,
            request_id = request_id.as_str(),
            "client request error",
        );
    }

    response
}
