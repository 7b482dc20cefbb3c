//! Static assets compiled into the binary.

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::application::render::SYNTAX_THEME_CSS;

/// Serve the stylesheet for highlighted code blocks.
pub async fn serve_syntax_css() -> Response {
    build_response(
        Bytes::from_static(SYNTAX_THEME_CSS.as_bytes()),
        "text/css; charset=utf-8",
    )
}

fn build_response(bytes: Bytes, content_type: &'static str) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    match HeaderValue::from_str(&len.to_string()) {
        Ok(value) => {
            headers.insert(header::CONTENT_LENGTH, value);
        }
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn syntax_css_is_served_as_stylesheet() {
        let response = serve_syntax_css().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
        assert!(SYNTAX_THEME_CSS.contains(".syntax-"));
    }
}
