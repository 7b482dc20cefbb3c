use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use crate::{
    application::{
        docs::{Attachment, DocsService},
        error::HttpError,
    },
    infra::assets::serve_syntax_css,
    presentation::views::{
        DocumentTemplate, DocumentView, StartPageTemplate, StartPageView,
        render_not_found_response, render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub docs: Arc<DocsService>,
    pub page: PageSettings,
}

/// Settings that only affect the HTML wrapped around rendered documents.
#[derive(Clone, Debug)]
pub struct PageSettings {
    pub mermaid_script_url: String,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/docs", get(start_page))
        .route("/docs/", get(start_page))
        .route("/docs/navigation.json", get(navigation))
        .route("/docs/{first}", get(redirect_to_document))
        .route("/docs/{first}/", get(root_document))
        .route("/docs/{first}/{second}", get(document_or_attachment))
        .route("/docs/{first}/{second}/", get(folder_document))
        .route("/docs/{first}/{second}/{file_name}", get(folder_attachment))
        .route("/static/syntax.css", get(serve_syntax_css))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn start_page(State(state): State<HttpState>) -> Response {
    let view = StartPageView::new(state.docs.start_page());
    render_template_response(StartPageTemplate { view }, StatusCode::OK)
}

async fn navigation(State(state): State<HttpState>) -> Response {
    Json(state.docs.navigation()).into_response()
}

async fn redirect_to_document(Path(first): Path<String>) -> Response {
    Redirect::permanent(&format!("/docs/{first}/")).into_response()
}

async fn root_document(State(state): State<HttpState>, Path(first): Path<String>) -> Response {
    render_document(&state, None, &first).await
}

async fn folder_document(
    State(state): State<HttpState>,
    Path((first, second)): Path<(String, String)>,
) -> Response {
    render_document(&state, Some(&first), &second).await
}

/// `/docs/{a}/{b}` is either a folder document missing its trailing slash or
/// a file next to the root document `a`. Catalog ids take precedence.
async fn document_or_attachment(
    State(state): State<HttpState>,
    Path((first, second)): Path<(String, String)>,
) -> Response {
    let is_folder_doc = state
        .docs
        .catalog()
        .get(&format!("{first}/{second}"))
        .is_some();

    if is_folder_doc {
        return Redirect::permanent(&format!("/docs/{first}/{second}/")).into_response();
    }

    serve_attachment(&state, None, &first, &second).await
}

async fn folder_attachment(
    State(state): State<HttpState>,
    Path((first, second, file_name)): Path<(String, String, String)>,
) -> Response {
    serve_attachment(&state, Some(&first), &second, &file_name).await
}

async fn fallback() -> Response {
    render_not_found_response()
}

async fn render_document(state: &HttpState, folder_id: Option<&str>, doc_id: &str) -> Response {
    match state.docs.document(folder_id, doc_id).await {
        Ok(doc) => {
            let view = DocumentView::new(doc, &state.page.mermaid_script_url);
            let mut response = render_template_response(DocumentTemplate { view }, StatusCode::OK);
            set_no_store(&mut response);
            response
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn serve_attachment(
    state: &HttpState,
    folder_id: Option<&str>,
    doc_id: &str,
    file_name: &str,
) -> Response {
    match state.docs.attachment(folder_id, doc_id, file_name).await {
        Ok(attachment) => build_attachment_response(attachment),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn build_attachment_response(attachment: Attachment) -> Response {
    let Attachment { bytes, mime } = attachment;
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    response
}

fn set_no_store(response: &mut Response) {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
}
