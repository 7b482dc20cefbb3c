use crate::application::{
    docs::{DocLink, RenderedDoc},
    error::{ErrorReport, HttpError},
};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let view = ErrorPageView::not_found();
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct DocLinkView {
    pub title: String,
    pub href: String,
}

impl From<DocLink> for DocLinkView {
    fn from(link: DocLink) -> Self {
        Self {
            title: link.title,
            href: link.href,
        }
    }
}

pub struct StartPageView {
    pub links: Vec<DocLinkView>,
}

impl StartPageView {
    pub fn new(links: Vec<DocLink>) -> Self {
        Self {
            links: links.into_iter().map(DocLinkView::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "docs/start.html")]
pub struct StartPageTemplate {
    pub view: StartPageView,
}

/// Browser-side mermaid bootstrap, present only on pages with diagrams.
pub struct MermaidScriptView {
    pub script_url: String,
}

pub struct DocumentView {
    pub title: String,
    pub content_html: String,
    pub mermaid: Option<MermaidScriptView>,
}

impl DocumentView {
    pub fn new(doc: RenderedDoc, mermaid_script_url: &str) -> Self {
        let mermaid = doc.has_diagrams.then(|| MermaidScriptView {
            script_url: mermaid_script_url.to_string(),
        });
        Self {
            title: doc.title,
            content_html: doc.html,
            mermaid,
        }
    }
}

#[derive(Template)]
#[template(path = "docs/document.html")]
pub struct DocumentTemplate {
    pub view: DocumentView,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: ErrorPageView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(has_diagrams: bool) -> RenderedDoc {
        RenderedDoc {
            title: "Test <Doc>".to_string(),
            html: "<div class=\"mermaid\">graph TD\nA-->B</div>".to_string(),
            has_diagrams,
        }
    }

    #[test]
    fn document_page_includes_mermaid_bootstrap_only_with_diagrams() {
        let view = DocumentView::new(rendered(true), "/js/mermaid.min.js");
        let html = DocumentTemplate { view }.render().expect("renders");

        assert!(html.contains("<script src=\"/js/mermaid.min.js\"></script>"));
        assert!(html.contains("securityLevel: 'loose'"));
        assert!(html.contains("<div class=\"mermaid\">graph TD\nA-->B</div>"));
        assert!(html.contains("Test &#60;Doc&#62;") || html.contains("Test &lt;Doc&gt;"));

        let view = DocumentView::new(rendered(false), "/js/mermaid.min.js");
        let html = DocumentTemplate { view }.render().expect("renders");
        assert!(!html.contains("mermaid.min.js"));
    }

    #[test]
    fn start_page_lists_links() {
        let view = StartPageView::new(vec![DocLink {
            title: "Developer/Setup".to_string(),
            href: "/docs/developer/setup/".to_string(),
        }]);
        let html = StartPageTemplate { view }.render().expect("renders");

        assert!(html.contains("href=\"/docs/developer/setup/\""));
        assert!(html.contains("Developer/Setup"));
    }
}
