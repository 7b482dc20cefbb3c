mod config;
mod rewrite;
mod tables;

use std::sync::Arc;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use metrics::counter;
use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::debug;

use crate::application::render::{
    highlight::Highlighter,
    mermaid::{self, MermaidOptions},
    rules::Renderer,
    types::{RenderEnv, RenderError, RenderOptions, RenderOutput, RenderRequest},
};

use config::default_options;
use rewrite::rewrite_code_blocks;
use tables::apply_table_class;

pub(crate) const DEFAULT_TABLE_CLASS: &str = "table";

/// Comrak-based markdown pipeline whose code blocks go through a [`Renderer`].
pub struct DocRenderService {
    options: comrak::Options<'static>,
    renderer: Renderer,
    render_options: RenderOptions,
    table_class: Option<String>,
}

impl DocRenderService {
    pub fn new(config: RenderPipelineConfig) -> Self {
        Self::with_highlighter(config, Arc::new(Highlighter::load()))
    }

    pub fn with_highlighter(config: RenderPipelineConfig, highlighter: Arc<Highlighter>) -> Self {
        let mut renderer = Renderer::new(highlighter);
        if config.diagrams {
            renderer.use_plugin(mermaid::install, &MermaidOptions);
        }

        let render_options = RenderOptions {
            highlight: config.highlight,
            ..RenderOptions::default()
        };

        Self {
            options: default_options(),
            renderer,
            render_options,
            table_class: config.table_class,
        }
    }

    pub fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let env = RenderEnv::for_doc(request.doc_id.as_str());
        let outcome = rewrite_code_blocks(root, &self.renderer, &self.render_options, &env);

        let html = render_html_stage(root, &self.options)?;
        let html = match self.table_class.as_deref() {
            Some(class) => apply_table_class(&html, class)?,
            None => html,
        };

        counter!("diagram_docs_render_total").increment(1);
        counter!("diagram_docs_diagram_blocks_total").increment(u64::from(outcome.diagram_blocks));

        debug!(
            target = "application::render",
            doc_id = request.doc_id.as_str(),
            code_blocks = outcome.code_blocks,
            diagram_blocks = outcome.diagram_blocks,
            html_bytes = html.len(),
            "Rendered markdown document"
        );

        Ok(RenderOutput {
            html,
            code_blocks: outcome.code_blocks,
            diagram_blocks: outcome.diagram_blocks,
        })
    }
}

impl Default for DocRenderService {
    fn default() -> Self {
        Self::new(RenderPipelineConfig::default())
    }
}

static RENDER_SERVICE: Lazy<Arc<DocRenderService>> =
    Lazy::new(|| Arc::new(DocRenderService::new(active_render_config())));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<DocRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPipelineConfig {
    /// Syntax-highlight non-diagram fences.
    pub highlight: bool,
    /// Install the mermaid fence rule.
    pub diagrams: bool,
    /// Class added to every rendered table; `None` leaves tables untouched.
    pub table_class: Option<String>,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            diagrams: true,
            table_class: Some(DEFAULT_TABLE_CLASS.to_string()),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            highlight: settings.highlight,
            diagrams: settings.diagrams,
            table_class: settings.table_class.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(service: &DocRenderService, markdown: &str) -> RenderOutput {
        service
            .render(&RenderRequest::new("test", markdown))
            .expect("render succeeds")
    }

    #[test]
    fn mermaid_fence_becomes_container() {
        let service = DocRenderService::default();
        let output = render(&service, "# Title\n\n```mermaid\ngraph LR\n  A --- B\n```\n");

        assert!(output.html.contains("<h1>Title</h1>"));
        assert!(
            output
                .html
                .contains("<div class=\"mermaid\">graph LR\n  A --- B</div>"),
            "unexpected html: {}",
            output.html
        );
        assert_eq!(output.diagram_blocks, 1);
        assert_eq!(output.code_blocks, 1);
        assert!(output.contains_diagrams());
    }

    #[test]
    fn diagrams_disabled_highlights_mermaid_as_code() {
        let service = DocRenderService::new(RenderPipelineConfig {
            diagrams: false,
            highlight: false,
            table_class: None,
        });
        let output = render(&service, "```mermaid\nA-->B\n```\n");

        assert!(!output.html.contains("<div class=\"mermaid\">"));
        assert!(
            output
                .html
                .contains("<pre><code class=\"language-mermaid\">A--&gt;B\n</code></pre>")
        );
    }

    #[test]
    fn tables_receive_configured_class() {
        let service = DocRenderService::default();
        let output = render(&service, "| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(output.html.contains("<table class=\"table\">"));
    }

    #[test]
    fn non_diagram_fence_is_highlighted() {
        let service = DocRenderService::default();
        let output = render(&service, "```python\nprint(1)\n```\n");

        assert!(output.html.contains("syntax-lang-python"));
        assert_eq!(output.diagram_blocks, 0);
        assert!(!output.contains_diagrams());
    }
}
