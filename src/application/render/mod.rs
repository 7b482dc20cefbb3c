//! Markdown rendering.
//!
//! The pipeline is pure: it accepts markdown, produces deterministic HTML and
//! surfaces structured errors. Code blocks are rendered through a rule table
//! ([`Renderer`]) so plugins such as the mermaid fence rule can replace the
//! default code rendering.

mod highlight;
pub mod mermaid;
mod rules;
mod service;
mod types;

pub use highlight::Highlighter;
pub use mermaid::{DIAGRAM_CLASS, DIAGRAM_TAGS, DiagramTag, MermaidOptions};
pub use rules::{CODE_BLOCK_RULE, FENCE_RULE, RenderRule, Renderer, RuleMap};
pub use service::{
    DocRenderService, RenderConfigError, RenderPipelineConfig, configure_render_service,
    render_service,
};
pub use types::{
    BlockKind, FenceToken, RenderEnv, RenderError, RenderOptions, RenderOutput, RenderRequest,
};

/// Stylesheet for the `syntax-` classes emitted by the highlighter.
pub const SYNTAX_THEME_CSS: &str = include_str!(env!("SYNTAX_THEME_CSS_FILE"));
