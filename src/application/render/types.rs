use thiserror::Error;

/// Distinguishes fenced code blocks from indented ones; each kind is
/// dispatched through its own render rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Backtick or tilde fenced block, rendered through the `fence` rule.
    Fence,
    /// Indented code block, rendered through the `code_block` rule.
    Indented,
}

/// A code block lifted out of the markdown AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceToken {
    pub kind: BlockKind,
    /// Text after the opening fence marker. Empty when the fence declares nothing.
    pub info: String,
    /// Raw body between the fence markers, untrimmed.
    pub content: String,
}

impl FenceToken {
    pub fn fence(info: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Fence,
            info: info.into(),
            content: content.into(),
        }
    }

    pub fn indented(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Indented,
            info: String::new(),
            content: content.into(),
        }
    }
}

/// Host rendering toggles passed through every rule invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Run syntax highlighting in the default `fence` rule.
    pub highlight: bool,
    /// Prefix for the language class on `<code>` elements.
    pub lang_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight: true,
            lang_prefix: "language-".to_string(),
        }
    }
}

/// Per-document context, only used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderEnv {
    pub doc_id: Option<String>,
}

impl RenderEnv {
    pub fn for_doc(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: Some(doc_id.into()),
        }
    }

    pub fn doc_id(&self) -> &str {
        self.doc_id.as_deref().unwrap_or("")
    }
}

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Document identifier used for log correlation.
    pub doc_id: String,
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(doc_id: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            markdown: markdown.into(),
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub html: String,
    /// Number of code blocks (fenced and indented) found in the document.
    pub code_blocks: u32,
    /// Number of fenced blocks whose info string names a diagram.
    pub diagram_blocks: u32,
}

impl RenderOutput {
    pub fn contains_diagrams(&self) -> bool {
        self.diagram_blocks > 0
    }
}

/// Structured errors surfaced by the rendering pipeline.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("html post-processing failed: {message}")]
    PostProcess { message: String },
}
