//! Fence rule that hands diagram blocks to the browser-side mermaid renderer.
//!
//! Blocks whose info string names a diagram are wrapped in
//! `<div class="mermaid">…</div>`; mermaid picks those containers up after the
//! page loads. Everything else goes to whichever `fence` rule was registered
//! before [`install`] ran.
//!
//! Diagram text is emitted without HTML escaping, so the markdown source must
//! be trusted.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    rules::{FENCE_RULE, RenderRule, Renderer},
    types::{FenceToken, RenderEnv, RenderOptions},
};

/// Class mermaid scans for when it initialises.
pub const DIAGRAM_CLASS: &str = "mermaid";

/// Info strings that name a diagram on their own. Matched case-sensitively.
pub const DIAGRAM_TAGS: [&str; 5] = [
    "mermaid",
    "gantt",
    "sequenceDiagram",
    "classDiagram",
    "gitGraph",
];

const LINE_BREAK: &str = "<br/>";

static GRAPH_DIRECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^graph (?:TB|BT|RL|LR|TD);?$").expect("valid graph pattern"));

/// How a fence info string is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramTag {
    /// One of [`DIAGRAM_TAGS`]; the tag itself is dropped from the diagram text.
    Known,
    /// A `graph XX` header; it stays at the top of the diagram text.
    GraphDirection,
    Other,
}

impl DiagramTag {
    pub fn classify(info: &str) -> Self {
        if DIAGRAM_TAGS.contains(&info) {
            DiagramTag::Known
        } else if GRAPH_DIRECTION.is_match(info) {
            DiagramTag::GraphDirection
        } else {
            DiagramTag::Other
        }
    }

    pub fn is_diagram(self) -> bool {
        !matches!(self, DiagramTag::Other)
    }
}

/// Options for [`install`]. Nothing is configurable yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidOptions;

/// Replace the `fence` rule of `renderer` with the diagram-aware rule.
///
/// The previous `fence` rule, or the generic fallback when none is
/// registered, is kept for non-diagram blocks.
pub fn install(renderer: &mut Renderer, _options: &MermaidOptions) {
    let default_fence = renderer
        .rules
        .get(FENCE_RULE)
        .unwrap_or_else(Renderer::fallback_rule);
    renderer
        .rules
        .insert(FENCE_RULE, mermaid_fence_rule(default_fence));
}

fn mermaid_fence_rule(default_fence: RenderRule) -> RenderRule {
    Arc::new(
        move |tokens: &[FenceToken],
              idx: usize,
              options: &RenderOptions,
              env: &RenderEnv,
              renderer: &Renderer| {
            match tokens.get(idx) {
                Some(token) => match render_diagram(token) {
                    Some(html) => html,
                    None => default_fence(tokens, idx, options, env, renderer),
                },
                None => default_fence(tokens, idx, options, env, renderer),
            }
        },
    )
}

/// Container markup for `token`, or `None` when the block is not a diagram.
pub fn render_diagram(token: &FenceToken) -> Option<String> {
    let tag = DiagramTag::classify(&token.info);
    if !tag.is_diagram() {
        return None;
    }

    let body = token.content.trim();
    let code = match tag {
        DiagramTag::Known => body.to_string(),
        _ => format!("{}\n{body}", token.info),
    };
    let code = code.replace("\\n", LINE_BREAK);

    Some(format!("<div class=\"{DIAGRAM_CLASS}\">{code}</div>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_rule() -> RenderRule {
        Arc::new(
            |tokens: &[FenceToken], idx: usize, _: &RenderOptions, _: &RenderEnv, _: &Renderer| {
                format!("<default:{}>", tokens[idx].info)
            },
        )
    }

    fn render(renderer: &Renderer, token: FenceToken) -> String {
        renderer.render_token(
            FENCE_RULE,
            &[token],
            0,
            &RenderOptions::default(),
            &RenderEnv::default(),
        )
    }

    fn installed() -> Renderer {
        let mut renderer = Renderer::bare();
        renderer.rules.insert(FENCE_RULE, marker_rule());
        renderer.use_plugin(install, &MermaidOptions);
        renderer
    }

    #[test]
    fn classifies_known_tags() {
        for tag in DIAGRAM_TAGS {
            assert_eq!(DiagramTag::classify(tag), DiagramTag::Known, "{tag}");
        }
    }

    #[test]
    fn known_tags_are_case_sensitive() {
        assert_eq!(DiagramTag::classify("Mermaid"), DiagramTag::Other);
        assert_eq!(DiagramTag::classify("sequencediagram"), DiagramTag::Other);
        assert_eq!(DiagramTag::classify("mermaid "), DiagramTag::Other);
    }

    #[test]
    fn classifies_graph_directions() {
        for direction in ["TB", "BT", "RL", "LR", "TD"] {
            assert_eq!(
                DiagramTag::classify(&format!("graph {direction}")),
                DiagramTag::GraphDirection
            );
            assert_eq!(
                DiagramTag::classify(&format!("graph {direction};")),
                DiagramTag::GraphDirection
            );
        }
    }

    #[test]
    fn graph_pattern_matches_whole_string() {
        for info in [
            "graph",
            "graph ",
            "graph XY",
            "graph TD;;",
            "graph  TD",
            "graph TD extra",
            "xgraph TD",
            "graph td",
        ] {
            assert_eq!(DiagramTag::classify(info), DiagramTag::Other, "{info:?}");
        }
    }

    #[test]
    fn empty_tag_is_other() {
        assert_eq!(DiagramTag::classify(""), DiagramTag::Other);
        assert!(!DiagramTag::Other.is_diagram());
    }

    #[test]
    fn known_tag_wraps_trimmed_content_without_tag() {
        let html = render(&installed(), FenceToken::fence("mermaid", "  graph LR; A-->B  "));
        assert_eq!(html, "<div class=\"mermaid\">graph LR; A-->B</div>");
    }

    #[test]
    fn graph_direction_keeps_header_line() {
        let html = render(&installed(), FenceToken::fence("graph TD", "A-->B\n"));
        assert_eq!(html, "<div class=\"mermaid\">graph TD\nA-->B</div>");
    }

    #[test]
    fn escaped_newlines_become_line_breaks() {
        let html = render(
            &installed(),
            FenceToken::fence("sequenceDiagram", "Alice->>Bob: Hi\\nBob->>Alice: Hey"),
        );
        assert_eq!(
            html,
            "<div class=\"mermaid\">Alice->>Bob: Hi<br/>Bob->>Alice: Hey</div>"
        );
    }

    #[test]
    fn real_newlines_are_untouched() {
        let html = render(
            &installed(),
            FenceToken::fence("gantt", "title A\nsection B\n"),
        );
        assert_eq!(html, "<div class=\"mermaid\">title A\nsection B</div>");
    }

    #[test]
    fn diagram_text_is_not_escaped() {
        let html = render(&installed(), FenceToken::fence("classDiagram", "A <|-- B & C"));
        assert_eq!(html, "<div class=\"mermaid\">A <|-- B & C</div>");
    }

    #[test]
    fn other_tags_pass_through_to_previous_rule() {
        let renderer = installed();
        assert_eq!(
            render(&renderer, FenceToken::fence("python", "print(1)")),
            "<default:python>"
        );
        assert_eq!(render(&renderer, FenceToken::fence("", "x")), "<default:>");
    }

    #[test]
    fn passthrough_matches_previous_rule_byte_for_byte() {
        let before = {
            let mut renderer = Renderer::bare();
            renderer.rules.insert(FENCE_RULE, marker_rule());
            render(&renderer, FenceToken::fence("rust", "fn main() {}"))
        };
        let after = render(&installed(), FenceToken::fence("rust", "fn main() {}"));
        assert_eq!(before, after);
    }

    #[test]
    fn missing_previous_rule_uses_generic_fallback() {
        let mut renderer = Renderer::bare();
        install(&mut renderer, &MermaidOptions);

        let html = render(&renderer, FenceToken::fence("python", "print(1)"));
        assert_eq!(
            html,
            "<pre><code class=\"language-python\">print(1)</code></pre>\n"
        );
    }

    #[test]
    fn repeated_rendering_is_stable() {
        let renderer = installed();
        let token = FenceToken::fence("gitGraph", "commit\\ncommit");
        let first = render(&renderer, token.clone());
        let second = render(&renderer, token);
        assert_eq!(first, second);
    }

    #[test]
    fn render_diagram_reports_non_diagrams() {
        assert!(render_diagram(&FenceToken::fence("python", "x")).is_none());
        assert!(render_diagram(&FenceToken::fence("graph LR;", "A-->B")).is_some());
    }
}
