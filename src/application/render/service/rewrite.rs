use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};

use crate::application::render::{
    mermaid::DiagramTag,
    rules::{CODE_BLOCK_RULE, FENCE_RULE, Renderer},
    types::{BlockKind, FenceToken, RenderEnv, RenderOptions},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RewriteOutcome {
    pub(crate) code_blocks: u32,
    pub(crate) diagram_blocks: u32,
}

/// Replace every code block below `root` with the HTML produced by the
/// renderer's rules, in document order.
pub(crate) fn rewrite_code_blocks<'a>(
    root: &'a AstNode<'a>,
    renderer: &Renderer,
    options: &RenderOptions,
    env: &RenderEnv,
) -> RewriteOutcome {
    let mut nodes = Vec::new();
    let mut tokens = Vec::new();
    collect_code_blocks(root, &mut nodes, &mut tokens);

    let mut outcome = RewriteOutcome::default();
    for (idx, node) in nodes.into_iter().enumerate() {
        let token = &tokens[idx];
        let rule = match token.kind {
            BlockKind::Fence => FENCE_RULE,
            BlockKind::Indented => CODE_BLOCK_RULE,
        };
        if token.kind == BlockKind::Fence && DiagramTag::classify(&token.info).is_diagram() {
            outcome.diagram_blocks = outcome.diagram_blocks.saturating_add(1);
        }
        outcome.code_blocks = outcome.code_blocks.saturating_add(1);

        let html = renderer.render_token(rule, &tokens, idx, options, env);
        let mut data = node.data.borrow_mut();
        data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal: html,
        });
    }

    outcome
}

fn collect_code_blocks<'a>(
    node: &'a AstNode<'a>,
    nodes: &mut Vec<&'a AstNode<'a>>,
    tokens: &mut Vec<FenceToken>,
) {
    if let Some(token) = extract_code_block(node) {
        nodes.push(node);
        tokens.push(token);
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        collect_code_blocks(next, nodes, tokens);
        child = next.next_sibling();
    }
}

fn extract_code_block(node: &AstNode<'_>) -> Option<FenceToken> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        let token = if block.fenced {
            FenceToken::fence(block.info.clone(), block.literal.clone())
        } else {
            FenceToken::indented(block.literal.clone())
        };
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use comrak::{Arena, parse_document};

    use super::*;
    use crate::application::render::{
        mermaid::{MermaidOptions, install},
        service::config::default_options,
        types::FenceToken,
    };

    fn recording_renderer() -> Renderer {
        let mut renderer = Renderer::bare();
        renderer.rules.insert(
            FENCE_RULE,
            Arc::new(
                |tokens: &[FenceToken],
                 idx: usize,
                 _: &RenderOptions,
                 _: &RenderEnv,
                 _: &Renderer| {
                    format!(
                        "<fence idx={idx} of={} info={:?}>",
                        tokens.len(),
                        tokens[idx].info
                    )
                },
            ),
        );
        renderer
    }

    #[test]
    fn collects_blocks_in_document_order() {
        let arena = Arena::new();
        let markdown = "```a\n1\n```\n\n> ```b\n> 2\n> ```\n\n    indented\n\n```c\n3\n```\n";
        let root = parse_document(&arena, markdown, &default_options());

        let mut nodes = Vec::new();
        let mut tokens = Vec::new();
        collect_code_blocks(root, &mut nodes, &mut tokens);

        let infos: Vec<_> = tokens.iter().map(|t| t.info.as_str()).collect();
        assert_eq!(infos, vec!["a", "b", "", "c"]);
        assert_eq!(tokens[2].kind, BlockKind::Indented);
        assert_eq!(tokens[1].content, "2\n");
    }

    #[test]
    fn rules_receive_full_token_sequence() {
        let arena = Arena::new();
        let markdown = "```a\n1\n```\n\n```b\n2\n```\n";
        let root = parse_document(&arena, markdown, &default_options());

        let outcome = rewrite_code_blocks(
            root,
            &recording_renderer(),
            &RenderOptions::default(),
            &RenderEnv::default(),
        );
        assert_eq!(outcome.code_blocks, 2);
        assert_eq!(outcome.diagram_blocks, 0);

        let mut literals = Vec::new();
        let mut child = root.first_child();
        while let Some(node) = child {
            if let NodeValue::HtmlBlock(block) = &node.data.borrow().value {
                literals.push(block.literal.clone());
            }
            child = node.next_sibling();
        }
        assert_eq!(
            literals,
            vec![
                "<fence idx=0 of=2 info=\"a\">".to_string(),
                "<fence idx=1 of=2 info=\"b\">".to_string(),
            ]
        );
    }

    #[test]
    fn counts_diagram_fences() {
        let arena = Arena::new();
        let markdown = "```mermaid\nA\n```\n\n```graph LR\nA-->B\n```\n\n```rust\nfn x() {}\n```\n";
        let root = parse_document(&arena, markdown, &default_options());

        let mut renderer = recording_renderer();
        install(&mut renderer, &MermaidOptions);
        let outcome = rewrite_code_blocks(
            root,
            &renderer,
            &RenderOptions::default(),
            &RenderEnv::default(),
        );
        assert_eq!(outcome.code_blocks, 3);
        assert_eq!(outcome.diagram_blocks, 2);
    }
}
