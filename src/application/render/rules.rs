//! Rule table consulted by the renderer for every code block.
//!
//! Rules are looked up by name at render time, so plugins can replace a rule
//! after the renderer is built. A plugin that wants to keep the previous
//! behaviour captures the old [`RenderRule`] before installing its own.

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::warn;

use super::{
    highlight::{Highlighter, plain_code_block},
    types::{FenceToken, RenderEnv, RenderOptions},
};

pub const FENCE_RULE: &str = "fence";
pub const CODE_BLOCK_RULE: &str = "code_block";

/// A render function registered under a rule name.
///
/// Arguments are the full token sequence, the index of the token to render,
/// the host options, the per-document environment, and the renderer itself.
pub type RenderRule = Arc<
    dyn Fn(&[FenceToken], usize, &RenderOptions, &RenderEnv, &Renderer) -> String + Send + Sync,
>;

/// Mutable mapping from rule names to render functions.
#[derive(Clone, Default)]
pub struct RuleMap {
    rules: HashMap<String, RenderRule>,
}

impl RuleMap {
    pub fn get(&self, name: &str) -> Option<RenderRule> {
        self.rules.get(name).cloned()
    }

    /// Register `rule` under `name`, returning the rule it replaced.
    pub fn insert(&mut self, name: impl Into<String>, rule: RenderRule) -> Option<RenderRule> {
        self.rules.insert(name.into(), rule)
    }

    pub fn remove(&mut self, name: &str) -> Option<RenderRule> {
        self.rules.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

impl fmt::Debug for RuleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RuleMap").field("rules", &names).finish()
    }
}

/// Renders code-block tokens to HTML fragments through the rule table.
#[derive(Debug, Clone)]
pub struct Renderer {
    pub rules: RuleMap,
}

impl Renderer {
    /// Renderer with the host `fence` and `code_block` rules registered.
    pub fn new(highlighter: Arc<Highlighter>) -> Self {
        let mut rules = RuleMap::default();
        rules.insert(FENCE_RULE, default_fence_rule(highlighter));
        rules.insert(CODE_BLOCK_RULE, Arc::new(render_code_block));
        Self { rules }
    }

    /// Renderer without any registered rules; every token takes the fallback path.
    pub fn bare() -> Self {
        Self {
            rules: RuleMap::default(),
        }
    }

    /// Install a plugin. Plugins mutate the rule table once, before rendering starts.
    pub fn use_plugin<O, P>(&mut self, plugin: P, options: &O) -> &mut Self
    where
        P: FnOnce(&mut Renderer, &O),
    {
        plugin(self, options);
        self
    }

    /// Render `tokens[idx]` with the rule registered under `rule`, or the
    /// generic fallback when no such rule exists.
    pub fn render_token(
        &self,
        rule: &str,
        tokens: &[FenceToken],
        idx: usize,
        options: &RenderOptions,
        env: &RenderEnv,
    ) -> String {
        match self.rules.get(rule) {
            Some(render) => render(tokens, idx, options, env, self),
            None => render_fallback(tokens, idx, options, env, self),
        }
    }

    /// The host's generic fallback rendering, usable wherever a rule is missing.
    pub fn fallback_rule() -> RenderRule {
        Arc::new(render_fallback)
    }
}

fn default_fence_rule(highlighter: Arc<Highlighter>) -> RenderRule {
    Arc::new(
        move |tokens: &[FenceToken],
              idx: usize,
              options: &RenderOptions,
              env: &RenderEnv,
              _renderer: &Renderer| {
            let Some(token) = tokens.get(idx) else {
                return String::new();
            };

            let mut segments = token.info.split_whitespace();
            let language = segments.next();
            let meta = segments.collect::<Vec<_>>().join(" ");
            let meta = (!meta.is_empty()).then_some(meta.as_str());

            if !options.highlight {
                return plain_code_block(language, meta, &token.content, &options.lang_prefix);
            }

            match highlighter.highlight_code(language, meta, &token.content, &options.lang_prefix)
            {
                Ok(html) => html,
                Err(err) => {
                    warn!(
                        target = "application::render::highlight",
                        doc_id = env.doc_id(),
                        error = %err,
                        "Syntax highlighting failed; emitting plain code block"
                    );
                    plain_code_block(language, meta, &token.content, &options.lang_prefix)
                }
            }
        },
    )
}

fn render_code_block(
    tokens: &[FenceToken],
    idx: usize,
    _options: &RenderOptions,
    _env: &RenderEnv,
    _renderer: &Renderer,
) -> String {
    tokens
        .get(idx)
        .map(|token| plain_code_block(None, None, &token.content, ""))
        .unwrap_or_default()
}

fn render_fallback(
    tokens: &[FenceToken],
    idx: usize,
    options: &RenderOptions,
    _env: &RenderEnv,
    _renderer: &Renderer,
) -> String {
    let Some(token) = tokens.get(idx) else {
        return String::new();
    };
    let language = token.info.split_whitespace().next();
    plain_code_block(language, None, &token.content, &options.lang_prefix)
}
