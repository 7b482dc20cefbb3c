use syntect::{
    dumps::from_uncompressed_data,
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Class-based syntect highlighter backed by the syntax pack built in `build.rs`.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl Highlighter {
    pub fn load() -> Self {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        let syntax_set: SyntaxSet =
            from_uncompressed_data(syntax_bytes).expect("syntax pack must be valid");
        Self {
            syntax_set,
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        }
    }

    pub(crate) fn highlight_code(
        &self,
        language: Option<&str>,
        meta: Option<&str>,
        code: &str,
        lang_prefix: &str,
    ) -> Result<String, RenderError> {
        let lang_token = language.unwrap_or("text");
        let syntax = self
            .find_syntax(lang_token)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut code_with_newline = code.to_string();
        if !code_with_newline.ends_with('\n') {
            code_with_newline.push('\n');
        }

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            self.class_style,
        );

        for line in LinesWithEndings::from(code_with_newline.as_str()) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|err| RenderError::Highlighting {
                    language: lang_token.to_string(),
                    message: err.to_string(),
                })?;
        }

        let highlighted = generator.finalize();
        let lowercase = lang_token.to_ascii_lowercase();
        let pre_class = format!("syntax-highlight syntax-lang-{lowercase}");
        let code_class = format!("{lang_prefix}{lowercase} syntax-code");

        Ok(format!(
            "<pre class=\"{pre_class}\"{}><code class=\"{code_class}\"{}>{highlighted}</code></pre>",
            language_attr(lang_token),
            meta_attr(meta),
        ))
    }

    fn find_syntax(&self, token: &str) -> Option<&SyntaxReference> {
        let lowercase = token.to_ascii_lowercase();
        self.syntax_set
            .find_syntax_by_token(&lowercase)
            .or_else(|| self.syntax_set.find_syntax_by_name(&lowercase))
            .or_else(|| self.syntax_set.find_syntax_by_extension(&lowercase))
    }
}

/// Plain `<pre><code>` block with escaped content, used when highlighting is
/// disabled or fails.
pub(crate) fn plain_code_block(
    language: Option<&str>,
    meta: Option<&str>,
    code: &str,
    lang_prefix: &str,
) -> String {
    let class_attr = language
        .filter(|lang| !lang.is_empty())
        .map(|lang| {
            format!(
                " class=\"{}\"",
                html_escape::encode_double_quoted_attribute(&format!("{lang_prefix}{lang}"))
            )
        })
        .unwrap_or_default();

    format!(
        "<pre><code{class_attr}{}>{}</code></pre>\n",
        meta_attr(meta),
        html_escape::encode_text(code)
    )
}

fn language_attr(lang_token: &str) -> String {
    format!(
        " data-language=\"{}\"",
        html_escape::encode_double_quoted_attribute(lang_token)
    )
}

fn meta_attr(meta: Option<&str>) -> String {
    meta.filter(|m| !m.is_empty())
        .map(|m| format!(" data-meta=\"{}\"", ammonia::clean_text(m)))
        .unwrap_or_default()
}
