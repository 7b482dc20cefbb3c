use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::application::render::types::RenderError;

/// Add `class` to every `<table>` element, keeping classes already present.
pub(crate) fn apply_table_class(html: &str, class: &str) -> Result<String, RenderError> {
    let class = class.trim().to_string();
    if class.is_empty() {
        return Ok(html.to_string());
    }

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("table", move |el| {
                let merged = match el.get_attribute("class") {
                    Some(existing) if existing.split_whitespace().any(|c| c == class) => existing,
                    Some(existing) if !existing.trim().is_empty() => {
                        format!("{} {class}", existing.trim())
                    }
                    _ => class.clone(),
                };
                el.set_attribute("class", &merged)?;
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::PostProcess {
        message: err.to_string(),
    })
}
