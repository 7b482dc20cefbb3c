use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Instant};

use bytes::Bytes;
use mime_guess::Mime;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::render::{DocRenderService, RenderError, RenderRequest},
    domain::{
        docs::{Doc, DocCatalog},
        navigation::{NavigationEntry, documentation_navigation},
    },
};

/// Attachment extensions served when settings do not override them.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = [".txt", ".png", ".gif", ".jpg", ".jpeg"];

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("documentation `{doc_id}` is not known")]
    UnknownDocument { doc_id: String },
    #[error("documentation `{doc_id}` is not found ({path})")]
    MissingDocument { doc_id: String, path: PathBuf },
    #[error("filetype of `{doc_id}` / `{file_name}` is not allowed")]
    DisallowedFileType { doc_id: String, file_name: String },
    #[error("file `{doc_id}` / `{file_name}` is not found")]
    MissingFile { doc_id: String, file_name: String },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Link on the documentation start page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLink {
    pub title: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDoc {
    pub title: String,
    pub html: String,
    pub has_diagrams: bool,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub bytes: Bytes,
    pub mime: Mime,
}

/// Serves configured markdown documents and the files next to them.
pub struct DocsService {
    catalog: Arc<DocCatalog>,
    renderer: Arc<DocRenderService>,
    allowed_extensions: Vec<String>,
}

impl DocsService {
    pub fn new(
        catalog: Arc<DocCatalog>,
        renderer: Arc<DocRenderService>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            catalog,
            renderer,
            allowed_extensions,
        }
    }

    pub fn catalog(&self) -> &DocCatalog {
        &self.catalog
    }

    pub fn navigation(&self) -> NavigationEntry {
        documentation_navigation(&self.catalog)
    }

    pub fn start_page(&self) -> Vec<DocLink> {
        self.catalog
            .iter()
            .map(|doc| DocLink {
                title: doc.full_name.clone(),
                href: doc.href(),
            })
            .collect()
    }

    /// Read and render a document.
    pub async fn document(
        &self,
        folder_id: Option<&str>,
        doc_id: &str,
    ) -> Result<RenderedDoc, DocsError> {
        let started_at = Instant::now();
        let doc = self.existing_doc(folder_id, doc_id).await?;

        let markdown = tokio::fs::read_to_string(&doc.path)
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => DocsError::MissingDocument {
                    doc_id: doc_id.to_string(),
                    path: doc.path.clone(),
                },
                _ => DocsError::Io {
                    path: doc.path.clone(),
                    source,
                },
            })?;

        let output = self
            .renderer
            .render(&RenderRequest::new(doc.full_doc_id.as_str(), markdown))?;

        info!(
            target = "application::docs",
            op = "docs::document",
            doc_id = doc.full_doc_id.as_str(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            diagram_blocks = output.diagram_blocks,
            "Documentation page rendered"
        );

        Ok(RenderedDoc {
            title: doc.full_name.clone(),
            has_diagrams: output.contains_diagrams(),
            html: output.html,
        })
    }

    /// Read a file that sits next to a document. Only plain file names with an
    /// allowed extension are served.
    pub async fn attachment(
        &self,
        folder_id: Option<&str>,
        doc_id: &str,
        file_name: &str,
    ) -> Result<Attachment, DocsError> {
        let doc = self.existing_doc(folder_id, doc_id).await?;

        let missing = || DocsError::MissingFile {
            doc_id: doc_id.to_string(),
            file_name: file_name.to_string(),
        };

        if !is_plain_file_name(file_name) {
            return Err(missing());
        }

        if !self.is_allowed(file_name) {
            warn!(
                target = "application::docs",
                op = "docs::attachment",
                doc_id = doc.full_doc_id.as_str(),
                file_name,
                "Rejected attachment with disallowed file type"
            );
            return Err(DocsError::DisallowedFileType {
                doc_id: doc_id.to_string(),
                file_name: file_name.to_string(),
            });
        }

        let path = doc.directory().join(file_name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(missing()),
            Err(source) => return Err(DocsError::Io { path, source }),
        };

        Ok(Attachment {
            bytes: Bytes::from(bytes),
            mime: mime_guess::from_path(&path).first_or_octet_stream(),
        })
    }

    async fn existing_doc(
        &self,
        folder_id: Option<&str>,
        doc_id: &str,
    ) -> Result<&Doc, DocsError> {
        let doc =
            self.catalog
                .resolve(folder_id, doc_id)
                .ok_or_else(|| DocsError::UnknownDocument {
                    doc_id: doc_id.to_string(),
                })?;

        let exists = tokio::fs::try_exists(&doc.path)
            .await
            .map_err(|source| DocsError::Io {
                path: doc.path.clone(),
                source,
            })?;
        if !exists {
            return Err(DocsError::MissingDocument {
                doc_id: doc_id.to_string(),
                path: doc.path.clone(),
            });
        }

        Ok(doc)
    }

    /// A leading dot marks a hidden file, not an extension.
    fn is_allowed(&self, file_name: &str) -> bool {
        let Some(dot) = file_name.rfind('.').filter(|dot| *dot > 0) else {
            return false;
        };
        let suffix = &file_name[dot..];
        self.allowed_extensions.iter().any(|ext| ext == suffix)
    }
}

fn is_plain_file_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{application::render::RenderPipelineConfig, domain::docs::DocEntry};

    fn service(dir: &TempDir) -> DocsService {
        let docs_dir = dir.path().join("docs");
        fs::create_dir_all(&docs_dir).expect("create docs dir");
        fs::write(
            docs_dir.join("guide.md"),
            "# Guide\n\n```mermaid\ngraph LR\n  A --> B\n```\n",
        )
        .expect("write guide");
        fs::write(docs_dir.join("notes.txt"), "$Test doc$").expect("write notes");
        fs::write(docs_dir.join("secrets.conf"), "$secrets$").expect("write secrets");

        let catalog = DocCatalog::from_entries([
            DocEntry::new("Guide", docs_dir.join("guide.md")),
            DocEntry::new("Team/Missing", dir.path().join("missing.md")),
        ])
        .expect("valid catalog");

        DocsService::new(
            Arc::new(catalog),
            Arc::new(DocRenderService::new(RenderPipelineConfig::default())),
            DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        )
    }

    #[tokio::test]
    async fn renders_known_document() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let doc = service.document(None, "guide").await.expect("rendered");
        assert_eq!(doc.title, "Guide");
        assert!(doc.has_diagrams);
        assert!(
            doc.html
                .contains("<div class=\"mermaid\">graph LR\n  A --> B</div>"),
            "unexpected html: {}",
            doc.html
        );
    }

    #[tokio::test]
    async fn unknown_and_missing_documents_are_distinguished() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let err = service.document(None, "nope").await.expect_err("unknown");
        assert!(matches!(err, DocsError::UnknownDocument { .. }));

        let err = service
            .document(Some("team"), "missing")
            .await
            .expect_err("missing file");
        assert!(matches!(err, DocsError::MissingDocument { .. }));
    }

    #[tokio::test]
    async fn serves_allowed_attachments() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let attachment = service
            .attachment(None, "guide", "notes.txt")
            .await
            .expect("attachment served");
        assert_eq!(attachment.bytes.as_ref(), b"$Test doc$");
        assert_eq!(attachment.mime.type_(), mime_guess::mime::TEXT);
    }

    #[tokio::test]
    async fn rejects_disallowed_and_missing_attachments() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let err = service
            .attachment(None, "guide", "secrets.conf")
            .await
            .expect_err("disallowed");
        assert!(matches!(err, DocsError::DisallowedFileType { .. }));

        let err = service
            .attachment(None, "guide", "other.txt")
            .await
            .expect_err("missing");
        assert!(matches!(err, DocsError::MissingFile { .. }));

        let err = service
            .attachment(None, "guide", "..")
            .await
            .expect_err("traversal");
        assert!(matches!(err, DocsError::MissingFile { .. }));
    }

    #[tokio::test]
    async fn hidden_file_without_extension_is_disallowed() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);
        fs::write(dir.path().join("docs").join(".txt"), "hidden").expect("write dotfile");

        let err = service
            .attachment(None, "guide", ".txt")
            .await
            .expect_err("dotfile");
        assert!(matches!(err, DocsError::DisallowedFileType { .. }));
    }

    #[tokio::test]
    async fn attachments_of_missing_documents_are_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let err = service
            .attachment(Some("team"), "missing", "notes.txt")
            .await
            .expect_err("missing document");
        assert!(matches!(err, DocsError::MissingDocument { .. }));
    }

    #[test]
    fn start_page_lists_docs_in_order() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let links = service.start_page();
        assert_eq!(
            links,
            vec![
                DocLink {
                    title: "Guide".to_string(),
                    href: "/docs/guide/".to_string(),
                },
                DocLink {
                    title: "Team/Missing".to_string(),
                    href: "/docs/team/missing/".to_string(),
                },
            ]
        );
    }
}
