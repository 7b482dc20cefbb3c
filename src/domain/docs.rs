//! Configured documentation entries.
//!
//! A document is registered under a display name such as `Developer/Setup`.
//! A single `/` puts the document in a folder; deeper nesting is rejected.
//! Identifiers are the lowercased name with spaces replaced by underscores,
//! so `Developer/Code Conventions` is served at
//! `/docs/developer/code_conventions/`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::DomainError;

/// One configured document, as it appears in settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocEntry {
    pub name: String,
    pub path: PathBuf,
}

impl DocEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub full_doc_id: String,
    pub full_name: String,
    pub path: PathBuf,
}

impl Doc {
    /// Page title shown in menus: the name without its folder part.
    pub fn doc_name(&self) -> &str {
        match self.split_name() {
            Some((_, doc_name)) => doc_name,
            None => self.full_name.as_str(),
        }
    }

    /// Folder the document lives in, or an empty string at the root.
    pub fn folder_name(&self) -> &str {
        match self.split_name() {
            Some((folder_name, _)) => folder_name,
            None => "",
        }
    }

    /// `(folder_id, doc_id)`; `folder_id` is empty at the root.
    pub fn ids(&self) -> (&str, &str) {
        match self.full_doc_id.split_once('/') {
            Some((folder_id, doc_id)) => (folder_id, doc_id),
            None => ("", self.full_doc_id.as_str()),
        }
    }

    /// Public URL of the rendered document.
    pub fn href(&self) -> String {
        match self.ids() {
            ("", doc_id) => format!("/docs/{doc_id}/"),
            (folder_id, doc_id) => format!("/docs/{folder_id}/{doc_id}/"),
        }
    }

    /// Directory attachments of this document are served from.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn split_name(&self) -> Option<(&str, &str)> {
        if self.full_doc_id.contains('/') {
            self.full_name.split_once('/')
        } else {
            None
        }
    }
}

/// Derive the URL identifier for a display name.
pub fn full_doc_id(full_name: &str) -> String {
    full_name.to_lowercase().replace(' ', "_")
}

/// Ordered set of documents keyed by `full_doc_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocCatalog {
    docs: Vec<Doc>,
}

impl DocCatalog {
    /// Build the catalog, keeping insertion order. A later entry with the same
    /// id replaces the earlier one in its original position.
    pub fn from_entries<I>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = DocEntry>,
    {
        let mut docs: Vec<Doc> = Vec::new();
        for DocEntry { name, path } in entries {
            if name.matches('/').count() > 1 {
                return Err(DomainError::validation(format!(
                    "Only one folder level allowed: {name}"
                )));
            }

            let doc = Doc {
                full_doc_id: full_doc_id(&name),
                full_name: name,
                path,
            };

            match docs.iter_mut().find(|d| d.full_doc_id == doc.full_doc_id) {
                Some(existing) => *existing = doc,
                None => docs.push(doc),
            }
        }
        Ok(Self { docs })
    }

    pub fn get(&self, full_doc_id: &str) -> Option<&Doc> {
        self.docs.iter().find(|doc| doc.full_doc_id == full_doc_id)
    }

    /// Look a document up by the identifiers used in its URL.
    pub fn resolve(&self, folder_id: Option<&str>, doc_id: &str) -> Option<&Doc> {
        match folder_id.filter(|folder| !folder.is_empty()) {
            Some(folder) => self.get(&format!("{folder}/{doc_id}")),
            None => self.get(doc_id),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Doc> {
        self.docs.iter()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DocCatalog {
        DocCatalog::from_entries([
            DocEntry::new("xyz_Marketing_xyz", "/repo/app/marketing/README.md"),
            DocEntry::new("Developer/Setup", "/repo/README.md"),
            DocEntry::new("Developer/Code Conventions", "/repo/code_conventions.md"),
            DocEntry::new("test", "/repo/tests/docs/test.md"),
        ])
        .expect("valid catalog")
    }

    #[test]
    fn ids_are_lowercased_with_underscores() {
        let catalog = catalog();
        let ids: Vec<_> = catalog.iter().map(|d| d.full_doc_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "xyz_marketing_xyz",
                "developer/setup",
                "developer/code_conventions",
                "test"
            ]
        );
    }

    #[test]
    fn folder_docs_split_names_and_ids() {
        let catalog = catalog();
        let doc = catalog
            .resolve(Some("developer"), "code_conventions")
            .expect("doc exists");
        assert_eq!(doc.doc_name(), "Code Conventions");
        assert_eq!(doc.folder_name(), "Developer");
        assert_eq!(doc.ids(), ("developer", "code_conventions"));
        assert_eq!(doc.href(), "/docs/developer/code_conventions/");
    }

    #[test]
    fn root_docs_have_no_folder() {
        let catalog = catalog();
        let doc = catalog.resolve(None, "test").expect("doc exists");
        assert_eq!(doc.doc_name(), "test");
        assert_eq!(doc.folder_name(), "");
        assert_eq!(doc.ids(), ("", "test"));
        assert_eq!(doc.href(), "/docs/test/");
        assert_eq!(doc.directory(), Path::new("/repo/tests/docs"));
    }

    #[test]
    fn empty_folder_id_resolves_root_doc() {
        let catalog = catalog();
        assert!(catalog.resolve(Some(""), "test").is_some());
        assert!(catalog.resolve(None, "developer").is_none());
    }

    #[test]
    fn nested_folders_are_rejected() {
        let err = DocCatalog::from_entries([DocEntry::new("a/b/c", "/x.md")])
            .expect_err("two folder levels are invalid");
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("Only one folder level allowed: a/b/c"));
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_path() {
        let catalog = DocCatalog::from_entries([
            DocEntry::new("Intro", "/one.md"),
            DocEntry::new("Other", "/other.md"),
            DocEntry::new("intro", "/two.md"),
        ])
        .expect("valid catalog");

        assert_eq!(catalog.len(), 2);
        let first = catalog.iter().next().expect("first doc");
        assert_eq!(first.full_doc_id, "intro");
        assert_eq!(first.full_name, "intro");
        assert_eq!(first.path, PathBuf::from("/two.md"));
    }
}
