use std::collections::HashMap;

use serde::Serialize;

use super::docs::DocCatalog;

/// Node of the documentation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    pub label: String,
    pub icon: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavigationEntry>,
}

/// Menu for all documents. Documents inside a folder are grouped under a
/// folder entry placed where the folder's first document appears.
pub fn documentation_navigation(catalog: &DocCatalog) -> NavigationEntry {
    let mut children: Vec<NavigationEntry> = Vec::new();
    let mut folders: HashMap<&str, usize> = HashMap::new();

    for doc in catalog.iter() {
        let (folder_id, _) = doc.ids();
        let child = NavigationEntry {
            label: doc.doc_name().to_string(),
            icon: "file",
            description: format!("Documentation for {}", doc.full_name),
            href: Some(doc.href()),
            rank: None,
            children: Vec::new(),
        };

        if folder_id.is_empty() {
            children.push(child);
            continue;
        }

        let position = *folders.entry(folder_id).or_insert_with(|| {
            children.push(NavigationEntry {
                label: doc.folder_name().to_string(),
                icon: "book",
                description: format!("Documentation Folder {}", doc.folder_name()),
                href: None,
                rank: None,
                children: Vec::new(),
            });
            children.len() - 1
        });
        children[position].children.push(child);
    }

    NavigationEntry {
        label: "Documentation".to_string(),
        icon: "book",
        description: "Documentation".to_string(),
        href: Some("/docs/".to_string()),
        rank: Some(100),
        children,
    }
}
