use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Whether a tree node can be expanded, and if so whether it starts expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollapsibleState {
    None,
    Collapsed,
    Expanded,
}

/// A language identifier and the snippet files filed under it, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub language: Arc<str>,
    pub snippet_files: Vec<Arc<SnippetFile>>,
}

impl Language {
    pub fn new(language: impl Into<Arc<str>>) -> Self {
        Self {
            language: language.into(),
            snippet_files: Vec::new(),
        }
    }
}

/// A reference to one snippet file, from an extension, the user's snippets
/// directory, or a workspace folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetFile {
    /// Where the file comes from: an extension's display name,
    /// `"User Snippets"`, or `"/<folder> Snippets"`.
    pub label: Arc<str>,
    pub path: PathBuf,
    pub language: Arc<str>,
    pub collapsible_state: CollapsibleState,
}

impl SnippetFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    Single(String),
    List(Vec<String>),
}

impl StringOrList {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            StringOrList::Single(item) => std::slice::from_ref(item),
            StringOrList::List(items) => items,
        };
        items.iter().map(String::as_str)
    }
}

/// One snippet definition read from a snippet file.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub name: String,
    pub prefix: Option<StringOrList>,
    pub scope: Vec<Arc<str>>,
    pub description: Option<String>,
    pub body: Option<StringOrList>,
    pub snippet_file: Arc<SnippetFile>,
}

impl Snippet {
    pub fn prefixes(&self) -> Vec<&str> {
        self.prefix.iter().flat_map(StringOrList::iter).collect()
    }

    /// The expansion template as a single string, body lines joined by newlines.
    pub fn body_text(&self) -> String {
        self.body
            .iter()
            .flat_map(StringOrList::iter)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
