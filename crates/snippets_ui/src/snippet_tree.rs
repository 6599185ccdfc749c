use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;
use snippet_provider::{CollapsibleState, Language, Snippet, SnippetFile, SnippetLoader};
use std::sync::Arc;

use crate::SnippetCommand;

/// A node of the snippet tree: languages at the root, their snippet files
/// below them, and the snippets of each file as leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Language(Arc<Language>),
    File(Arc<SnippetFile>),
    Snippet(Arc<Snippet>),
}

/// How the host should display a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub collapsible_state: CollapsibleState,
    /// Invoked with the node as argument when the item is activated.
    pub command: Option<SnippetCommand>,
    /// Lets the host pick which context-menu commands apply to the item.
    pub context_value: &'static str,
}

/// Tells the host to query the tree again, from `node` downward or from the
/// root when `node` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEvent {
    pub node: Option<TreeNode>,
}

/// Serves the snippet tree to the host's tree view.
///
/// Children of a file node are parsed from disk every time they are
/// requested. Everything above that comes from the loader's installed
/// language index, which only changes on [`Self::refresh`].
pub struct SnippetTreeProvider {
    loader: Arc<SnippetLoader>,
    subscribers: Mutex<Vec<UnboundedSender<TreeEvent>>>,
}

impl SnippetTreeProvider {
    pub fn new(loader: Arc<SnippetLoader>) -> Self {
        Self {
            loader,
            subscribers: Mutex::default(),
        }
    }

    pub fn loader(&self) -> &Arc<SnippetLoader> {
        &self.loader
    }

    /// Receives a [`TreeEvent`] after every refresh that changed what the
    /// tree shows. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> UnboundedReceiver<TreeEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub async fn children(&self, parent: Option<&TreeNode>) -> Vec<TreeNode> {
        match parent {
            None => {
                let mut index = self.loader.index();
                if index.generation == 0 {
                    self.refresh(true).await;
                    index = self.loader.index();
                }
                index
                    .languages()
                    .iter()
                    .cloned()
                    .map(TreeNode::Language)
                    .collect()
            }
            Some(TreeNode::Language(language)) => language
                .snippet_files
                .iter()
                .cloned()
                .map(TreeNode::File)
                .collect(),
            Some(TreeNode::File(snippet_file)) => self
                .loader
                .parse_file(snippet_file)
                .await
                .into_iter()
                .map(|snippet| TreeNode::Snippet(Arc::new(snippet)))
                .collect(),
            Some(TreeNode::Snippet(_)) => Vec::new(),
        }
    }

    pub fn tree_item(&self, node: &TreeNode) -> TreeItem {
        match node {
            TreeNode::Language(language) => TreeItem {
                label: language.language.to_string(),
                description: None,
                tooltip: None,
                collapsible_state: CollapsibleState::Collapsed,
                command: None,
                context_value: "language",
            },
            TreeNode::File(snippet_file) => TreeItem {
                label: snippet_file.label.to_string(),
                description: Some(snippet_file.file_name()),
                tooltip: Some(snippet_file.path.display().to_string()),
                collapsible_state: snippet_file.collapsible_state,
                command: None,
                context_value: "snippetFile",
            },
            TreeNode::Snippet(snippet) => {
                let prefixes = snippet.prefixes();
                TreeItem {
                    label: snippet.name.clone(),
                    description: (!prefixes.is_empty()).then(|| prefixes.join(", ")),
                    tooltip: snippet.description.clone(),
                    collapsible_state: CollapsibleState::None,
                    command: Some(SnippetCommand::InsertSnippet),
                    context_value: "snippet",
                }
            }
        }
    }

    /// Asks the host to redraw the tree. With `rebuild`, every snippet
    /// source is scanned again first. Returns false when that scan was
    /// overtaken by a newer one, in which case nothing is emitted.
    pub async fn refresh(&self, rebuild: bool) -> bool {
        if rebuild {
            let index = self.loader.scan().await;
            let generation = index.generation;
            if !self.loader.install(index) {
                log::debug!("dropping stale snippet tree refresh {}", generation);
                return false;
            }
        }
        self.emit(TreeEvent { node: None });
        true
    }

    fn emit(&self, event: TreeEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}
