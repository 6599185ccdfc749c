use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::{SnippetTreeProvider, TreeNode};

/// User-invokable commands contributed by the snippet viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnippetCommand {
    RefreshSnippets,
    OpenSnippetFile,
    CopySnippet,
    InsertSnippet,
}

/// What the host should do once a command has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The tree was refreshed, unless a newer refresh had already landed.
    Refreshed { installed: bool },
    OpenFile(PathBuf),
    CopyToClipboard(String),
    InsertText(String),
}

impl SnippetCommand {
    pub const ALL: [SnippetCommand; 4] = [
        SnippetCommand::RefreshSnippets,
        SnippetCommand::OpenSnippetFile,
        SnippetCommand::CopySnippet,
        SnippetCommand::InsertSnippet,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SnippetCommand::RefreshSnippets => "snippets.viewer.refreshSnippets",
            SnippetCommand::OpenSnippetFile => "snippets.viewer.openSnippetFile",
            SnippetCommand::CopySnippet => "snippets.viewer.copySnippet",
            SnippetCommand::InsertSnippet => "snippets.viewer.insertSnippet",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }

    /// Runs the command registered under `id` against the node it was
    /// invoked on.
    pub async fn dispatch(
        id: &str,
        provider: &SnippetTreeProvider,
        node: Option<&TreeNode>,
    ) -> Result<CommandOutcome> {
        let command = Self::from_id(id).ok_or_else(|| anyhow!("unknown command {id:?}"))?;
        command.run(provider, node).await
    }

    pub async fn run(
        self,
        provider: &SnippetTreeProvider,
        node: Option<&TreeNode>,
    ) -> Result<CommandOutcome> {
        log::debug!("running {}", self.id());
        match (self, node) {
            (SnippetCommand::RefreshSnippets, _) => Ok(CommandOutcome::Refreshed {
                installed: provider.refresh(true).await,
            }),
            (SnippetCommand::OpenSnippetFile, Some(TreeNode::File(snippet_file))) => {
                Ok(CommandOutcome::OpenFile(snippet_file.path.clone()))
            }
            (SnippetCommand::OpenSnippetFile, Some(TreeNode::Snippet(snippet))) => {
                Ok(CommandOutcome::OpenFile(snippet.snippet_file.path.clone()))
            }
            (SnippetCommand::CopySnippet, Some(TreeNode::Snippet(snippet))) => {
                Ok(CommandOutcome::CopyToClipboard(snippet.body_text()))
            }
            (SnippetCommand::InsertSnippet, Some(TreeNode::Snippet(snippet))) => {
                Ok(CommandOutcome::InsertText(snippet.body_text()))
            }
            (command, node) => Err(anyhow!(
                "{} cannot run on {}",
                command.id(),
                match node {
                    None => "nothing",
                    Some(TreeNode::Language(_)) => "a language",
                    Some(TreeNode::File(_)) => "a snippet file",
                    Some(TreeNode::Snippet(_)) => "a snippet",
                }
            )),
        }
    }
}
