mod commands;
mod snippet_tree;

#[cfg(test)]
mod snippet_tree_tests;

pub use commands::{CommandOutcome, SnippetCommand};
pub use snippet_tree::{SnippetTreeProvider, TreeEvent, TreeItem, TreeNode};
