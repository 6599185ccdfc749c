mod format;
mod loader;
mod registry;
mod snippet;

#[cfg(test)]
mod loader_tests;

use extension::ExtensionRegistry;
use fs::Fs;
use notifications::Notifier;
use settings::SettingsSource;
use std::path::PathBuf;
use std::sync::Arc;

pub use format::parse_snippets;
pub use loader::{is_bundled_with_host_app, SnippetLoader, USER_SNIPPETS_LABEL};
pub use registry::{LanguageIndex, SnippetRegistry};
pub use snippet::{CollapsibleState, Language, Snippet, SnippetFile, StringOrList};

/// A folder open in the host's workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    /// A folder named after the last component of its path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }

    pub fn snippets_dir(&self) -> PathBuf {
        paths::local_snippets_dir(&self.path)
    }
}

/// The folders currently open in the host's workspace.
pub trait WorkspaceFolders: Send + Sync {
    fn workspace_folders(&self) -> Vec<WorkspaceFolder>;
}

impl WorkspaceFolders for Vec<WorkspaceFolder> {
    fn workspace_folders(&self) -> Vec<WorkspaceFolder> {
        self.clone()
    }
}

impl WorkspaceFolders for parking_lot::RwLock<Vec<WorkspaceFolder>> {
    fn workspace_folders(&self) -> Vec<WorkspaceFolder> {
        self.read().clone()
    }
}

/// Everything the snippet loader needs from the host.
#[derive(Clone)]
pub struct HostContext {
    pub fs: Arc<dyn Fs>,
    pub extensions: Arc<dyn ExtensionRegistry>,
    pub settings: Arc<dyn SettingsSource>,
    pub notifier: Arc<dyn Notifier>,
    pub workspace: Arc<dyn WorkspaceFolders>,
    /// The storage directory the host assigned to this plugin. The user's
    /// snippets directory is located relative to it.
    pub global_storage_dir: PathBuf,
}

impl HostContext {
    pub fn user_snippets_dir(&self) -> PathBuf {
        paths::user_snippets_dir(&self.global_storage_dir)
    }
}
