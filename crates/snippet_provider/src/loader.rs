use anyhow::Result;
use futures::{future::join_all, StreamExt as _};
use notifications::NotifyResultExt as _;
use settings::SnippetsViewerSettings;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use util::{paths::normalize_path, ResultExt as _};

use crate::{
    format::parse_snippets,
    registry::{LanguageIndexBuilder, SnippetRegistry},
    CollapsibleState, HostContext, Language, LanguageIndex, Snippet, SnippetFile,
};

pub const USER_SNIPPETS_LABEL: &str = "User Snippets";

/// Whether a snippet file ships inside the host application bundle.
///
/// This is a substring test against the host's install directory name, not
/// a structural check.
pub fn is_bundled_with_host_app(path: &Path) -> bool {
    path.to_string_lossy()
        .contains(paths::HOST_APP_INSTALL_MARKER)
}

/// Finds snippet files contributed by extensions, the user's snippets
/// directory and workspace folders, and reads snippets out of them.
pub struct SnippetLoader {
    host: HostContext,
    registry: SnippetRegistry,
    next_generation: AtomicU64,
}

impl SnippetLoader {
    pub fn new(host: HostContext) -> Self {
        Self {
            host,
            registry: SnippetRegistry::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    /// The most recently installed language index.
    pub fn index(&self) -> Arc<LanguageIndex> {
        self.registry.current()
    }

    /// Rescans every snippet source and installs the result as the current
    /// index, unless a pass that started later has already been installed.
    /// Returns the languages this pass found, sorted by identifier.
    pub async fn discover_languages(&self) -> Vec<Arc<Language>> {
        let index = self.scan().await;
        self.registry.install(index.clone());
        index.languages().to_vec()
    }

    /// Runs one discovery pass without installing its result.
    pub async fn scan(&self) -> Arc<LanguageIndex> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let settings = self.host.settings.snippets_viewer_settings();
        let collapsible_state = snippet_file_collapsible_state(&settings);

        let mut builder = LanguageIndexBuilder::new(generation);
        for snippet_file in self.extension_snippet_files(&settings, collapsible_state) {
            builder.add_file(snippet_file);
        }
        for snippet_file in self
            .directory_snippet_files(&self.host.user_snippets_dir(), USER_SNIPPETS_LABEL)
            .await
        {
            builder.add_file(snippet_file);
        }
        for snippet_file in self.project_snippet_files().await {
            builder.add_file(snippet_file);
        }

        let index = builder.build();
        log::debug!(
            "snippet discovery generation {} found {} languages",
            generation,
            index.languages().len()
        );
        Arc::new(index)
    }

    /// Installs an index produced by [`Self::scan`]. Returns false when a
    /// newer index is already installed.
    pub fn install(&self, index: Arc<LanguageIndex>) -> bool {
        self.registry.install(index)
    }

    fn extension_snippet_files(
        &self,
        settings: &SnippetsViewerSettings,
        collapsible_state: CollapsibleState,
    ) -> Vec<SnippetFile> {
        let mut snippet_files = Vec::new();
        for extension in self.host.extensions.extensions() {
            if !settings.show_built_in_extension_snippets && extension.is_builtin() {
                continue;
            }
            let (Some(contributions), Some(location)) = (
                extension.manifest.snippet_contributions(),
                extension.location.as_ref(),
            ) else {
                continue;
            };
            let label: Arc<str> = extension.display_name().into();
            for contribution in contributions {
                if settings.skips_language(&contribution.language) {
                    continue;
                }
                snippet_files.push(SnippetFile {
                    label: label.clone(),
                    path: normalize_path(&location.join(&contribution.path)),
                    language: contribution.language.into(),
                    collapsible_state,
                });
            }
        }
        snippet_files
    }

    /// Snippet files in every workspace folder's `.vscode` directory, in
    /// folder order.
    pub async fn project_snippet_files(&self) -> Vec<SnippetFile> {
        let folders = self.host.workspace.workspace_folders();
        join_all(folders.iter().map(|folder| {
            let label = format!("/{} Snippets", folder.name);
            let dir = folder.snippets_dir();
            async move { self.directory_snippet_files(&dir, &label).await }
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Lists the snippet files directly inside `dir`, each filed under its
    /// lowercased file stem. A directory that does not exist yields nothing;
    /// one that cannot be read is reported to the user and yields nothing.
    pub async fn directory_snippet_files(&self, dir: &Path, label: &str) -> Vec<SnippetFile> {
        if !self.host.fs.is_dir(dir).await {
            log::debug!("no snippets directory at {}", dir.display());
            return Vec::new();
        }

        let settings = self.host.settings.snippets_viewer_settings();
        let collapsible_state = snippet_file_collapsible_state(&settings);
        let label: Arc<str> = label.into();
        let Some(mut entries) = self
            .read_dir_sorted(dir)
            .await
            .notify_err(
                self.host.notifier.as_ref(),
                format_args!("Error reading directory: {}", dir.display()),
            )
        else {
            return Vec::new();
        };

        entries.retain(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(paths::is_snippet_file_name)
        });

        let mut snippet_files = Vec::new();
        for path in entries {
            if self.host.fs.is_dir(&path).await {
                continue;
            }
            let Some(language) = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_lowercase())
            else {
                continue;
            };
            if settings.skips_language(&language) {
                continue;
            }
            snippet_files.push(SnippetFile {
                label: label.clone(),
                path,
                language: language.into(),
                collapsible_state,
            });
        }
        snippet_files
    }

    async fn read_dir_sorted(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = self.host.fs.read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next().await {
            if let Some(path) = entry.log_err() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every snippet file an extension contributes, labelled with its
    /// language. Ignores the skip-list and the built-in setting; an unknown
    /// extension yields nothing.
    pub fn snippet_files_for_extension(&self, extension_id: &str) -> Vec<SnippetFile> {
        let Some(extension) = self.host.extensions.extension(extension_id) else {
            return Vec::new();
        };
        let (Some(contributions), Some(location)) = (
            extension.manifest.snippet_contributions(),
            extension.location.as_ref(),
        ) else {
            return Vec::new();
        };
        let collapsible_state =
            snippet_file_collapsible_state(&self.host.settings.snippets_viewer_settings());
        contributions
            .into_iter()
            .map(|contribution| {
                let language: Arc<str> = contribution.language.into();
                SnippetFile {
                    label: language.clone(),
                    path: normalize_path(&location.join(&contribution.path)),
                    language,
                    collapsible_state,
                }
            })
            .collect()
    }

    /// The snippets of every file of `language`, in file order. A file that
    /// fails to load contributes nothing.
    pub async fn snippets_for_language(&self, language: &Language) -> Vec<Snippet> {
        join_all(
            language
                .snippet_files
                .iter()
                .map(|snippet_file| self.parse_file(snippet_file)),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Reads the snippets defined in a file. Read and parse failures are
    /// reported to the user and yield no snippets.
    pub async fn parse_file(&self, snippet_file: &Arc<SnippetFile>) -> Vec<Snippet> {
        let notifier = self.host.notifier.as_ref();
        let path = &snippet_file.path;

        let Some(content) = self
            .host
            .fs
            .load(path)
            .await
            .notify_err(notifier, format_args!("Error reading file {}", path.display()))
        else {
            return Vec::new();
        };

        let Some(mut snippets) = parse_snippets(&content, snippet_file).notify_err(
            notifier,
            format_args!("JSON parsing of snippet file {} failed", path.display()),
        ) else {
            return Vec::new();
        };

        if self.host.settings.snippets_viewer_settings().user_only {
            snippets.retain(|snippet| is_bundled_with_host_app(&snippet.snippet_file.path));
        }
        snippets
    }
}

fn snippet_file_collapsible_state(settings: &SnippetsViewerSettings) -> CollapsibleState {
    if settings.expand_snippet_files {
        CollapsibleState::Expanded
    } else {
        CollapsibleState::Collapsed
    }
}
