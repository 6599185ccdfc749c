use anyhow::Result;
use parking_lot::RwLock;
use serde_derive::{Deserialize, Serialize};
use util::ResultExt as _;

use crate::{Settings, SettingsStore};

/// Settings of the snippets tree view, stored under `"snippets.viewer"`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetsViewerSettings {
    pub skip_languages: Vec<String>,
    pub show_built_in_extension_snippets: bool,
    pub expand_snippet_files: bool,
    pub user_only: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetsViewerSettingsContent {
    /// Languages whose snippet files are never listed.
    ///
    /// Default: []
    pub skip_languages: Option<Vec<String>>,
    /// Whether snippets contributed by extensions bundled with the editor are listed.
    ///
    /// Default: true
    pub show_built_in_extension_snippets: Option<bool>,
    /// Whether snippet file nodes start out expanded.
    ///
    /// Default: false
    pub expand_snippet_files: Option<bool>,
    /// Only keep snippets whose file lives inside the host application bundle.
    ///
    /// Default: false
    pub user_only: Option<bool>,
}

impl Default for SnippetsViewerSettings {
    fn default() -> Self {
        Self {
            skip_languages: Vec::new(),
            show_built_in_extension_snippets: true,
            expand_snippet_files: false,
            user_only: false,
        }
    }
}

impl SnippetsViewerSettings {
    pub fn skips_language(&self, language: &str) -> bool {
        self.skip_languages.iter().any(|skipped| skipped == language)
    }
}

impl Settings for SnippetsViewerSettings {
    const KEY: Option<&'static str> = Some("snippets.viewer");

    type FileContent = SnippetsViewerSettingsContent;

    fn load(
        default_value: &SnippetsViewerSettingsContent,
        user_values: &[&SnippetsViewerSettingsContent],
    ) -> Result<Self> {
        Self::load_via_json_merge(default_value, user_values)
    }
}

/// Read access to the host's settings storage.
///
/// Settings are read anew on every discovery pass and file parse, so a
/// source may change between calls.
pub trait SettingsSource: Send + Sync {
    fn snippets_viewer_settings(&self) -> SnippetsViewerSettings;
}

impl SettingsSource for SnippetsViewerSettings {
    fn snippets_viewer_settings(&self) -> SnippetsViewerSettings {
        self.clone()
    }
}

impl SettingsSource for RwLock<SettingsStore> {
    fn snippets_viewer_settings(&self) -> SnippetsViewerSettings {
        self.read()
            .get::<SnippetsViewerSettings>()
            .log_err()
            .unwrap_or_default()
    }
}
