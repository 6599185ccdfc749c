use anyhow::{Context, Result};
use fs::Fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "package.json";

/// The parts of an extension's `package.json` this crate reads.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Set by the host for extensions that ship with the application.
    #[serde(default)]
    pub is_builtin: bool,
    #[serde(default)]
    pub contributes: ExtensionContributions,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionContributions {
    /// Kept as raw JSON: only an array of `{language, path}` objects is
    /// meaningful, anything else is ignored.
    #[serde(default)]
    pub snippets: serde_json::Value,
}

/// One `contributes.snippets` entry: a snippet file for a language, with a
/// path relative to the extension's install location.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SnippetContribution {
    pub language: String,
    pub path: PathBuf,
}

impl ExtensionManifest {
    pub async fn load(fs: &dyn Fs, extension_dir: &Path) -> Result<Self> {
        let manifest_path = extension_dir.join(MANIFEST_FILE_NAME);
        let manifest_content = fs
            .load(&manifest_path)
            .await
            .with_context(|| format!("failed to load {}", manifest_path.display()))?;
        serde_json_lenient::from_str_lenient(&manifest_content)
            .with_context(|| format!("invalid {}", manifest_path.display()))
    }

    /// The `"<publisher>.<name>"` identifier, when both are declared.
    pub fn id(&self) -> Option<String> {
        Some(format!("{}.{}", self.publisher.as_ref()?, self.name.as_ref()?))
    }

    /// Returns the declared snippet contributions, or `None` when the
    /// manifest declares none or declares something other than an array.
    /// Entries missing a `language` or `path` string are dropped.
    pub fn snippet_contributions(&self) -> Option<Vec<SnippetContribution>> {
        let entries = self.contributes.snippets.as_array()?;
        let contributions = entries
            .iter()
            .filter_map(|entry| {
                let language = entry.get("language")?.as_str()?;
                let path = entry.get("path")?.as_str()?;
                Some(SnippetContribution {
                    language: language.to_string(),
                    path: PathBuf::from(path),
                })
            })
            .collect::<Vec<_>>();
        (!contributions.is_empty()).then_some(contributions)
    }
}
