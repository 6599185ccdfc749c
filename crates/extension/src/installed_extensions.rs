use anyhow::{Context as _, Result};
use fs::Fs;
use futures::StreamExt as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use util::ResultExt as _;

use crate::{Extension, ExtensionManifest, ExtensionRegistry, MANIFEST_FILE_NAME};

/// A directory whose subdirectories are installed extensions.
#[derive(Debug, Clone)]
pub struct ExtensionsDir {
    pub path: PathBuf,
    /// Whether the extensions found here ship with the host application.
    pub builtin: bool,
}

/// An extension registry built by scanning extension directories on disk.
#[derive(Default)]
pub struct InstalledExtensions {
    extensions: Vec<Arc<Extension>>,
}

impl InstalledExtensions {
    /// Scans every directory in order. Directories that do not exist are
    /// skipped; extensions whose manifest is missing or malformed are logged
    /// and skipped. When two directories provide the same id, the first wins.
    pub async fn load(fs: &dyn Fs, dirs: &[ExtensionsDir]) -> Self {
        let mut extensions = Vec::<Arc<Extension>>::new();
        for dir in dirs {
            if !fs.is_dir(&dir.path).await {
                log::debug!("extensions directory {} does not exist", dir.path.display());
                continue;
            }
            let Some(found) = scan_extensions_dir(fs, dir).await.log_err() else {
                continue;
            };
            for extension in found {
                if extensions.iter().any(|existing| existing.id == extension.id) {
                    log::debug!("ignoring duplicate extension {}", extension.id);
                    continue;
                }
                extensions.push(Arc::new(extension));
            }
        }
        log::debug!("found {} installed extensions", extensions.len());
        Self { extensions }
    }
}

impl ExtensionRegistry for InstalledExtensions {
    fn extensions(&self) -> Vec<Arc<Extension>> {
        self.extensions.clone()
    }
}

async fn scan_extensions_dir(fs: &dyn Fs, dir: &ExtensionsDir) -> Result<Vec<Extension>> {
    let mut entries = fs
        .read_dir(&dir.path)
        .await
        .with_context(|| format!("failed to list extensions in {}", dir.path.display()))?;

    let mut extension_dirs = Vec::new();
    while let Some(entry) = entries.next().await {
        let Some(path) = entry.log_err() else {
            continue;
        };
        if fs.is_file(&path.join(MANIFEST_FILE_NAME)).await {
            extension_dirs.push(path);
        }
    }
    extension_dirs.sort();

    let mut extensions = Vec::new();
    for extension_dir in extension_dirs {
        if let Some(extension) = load_extension(fs, &extension_dir, dir.builtin)
            .await
            .warn_on_err()
        {
            extensions.push(extension);
        }
    }
    Ok(extensions)
}

async fn load_extension(fs: &dyn Fs, extension_dir: &Path, builtin: bool) -> Result<Extension> {
    let mut manifest = ExtensionManifest::load(fs, extension_dir).await?;
    manifest.is_builtin |= builtin;
    let id = match manifest.id() {
        Some(id) => id,
        None => extension_dir
            .file_name()
            .and_then(|name| name.to_str())
            .context("invalid extension directory name")?
            .to_string(),
    };
    Ok(Extension {
        id: id.into(),
        manifest,
        location: Some(extension_dir.to_path_buf()),
    })
}
