mod extension_manifest;
mod installed_extensions;

#[cfg(test)]
mod extension_store_test;

use std::path::PathBuf;
use std::sync::Arc;

pub use extension_manifest::{
    ExtensionContributions, ExtensionManifest, SnippetContribution, MANIFEST_FILE_NAME,
};
pub use installed_extensions::{ExtensionsDir, InstalledExtensions};

/// An installed extension, as reported by the host's extension registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub id: Arc<str>,
    pub manifest: ExtensionManifest,
    /// Where the extension is installed. Contributed paths resolve against it.
    pub location: Option<PathBuf>,
}

impl Extension {
    pub fn is_builtin(&self) -> bool {
        self.manifest.is_builtin
    }

    /// The human-readable name: the declared display name, else the package
    /// name, else the id.
    pub fn display_name(&self) -> &str {
        self.manifest
            .display_name
            .as_deref()
            .or(self.manifest.name.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Enumerates installed extensions.
pub trait ExtensionRegistry: Send + Sync {
    fn extensions(&self) -> Vec<Arc<Extension>>;

    fn extension(&self, id: &str) -> Option<Arc<Extension>> {
        self.extensions()
            .into_iter()
            .find(|extension| extension.id.eq_ignore_ascii_case(id))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeExtensionRegistry {
    extensions: parking_lot::Mutex<Vec<Arc<Extension>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeExtensionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers an extension from its `package.json` contents.
    pub fn insert(&self, id: &str, location: Option<&str>, manifest: serde_json::Value) {
        let manifest = serde_json::from_value(manifest).unwrap();
        self.extensions.lock().push(Arc::new(Extension {
            id: id.into(),
            manifest,
            location: location.map(PathBuf::from),
        }));
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ExtensionRegistry for FakeExtensionRegistry {
    fn extensions(&self) -> Vec<Arc<Extension>> {
        self.extensions.lock().clone()
    }
}
