//! Paths to locations used by the editor host and its snippet files.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use util::paths::home_dir;
use util::paths::normalize_path;

/// The identifier under which the host hands out this plugin's storage.
pub const EXTENSION_ID: &str = "snippets-viewer";

/// Folder inside every workspace folder that holds project-local snippet files.
pub const LOCAL_SETTINGS_FOLDER_NAME: &str = ".vscode";

/// File extensions recognized as snippet files when listing a directory.
pub const SNIPPET_FILE_EXTENSIONS: &[&str] = &["json", "code-snippets"];

/// Path fragment present in every file shipped inside the host application bundle.
pub const HOST_APP_INSTALL_MARKER: &str = "Code.app";

/// Returns the path to the host's configuration directory.
/// On macOS, this is `~/Library/Application Support/Code`.
/// On Linux/FreeBSD, this is `$XDG_CONFIG_HOME/Code`.
/// On Windows, this is `%APPDATA%\Code`.
pub fn config_dir() -> &'static PathBuf {
    static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();
    CONFIG_DIR.get_or_init(|| {
        if cfg!(target_os = "macos") {
            home_dir().join("Library/Application Support/Code")
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| home_dir().join(".config"))
                .join("Code")
        }
    })
}

/// Returns the path to the user's `settings.json` file.
pub fn settings_file() -> &'static PathBuf {
    static SETTINGS_FILE: OnceLock<PathBuf> = OnceLock::new();
    SETTINGS_FILE.get_or_init(|| config_dir().join("User").join("settings.json"))
}

/// Returns the storage directory the host assigns to this plugin.
pub fn global_storage_dir() -> &'static PathBuf {
    static GLOBAL_STORAGE_DIR: OnceLock<PathBuf> = OnceLock::new();
    GLOBAL_STORAGE_DIR.get_or_init(|| {
        config_dir()
            .join("User")
            .join("globalStorage")
            .join(EXTENSION_ID)
    })
}

/// Returns the directory holding extensions installed by the user.
pub fn extensions_dir() -> &'static PathBuf {
    static EXTENSIONS_DIR: OnceLock<PathBuf> = OnceLock::new();
    EXTENSIONS_DIR.get_or_init(|| home_dir().join(".vscode").join("extensions"))
}

/// Returns the directory holding the extensions bundled with the host application.
pub fn builtin_extensions_dir() -> &'static PathBuf {
    static BUILTIN_EXTENSIONS_DIR: OnceLock<PathBuf> = OnceLock::new();
    BUILTIN_EXTENSIONS_DIR.get_or_init(|| {
        if cfg!(target_os = "macos") {
            PathBuf::from("/Applications/Visual Studio Code.app/Contents/Resources/app/extensions")
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .unwrap_or_else(|| home_dir().join("AppData").join("Local"))
                .join("Programs/Microsoft VS Code/resources/app/extensions")
        } else {
            PathBuf::from("/usr/share/code/resources/app/extensions")
        }
    })
}

/// Returns the user's global snippets directory, which sits next to the
/// `globalStorage` tree: `<global storage>/../../../User/snippets`.
pub fn user_snippets_dir(global_storage_dir: &Path) -> PathBuf {
    normalize_path(
        &global_storage_dir
            .join("..")
            .join("..")
            .join("..")
            .join("User")
            .join("snippets"),
    )
}

/// Returns the directory holding snippet files local to a workspace folder.
pub fn local_snippets_dir(workspace_folder: &Path) -> PathBuf {
    workspace_folder.join(LOCAL_SETTINGS_FOLDER_NAME)
}

/// Whether a directory entry with this file name should be treated as a
/// snippet file.
pub fn is_snippet_file_name(file_name: &str) -> bool {
    SNIPPET_FILE_EXTENSIONS.iter().any(|extension| {
        file_name
            .strip_suffix(extension)
            .is_some_and(|rest| rest.ends_with('.'))
    })
}
