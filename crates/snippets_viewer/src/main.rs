use anyhow::{anyhow, Result};
use clap::Parser;
use extension::{ExtensionRegistry as _, ExtensionsDir, InstalledExtensions};
use fs::{Fs, RealFs};
use notifications::{Notifier, NotifyResultExt as _, StderrNotifier};
use parking_lot::RwLock;
use settings::SettingsStore;
use snippet_provider::{HostContext, SnippetLoader, WorkspaceFolder};
use snippets_ui::{SnippetTreeProvider, TreeNode};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "snippets-viewer",
    about = "Lists the code snippets contributed by installed extensions, the user's snippets directory and workspace folders."
)]
struct Args {
    /// A directory of user-installed extensions. Can be given multiple times.
    /// Defaults to the host's extensions directory.
    #[arg(long, value_name = "DIR")]
    extensions_dir: Vec<PathBuf>,
    /// A directory of extensions bundled with the host application. Can be
    /// given multiple times.
    #[arg(long, value_name = "DIR")]
    builtin_extensions_dir: Vec<PathBuf>,
    /// The storage directory the host assigned to this plugin. The user's
    /// snippets directory is found relative to it.
    #[arg(long, value_name = "DIR")]
    global_storage: Option<PathBuf>,
    /// A workspace folder whose `.vscode` snippets should be listed. Can be
    /// given multiple times.
    #[arg(long, value_name = "DIR")]
    workspace: Vec<PathBuf>,
    /// The user settings file.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Only print this language.
    #[arg(long, value_name = "ID")]
    language: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    smol::block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let fs: Arc<dyn Fs> = Arc::new(RealFs);

    let mut extension_dirs = args
        .extensions_dir
        .iter()
        .map(|path| ExtensionsDir {
            path: path.clone(),
            builtin: false,
        })
        .chain(args.builtin_extensions_dir.iter().map(|path| ExtensionsDir {
            path: path.clone(),
            builtin: true,
        }))
        .collect::<Vec<_>>();
    if extension_dirs.is_empty() {
        extension_dirs = vec![
            ExtensionsDir {
                path: paths::extensions_dir().clone(),
                builtin: false,
            },
            ExtensionsDir {
                path: paths::builtin_extensions_dir().clone(),
                builtin: true,
            },
        ];
    }
    let extensions = InstalledExtensions::load(fs.as_ref(), &extension_dirs).await;
    log::info!("found {} extensions", extensions.extensions().len());

    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier);
    let settings_path = args
        .settings
        .unwrap_or_else(|| paths::settings_file().clone());
    let settings = load_settings(fs.as_ref(), &settings_path, notifier.as_ref()).await?;

    let loader = SnippetLoader::new(HostContext {
        fs,
        extensions: Arc::new(extensions),
        settings: Arc::new(RwLock::new(settings)),
        notifier,
        workspace: Arc::new(
            args.workspace
                .into_iter()
                .map(WorkspaceFolder::new)
                .collect::<Vec<_>>(),
        ),
        global_storage_dir: args
            .global_storage
            .unwrap_or_else(|| paths::global_storage_dir().clone()),
    });
    let provider = SnippetTreeProvider::new(Arc::new(loader));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_tree(&provider, args.language.as_deref(), &mut out).await?;
    out.flush()?;
    Ok(())
}

/// The default settings overlaid with the user's settings file. A user file
/// that cannot be read or parsed is reported and the defaults are used.
async fn load_settings(
    fs: &dyn Fs,
    path: &Path,
    notifier: &dyn Notifier,
) -> Result<SettingsStore> {
    let mut settings = SettingsStore::new(&settings::default_settings())?;
    settings
        .load_user_settings(fs, path)
        .await
        .notify_err(
            notifier,
            format_args!("Error loading settings {}", path.display()),
        );
    Ok(settings)
}

/// Writes languages, their snippet files and each file's snippets, one
/// level of indentation per tree level.
async fn print_tree(
    provider: &SnippetTreeProvider,
    language: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let mut languages = provider.children(None).await;
    if let Some(language) = language {
        languages.retain(|node| matches!(node, TreeNode::Language(l) if &*l.language == language));
        if languages.is_empty() {
            return Err(anyhow!("no snippet files for language {language:?}"));
        }
    }

    for language in &languages {
        write_node(provider, language, 0, out)?;
        for file in provider.children(Some(language)).await {
            write_node(provider, &file, 1, out)?;
            for snippet in provider.children(Some(&file)).await {
                write_node(provider, &snippet, 2, out)?;
            }
        }
    }
    Ok(())
}

fn write_node(
    provider: &SnippetTreeProvider,
    node: &TreeNode,
    depth: usize,
    out: &mut impl Write,
) -> Result<()> {
    let item = provider.tree_item(node);
    write!(out, "{:indent$}{}", "", item.label, indent = depth * 2)?;
    if let Some(description) = &item.description {
        write!(out, " ({description})")?;
    }
    if let (TreeNode::Snippet(_), Some(tooltip)) = (node, &item.tooltip) {
        write!(out, ": {tooltip}")?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extension::FakeExtensionRegistry;
    use fs::FakeFs;
    use indoc::indoc;
    use notifications::FakeNotifier;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use settings::SnippetsViewerSettings;

    async fn init_test() -> (Arc<FakeNotifier>, SnippetTreeProvider) {
        let fs = FakeFs::new();
        fs.insert_tree(
            "/ext/acme.sh/snippets",
            json!({ "shell.json": r##"{ "shebang": { "prefix": "#!", "body": "#!/bin/sh", "description": "Shebang" } }"## }),
        )
        .await;
        fs.insert_tree(
            "/config/Code/User/snippets",
            json!({
                "shellscript.json": r#"{ "for": { "prefix": ["for", "loop"], "body": "for $1 in $2; do\n\t$0\ndone" } }"#,
                "broken.json": "[",
            }),
        )
        .await;
        let extensions = FakeExtensionRegistry::new();
        extensions.insert(
            "acme.sh",
            Some("/ext/acme.sh"),
            json!({
                "displayName": "Acme Shell",
                "contributes": {
                    "snippets": [{ "language": "shellscript", "path": "snippets/shell.json" }]
                }
            }),
        );
        let notifier = FakeNotifier::new();
        let loader = SnippetLoader::new(HostContext {
            fs,
            extensions,
            settings: Arc::new(settings::SnippetsViewerSettings::default()),
            notifier: notifier.clone(),
            workspace: Arc::new(Vec::<WorkspaceFolder>::new()),
            global_storage_dir: PathBuf::from("/config/Code/User/globalStorage/snippets-viewer"),
        });
        (notifier, SnippetTreeProvider::new(Arc::new(loader)))
    }

    #[test]
    fn test_print_tree() {
        smol::block_on(async {
            let (notifier, provider) = init_test().await;
            let mut out = Vec::new();
            print_tree(&provider, None, &mut out).await.unwrap();
            assert_eq!(
                String::from_utf8(out).unwrap(),
                indoc! {"
                    broken
                      User Snippets (broken.json)
                    shellscript
                      Acme Shell (shell.json)
                        shebang (#!): Shebang
                      User Snippets (shellscript.json)
                        for (for, loop)
                "}
            );
            let messages = notifier.take_messages();
            assert_eq!(messages.len(), 1);
            assert!(messages[0]
                .starts_with("JSON parsing of snippet file /config/Code/User/snippets/broken.json failed"));
        });
    }

    #[test]
    fn test_print_single_language() {
        smol::block_on(async {
            let (_, provider) = init_test().await;
            let mut out = Vec::new();
            print_tree(&provider, Some("shellscript"), &mut out)
                .await
                .unwrap();
            assert!(String::from_utf8(out).unwrap().starts_with("shellscript\n"));

            let error = print_tree(&provider, Some("cobol"), &mut Vec::new())
                .await
                .unwrap_err();
            assert_eq!(error.to_string(), "no snippet files for language \"cobol\"");
        });
    }

    #[test]
    fn test_load_settings_falls_back_to_defaults() {
        smol::block_on(async {
            let fs = FakeFs::new();
            fs.insert_tree(
                "/config/Code/User",
                json!({
                    "good.json": r#"{ "snippets.viewer.userOnly": true }"#,
                    "bad.json": r#"{ "editor.fontSize": 14, oops }"#,
                }),
            )
            .await;
            let notifier = FakeNotifier::new();

            let settings = load_settings(
                &*fs,
                Path::new("/config/Code/User/good.json"),
                notifier.as_ref(),
            )
            .await
            .unwrap();
            assert!(settings.get::<SnippetsViewerSettings>().unwrap().user_only);

            let settings = load_settings(
                &*fs,
                Path::new("/config/Code/User/missing.json"),
                notifier.as_ref(),
            )
            .await
            .unwrap();
            assert_eq!(
                settings.get::<SnippetsViewerSettings>().unwrap(),
                SnippetsViewerSettings::default()
            );
            assert!(notifier.messages().is_empty());

            let settings = load_settings(
                &*fs,
                Path::new("/config/Code/User/bad.json"),
                notifier.as_ref(),
            )
            .await
            .unwrap();
            assert_eq!(
                settings.get::<SnippetsViewerSettings>().unwrap(),
                SnippetsViewerSettings::default()
            );
            let messages = notifier.take_messages();
            assert_eq!(messages.len(), 1);
            assert!(messages[0].starts_with("Error loading settings /config/Code/User/bad.json\n"));
        });
    }

    #[test]
    fn test_run_with_malformed_settings_file() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let settings_path = dir.path().join("settings.json");
            std::fs::write(&settings_path, r#"{ "editor.fontSize": 14, oops }"#).unwrap();
            std::fs::create_dir(dir.path().join("extensions")).unwrap();

            run(Args {
                extensions_dir: vec![dir.path().join("extensions")],
                builtin_extensions_dir: Vec::new(),
                global_storage: Some(dir.path().join("User/globalStorage/snippets-viewer")),
                workspace: Vec::new(),
                settings: Some(settings_path),
                language: None,
            })
            .await
            .unwrap();
        });
    }
}
