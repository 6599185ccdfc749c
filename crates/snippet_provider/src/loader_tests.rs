use crate::{
    CollapsibleState, HostContext, Language, SnippetLoader, StringOrList, WorkspaceFolder,
};
use extension::FakeExtensionRegistry;
use fs::FakeFs;
use notifications::FakeNotifier;
use parking_lot::RwLock;
use pretty_assertions::assert_eq;
use serde_json::json;
use settings::SettingsStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const GLOBAL_STORAGE: &str = "/config/Code/User/globalStorage/snippets-viewer";

struct TestHost {
    fs: Arc<FakeFs>,
    extensions: Arc<FakeExtensionRegistry>,
    settings: Arc<RwLock<SettingsStore>>,
    notifier: Arc<FakeNotifier>,
    folders: Arc<RwLock<Vec<WorkspaceFolder>>>,
}

impl TestHost {
    fn new() -> Self {
        Self {
            fs: FakeFs::new(),
            extensions: FakeExtensionRegistry::new(),
            settings: Arc::new(RwLock::new(SettingsStore::test())),
            notifier: FakeNotifier::new(),
            folders: Default::default(),
        }
    }

    fn loader(&self) -> SnippetLoader {
        SnippetLoader::new(HostContext {
            fs: self.fs.clone(),
            extensions: self.extensions.clone(),
            settings: self.settings.clone(),
            notifier: self.notifier.clone(),
            workspace: self.folders.clone(),
            global_storage_dir: PathBuf::from(GLOBAL_STORAGE),
        })
    }

    fn set_user_settings(&self, content: &str) {
        self.settings.write().set_user_settings(content).unwrap();
    }

    fn add_folder(&self, path: &str) {
        self.folders.write().push(WorkspaceFolder::new(path));
    }

    /// One extension per source, each contributing a python snippet file,
    /// plus a user and a project python snippet file.
    async fn populate(&self) {
        self.fs
            .insert_tree(
                "/extensions",
                json!({
                    "acme.python": {
                        "snippets": {
                            "python.json": r#"{ "main": { "prefix": "main", "body": "if __name__ == '__main__':" } }"#,
                            "rst.json": "{}",
                        },
                    },
                    "vscode.markdown": {
                        "snippets": { "markdown.json": "{}" },
                    },
                }),
            )
            .await;
        self.fs
            .insert_tree(
                "/config/Code/User/snippets",
                json!({
                    "Python.json": r#"{ "pr": { "prefix": "pr", "body": ["print($1)"] } }"#,
                    "shared.code-snippets": "{}",
                    "notes.txt": "not a snippet file",
                }),
            )
            .await;
        self.fs
            .insert_tree(
                "/work/app/.vscode",
                json!({
                    "python.code-snippets": "{}",
                    "settings.json": "{}",
                }),
            )
            .await;
        self.add_folder("/work/app");

        self.extensions.insert(
            "acme.python",
            Some("/extensions/acme.python"),
            json!({
                "displayName": "Acme Python",
                "contributes": {
                    "snippets": [
                        { "language": "python", "path": "./snippets/python.json" },
                        { "language": "restructuredtext", "path": "./snippets/rst.json" },
                    ]
                }
            }),
        );
        self.extensions.insert(
            "vscode.markdown",
            Some("/extensions/vscode.markdown"),
            json!({
                "displayName": "Markdown Language Basics",
                "isBuiltin": true,
                "contributes": {
                    "snippets": [{ "language": "markdown", "path": "snippets/markdown.json" }]
                }
            }),
        );
    }
}

async fn snippet_counts(loader: &SnippetLoader, language: &Language) -> Vec<usize> {
    let mut counts = Vec::new();
    for snippet_file in &language.snippet_files {
        counts.push(loader.parse_file(snippet_file).await.len());
    }
    counts
}

fn language_ids(languages: &[Arc<Language>]) -> Vec<&str> {
    languages
        .iter()
        .map(|language| language.language.as_ref())
        .collect()
}

fn file_sources(language: &Language) -> Vec<(&str, &Path)> {
    language
        .snippet_files
        .iter()
        .map(|file| (file.label.as_ref(), file.path.as_path()))
        .collect()
}

#[test]
fn test_discover_languages_from_all_sources() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        let loader = host.loader();

        let languages = loader.discover_languages().await;
        assert_eq!(
            language_ids(&languages),
            vec!["markdown", "python", "restructuredtext", "settings", "shared"]
        );

        let python = loader.index().language("python").cloned().unwrap();
        assert_eq!(
            file_sources(&python),
            vec![
                (
                    "Acme Python",
                    Path::new("/extensions/acme.python/snippets/python.json")
                ),
                ("User Snippets", Path::new("/config/Code/User/snippets/Python.json")),
                ("/app Snippets", Path::new("/work/app/.vscode/python.code-snippets")),
            ]
        );
        assert!(python
            .snippet_files
            .iter()
            .all(|file| file.collapsible_state == CollapsibleState::Collapsed
                && file.language.as_ref() == "python"));
        assert!(host.notifier.messages().is_empty());
    });
}

#[test]
fn test_skip_languages_apply_to_every_source() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        host.set_user_settings(
            r#"{ "snippets.viewer.skipLanguages": ["python", "settings", "markdown"] }"#,
        );

        let languages = host.loader().discover_languages().await;
        assert_eq!(language_ids(&languages), vec!["restructuredtext", "shared"]);
    });
}

#[test]
fn test_built_in_extensions_can_be_hidden() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        host.set_user_settings(r#"{ "snippets.viewer.showBuiltInExtensionSnippets": false }"#);

        let languages = host.loader().discover_languages().await;
        assert!(!language_ids(&languages).contains(&"markdown"));
        assert!(language_ids(&languages).contains(&"restructuredtext"));
    });
}

#[test]
fn test_expand_snippet_files_setting() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        host.set_user_settings(r#"{ "snippets.viewer.expandSnippetFiles": true }"#);

        let languages = host.loader().discover_languages().await;
        assert!(languages
            .iter()
            .flat_map(|language| language.snippet_files.iter())
            .all(|file| file.collapsible_state == CollapsibleState::Expanded));
    });
}

#[test]
fn test_extensions_without_location_or_array_contributions_are_skipped() {
    smol::block_on(async {
        let host = TestHost::new();
        host.extensions.insert(
            "nowhere.go",
            None,
            json!({ "contributes": { "snippets": [{ "language": "go", "path": "go.json" }] } }),
        );
        host.extensions.insert(
            "odd.lua",
            Some("/extensions/odd.lua"),
            json!({ "contributes": { "snippets": { "language": "lua", "path": "lua.json" } } }),
        );
        host.extensions
            .insert("plain.theme", Some("/extensions/plain.theme"), json!({}));

        let languages = host.loader().discover_languages().await;
        assert!(languages.is_empty());
        assert!(host.notifier.messages().is_empty());
    });
}

#[test]
fn test_languages_sorted_regardless_of_extension_order() {
    smol::block_on(async {
        let host = TestHost::new();
        for language in ["zig", "Elixir", "c", "CSS", "bash", "C"] {
            host.extensions.insert(
                &format!("ext.{language}"),
                Some(format!("/extensions/{language}").as_str()),
                json!({
                    "contributes": {
                        "snippets": [{ "language": language, "path": "snippets.json" }]
                    }
                }),
            );
        }

        let languages = host.loader().discover_languages().await;
        assert_eq!(
            language_ids(&languages),
            vec!["bash", "c", "C", "CSS", "Elixir", "zig"]
        );
    });
}

#[test]
fn test_missing_and_unreadable_directories() {
    smol::block_on(async {
        let host = TestHost::new();
        host.fs
            .insert_tree("/work/locked/.vscode", json!({ "go.json": "{}" }))
            .await;
        host.fs.set_unreadable("/work/locked/.vscode").await;
        let loader = host.loader();

        let files = loader
            .directory_snippet_files(Path::new("/nowhere/.vscode"), "/nowhere Snippets")
            .await;
        assert!(files.is_empty());
        assert!(host.notifier.messages().is_empty());

        let files = loader
            .directory_snippet_files(Path::new("/work/locked/.vscode"), "/locked Snippets")
            .await;
        assert!(files.is_empty());
        let messages = host.notifier.take_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Error reading directory: /work/locked/.vscode\n"));
    });
}

#[test]
fn test_unreadable_directory_does_not_abort_discovery() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        host.fs
            .insert_tree("/work/locked/.vscode", json!({ "go.json": "{}" }))
            .await;
        host.fs.set_unreadable("/work/locked/.vscode").await;
        host.add_folder("/work/locked");

        let languages = host.loader().discover_languages().await;
        assert!(language_ids(&languages).contains(&"python"));
        assert!(!language_ids(&languages).contains(&"go"));
        assert_eq!(host.notifier.messages().len(), 1);
    });
}

#[test]
fn test_parse_file() {
    smol::block_on(async {
        let host = TestHost::new();
        host.fs
            .insert_tree(
                "/snippets",
                json!({
                    "python.json": r#"{"foo": {"prefix": "fo", "body": ["bar"], "description": "d"}}"#,
                    "empty.json": "",
                    "broken.json": "{ \"foo\": { \"prefix\": ",
                }),
            )
            .await;
        let loader = host.loader();
        let files = loader
            .directory_snippet_files(Path::new("/snippets"), "User Snippets")
            .await;
        let file = |language: &str| {
            files
                .iter()
                .find(|file| file.language.as_ref() == language)
                .cloned()
                .map(Arc::new)
                .unwrap()
        };

        let snippets = loader.parse_file(&file("python")).await;
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].name, "foo");
        assert_eq!(snippets[0].prefix, Some(StringOrList::Single("fo".into())));
        assert_eq!(snippets[0].scope, vec![Arc::<str>::from("python")]);
        assert_eq!(snippets[0].description.as_deref(), Some("d"));
        assert_eq!(
            snippets[0].body,
            Some(StringOrList::List(vec!["bar".into()]))
        );
        assert_eq!(snippets[0].snippet_file, file("python"));

        assert!(loader.parse_file(&file("empty")).await.is_empty());
        assert!(host.notifier.messages().is_empty());

        assert!(loader.parse_file(&file("broken")).await.is_empty());
        let messages = host.notifier.take_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("JSON parsing of snippet file /snippets/broken.json failed"));
    });
}

#[test]
fn test_parse_file_read_failure() {
    smol::block_on(async {
        let host = TestHost::new();
        host.fs
            .insert_tree("/snippets", json!({ "go.json": "{}" }))
            .await;
        host.fs.set_unreadable("/snippets/go.json").await;
        let loader = host.loader();

        let files = loader
            .directory_snippet_files(Path::new("/snippets"), "User Snippets")
            .await;
        assert_eq!(files.len(), 1);
        let mut missing = files[0].clone();
        missing.path = PathBuf::from("/snippets/gone.json");

        assert!(loader.parse_file(&Arc::new(files[0].clone())).await.is_empty());
        assert!(loader.parse_file(&Arc::new(missing)).await.is_empty());
        let messages = host.notifier.take_messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Error reading file /snippets/go.json\n"));
        assert!(messages[1].starts_with("Error reading file /snippets/gone.json\n"));
    });
}

#[test]
fn test_user_only_filter() {
    smol::block_on(async {
        let host = TestHost::new();
        let content = r#"{ "log": { "prefix": "log", "body": "console.log($1)" } }"#;
        host.fs
            .insert_tree(
                "/Applications/Visual Studio Code.app/Contents/Resources/app/extensions/javascript/snippets",
                json!({ "javascript.code-snippets": content }),
            )
            .await;
        host.fs
            .insert_tree("/config/Code/User/snippets", json!({ "javascript.json": content }))
            .await;
        host.extensions.insert(
            "vscode.javascript",
            Some("/Applications/Visual Studio Code.app/Contents/Resources/app/extensions/javascript"),
            json!({
                "isBuiltin": true,
                "contributes": {
                    "snippets": [{ "language": "javascript", "path": "./snippets/javascript.code-snippets" }]
                }
            }),
        );
        let loader = host.loader();
        loader.discover_languages().await;
        let javascript = loader.index().language("javascript").cloned().unwrap();
        assert_eq!(javascript.snippet_files.len(), 2);

        assert_eq!(snippet_counts(&loader, &javascript).await, vec![1, 1]);

        host.set_user_settings(r#"{ "snippets.viewer.userOnly": true }"#);
        assert_eq!(snippet_counts(&loader, &javascript).await, vec![1, 0]);
        assert!(host.notifier.messages().is_empty());
    });
}

#[test]
fn test_snippets_for_language() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        host.fs
            .insert_file("/work/app/.vscode/python.code-snippets", "{ nope".into())
            .await;
        let loader = host.loader();
        loader.discover_languages().await;

        let python = loader.index().language("python").cloned().unwrap();
        let snippets = loader.snippets_for_language(&python).await;
        assert_eq!(
            snippets
                .iter()
                .map(|snippet| (snippet.name.as_str(), snippet.snippet_file.label.as_ref()))
                .collect::<Vec<_>>(),
            vec![("main", "Acme Python"), ("pr", "User Snippets")]
        );
        assert_eq!(host.notifier.messages().len(), 1);
    });
}

#[test]
fn test_snippet_files_for_extension() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        host.set_user_settings(r#"{ "snippets.viewer.skipLanguages": ["python"] }"#);
        let loader = host.loader();

        let files = loader.snippet_files_for_extension("acme.python");
        assert_eq!(
            files
                .iter()
                .map(|file| (file.label.as_ref(), file.language.as_ref()))
                .collect::<Vec<_>>(),
            vec![
                ("python", "python"),
                ("restructuredtext", "restructuredtext")
            ]
        );
        assert!(loader.snippet_files_for_extension("missing.ext").is_empty());
    });
}

#[test]
fn test_rescan_replaces_index_and_stale_scans_are_discarded() {
    smol::block_on(async {
        let host = TestHost::new();
        host.populate().await;
        let loader = host.loader();

        let stale = loader.scan().await;
        host.fs
            .insert_file("/config/Code/User/snippets/rust.json", "{}".into())
            .await;
        let fresh = loader.scan().await;
        assert!(fresh.generation > stale.generation);

        assert!(loader.install(fresh.clone()));
        assert!(!loader.install(stale));
        assert!(loader.index().language("rust").is_some());

        host.set_user_settings(r#"{ "snippets.viewer.skipLanguages": ["rust"] }"#);
        loader.discover_languages().await;
        assert!(loader.index().language("rust").is_none());
        assert!(loader.index().generation > fresh.generation);
    });
}
