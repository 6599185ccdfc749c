use anyhow::{anyhow, Result};
use futures::{Stream, StreamExt};
use smol::io::AsyncReadExt;
use std::{
    io,
    path::{Path, PathBuf},
    pin::Pin,
};

pub use util::paths::normalize_path;

#[cfg(any(test, feature = "test-support"))]
use futures::lock::Mutex;
#[cfg(any(test, feature = "test-support"))]
use std::collections::{btree_map, BTreeMap, HashSet};
#[cfg(any(test, feature = "test-support"))]
use std::sync::Arc;

pub type PathStream = Pin<Box<dyn Send + Stream<Item = Result<PathBuf>>>>;

#[async_trait::async_trait]
pub trait Fs: Send + Sync {
    async fn create_dir(&self, path: &Path) -> Result<()>;
    async fn load(&self, path: &Path) -> Result<String>;
    async fn is_file(&self, path: &Path) -> bool;
    async fn is_dir(&self, path: &Path) -> bool;
    /// Returns `None` when nothing exists at `path`, or when one of its
    /// ancestors is not a directory.
    async fn metadata(&self, path: &Path) -> Result<Option<Metadata>>;
    async fn read_dir(&self, path: &Path) -> Result<PathStream>;
}

#[derive(Clone, Debug)]
pub struct Metadata {
    pub is_dir: bool,
}

pub struct RealFs;

#[async_trait::async_trait]
impl Fs for RealFs {
    async fn create_dir(&self, path: &Path) -> Result<()> {
        Ok(smol::fs::create_dir_all(path).await?)
    }

    async fn load(&self, path: &Path) -> Result<String> {
        let mut file = smol::fs::File::open(path).await?;
        let mut text = String::new();
        file.read_to_string(&mut text).await?;
        Ok(text)
    }

    async fn is_file(&self, path: &Path) -> bool {
        smol::fs::metadata(path)
            .await
            .map_or(false, |metadata| metadata.is_file())
    }

    async fn is_dir(&self, path: &Path) -> bool {
        smol::fs::metadata(path)
            .await
            .map_or(false, |metadata| metadata.is_dir())
    }

    async fn metadata(&self, path: &Path) -> Result<Option<Metadata>> {
        match smol::fs::metadata(path).await {
            Ok(metadata) => Ok(Some(Metadata {
                is_dir: metadata.file_type().is_dir(),
            })),
            Err(err) => match (err.kind(), err.raw_os_error()) {
                (io::ErrorKind::NotFound, _) => Ok(None),
                (_, Some(libc::ENOTDIR)) => Ok(None),
                _ => Err(anyhow::Error::new(err)),
            },
        }
    }

    async fn read_dir(&self, path: &Path) -> Result<PathStream> {
        let result = smol::fs::read_dir(path).await?.map(|entry| match entry {
            Ok(entry) => Ok(entry.path()),
            Err(error) => Err(anyhow!("failed to read dir entry {:?}", error)),
        });
        Ok(Box::pin(result))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeFs {
    state: Mutex<FakeFsState>,
}

#[cfg(any(test, feature = "test-support"))]
struct FakeFsState {
    root: Arc<Mutex<FakeFsEntry>>,
    unreadable: HashSet<PathBuf>,
    read_count: usize,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Debug)]
enum FakeFsEntry {
    File {
        content: String,
    },
    Dir {
        entries: BTreeMap<String, Arc<Mutex<FakeFsEntry>>>,
    },
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFsState {
    async fn read_path(&self, target: &Path) -> Result<Arc<Mutex<FakeFsEntry>>> {
        self.try_read_path(target)
            .await
            .ok_or_else(|| anyhow!("path does not exist: {}", target.display()))
    }

    async fn try_read_path(&self, target: &Path) -> Option<Arc<Mutex<FakeFsEntry>>> {
        let mut entry_stack = vec![self.root.clone()];
        for component in target.components() {
            match component {
                std::path::Component::Prefix(_) => panic!("prefix paths aren't supported"),
                std::path::Component::RootDir => {
                    entry_stack.truncate(1);
                }
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    if entry_stack.len() > 1 {
                        entry_stack.pop();
                    }
                }
                std::path::Component::Normal(name) => {
                    let current_entry = entry_stack.last().cloned()?;
                    let current_entry = current_entry.lock().await;
                    if let FakeFsEntry::Dir { entries, .. } = &*current_entry {
                        let entry = entries.get(name.to_str()?).cloned()?;
                        entry_stack.push(entry);
                    } else {
                        return None;
                    }
                }
            }
        }
        entry_stack.pop()
    }

    async fn write_path<Fn, T>(&self, path: &Path, callback: Fn) -> Result<T>
    where
        Fn: FnOnce(btree_map::Entry<String, Arc<Mutex<FakeFsEntry>>>) -> Result<T>,
    {
        let path = normalize_path(path);
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("cannot overwrite the root"))?;
        let parent_path = path
            .parent()
            .ok_or_else(|| anyhow!("cannot overwrite the root"))?;

        let parent = self.read_path(parent_path).await?;
        let mut parent = parent.lock().await;
        let new_entry = parent.dir_entries(parent_path)?.entry(filename.into());
        callback(new_entry)
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        if self.unreadable.contains(path) {
            Err(anyhow::Error::new(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeFsState {
                root: Arc::new(Mutex::new(FakeFsEntry::Dir {
                    entries: Default::default(),
                })),
                unreadable: Default::default(),
                read_count: 0,
            }),
        })
    }

    pub async fn insert_file(&self, path: impl AsRef<Path>, content: String) {
        let state = self.state.lock().await;
        let path = path.as_ref();
        let file = Arc::new(Mutex::new(FakeFsEntry::File {
            content,
        }));
        state
            .write_path(path, move |entry| {
                match entry {
                    btree_map::Entry::Vacant(e) => {
                        e.insert(file);
                    }
                    btree_map::Entry::Occupied(mut e) => {
                        *e.get_mut() = file;
                    }
                }
                Ok(())
            })
            .await
            .unwrap();
    }

    /// Makes subsequent reads of `path` (file loads or directory listings)
    /// fail with a permission error, while the entry still exists.
    pub async fn set_unreadable(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().await;
        state.unreadable.insert(normalize_path(path.as_ref()));
    }

    /// The number of successful `load` calls served so far.
    pub async fn read_count(&self) -> usize {
        self.state.lock().await.read_count
    }

    #[must_use]
    pub fn insert_tree<'a>(
        &'a self,
        path: impl 'a + AsRef<Path> + Send,
        tree: serde_json::Value,
    ) -> futures::future::BoxFuture<'a, ()> {
        use futures::FutureExt as _;
        use serde_json::Value::*;

        async move {
            let path = path.as_ref();

            match tree {
                Object(map) => {
                    self.create_dir(path).await.unwrap();
                    for (name, contents) in map {
                        let mut path = PathBuf::from(path);
                        path.push(name);
                        self.insert_tree(&path, contents).await;
                    }
                }
                Null => {
                    self.create_dir(path).await.unwrap();
                }
                String(contents) => {
                    self.insert_file(&path, contents).await;
                }
                _ => {
                    panic!("JSON object must contain only objects, strings, or null");
                }
            }
        }
        .boxed()
    }

    pub async fn files(&self) -> Vec<PathBuf> {
        let mut result = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((PathBuf::from("/"), self.state.lock().await.root.clone()));
        while let Some((path, entry)) = queue.pop_front() {
            let e = entry.lock().await;
            match &*e {
                FakeFsEntry::File { .. } => result.push(path),
                FakeFsEntry::Dir { entries, .. } => {
                    for (name, entry) in entries {
                        queue.push_back((path.join(name), entry.clone()));
                    }
                }
            }
        }
        result
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFsEntry {
    fn file_content(&self, path: &Path) -> Result<&String> {
        if let Self::File { content, .. } = self {
            Ok(content)
        } else {
            Err(anyhow!("not a file: {}", path.display()))
        }
    }

    fn dir_entries(
        &mut self,
        path: &Path,
    ) -> Result<&mut BTreeMap<String, Arc<Mutex<FakeFsEntry>>>> {
        if let Self::Dir { entries, .. } = self {
            Ok(entries)
        } else {
            Err(anyhow!("not a directory: {}", path.display()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl Fs for FakeFs {
    async fn create_dir(&self, path: &Path) -> Result<()> {
        let state = self.state.lock().await;
        let mut created_dirs = Vec::new();
        let mut cur_path = PathBuf::new();
        for component in normalize_path(path).components() {
            cur_path.push(component);
            if cur_path == Path::new("/") {
                continue;
            }
            if state.try_read_path(&cur_path).await.is_none() {
                created_dirs.push(cur_path.clone());
            }
        }
        for dir in created_dirs {
            state
                .write_path(&dir, |entry| {
                    entry.or_insert(Arc::new(Mutex::new(FakeFsEntry::Dir {
                            entries: Default::default(),
                    })));
                    Ok(())
                })
                .await?;
        }
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<String> {
        let path = normalize_path(path);
        let mut state = self.state.lock().await;
        state.check_readable(&path)?;
        let entry = state.read_path(&path).await?;
        let entry = entry.lock().await;
        let content = entry.file_content(&path).cloned()?;
        state.read_count += 1;
        Ok(content)
    }

    async fn is_file(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        let state = self.state.lock().await;
        if let Some(entry) = state.try_read_path(&path).await {
            matches!(&*entry.lock().await, FakeFsEntry::File { .. })
        } else {
            false
        }
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.metadata(path)
            .await
            .is_ok_and(|metadata| metadata.is_some_and(|metadata| metadata.is_dir))
    }

    async fn metadata(&self, path: &Path) -> Result<Option<Metadata>> {
        let path = normalize_path(path);
        let state = self.state.lock().await;
        if let Some(entry) = state.try_read_path(&path).await {
            let entry = entry.lock().await;
            Ok(Some(Metadata {
                is_dir: matches!(&*entry, FakeFsEntry::Dir { .. }),
            }))
        } else {
            Ok(None)
        }
    }

    async fn read_dir(&self, path: &Path) -> Result<PathStream> {
        let path = normalize_path(path);
        let state = self.state.lock().await;
        state.check_readable(&path)?;
        let entry = state.read_path(&path).await?;
        let mut entry = entry.lock().await;
        let children = entry.dir_entries(&path)?;
        let paths = children
            .keys()
            .map(|file_name| Ok(path.join(file_name)))
            .collect::<Vec<_>>();
        Ok(Box::pin(futures::stream::iter(paths)))
    }
}
