use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Returns the user's home directory, falling back to the filesystem root
/// when it cannot be determined.
pub fn home_dir() -> &'static PathBuf {
    static HOME_DIR: OnceLock<PathBuf> = OnceLock::new();
    HOME_DIR.get_or_init(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")))
}

/// Lexically resolves `.` and `..` components without touching the
/// filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().cloned() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => {
                ret.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                ret.pop();
            }
            Component::Normal(c) => {
                ret.push(c);
            }
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/data/Code/User/globalStorage/ext/../../../User/snippets")),
            PathBuf::from("/data/Code/User/snippets")
        );
        assert_eq!(
            normalize_path(Path::new("/a/./b/c/..")),
            PathBuf::from("/a/b")
        );
    }
}
