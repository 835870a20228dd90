//! Path resolution relative to a service's base directory

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

use crate::error::{LocalError, LocalResult};

/// Resolve `relative` inside `base`.
///
/// Absolute paths and `..` components are rejected so callers can never
/// address anything outside the base directory.
pub(crate) fn resolve(base: &Path, relative: &str) -> LocalResult<PathBuf> {
    let candidate = Path::new(relative);
    let mut resolved = base.to_path_buf();

    for component in candidate.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(LocalError::InvalidArgument(format!(
                    "Path '{}' must not contain '..'",
                    relative
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(LocalError::InvalidArgument(format!(
                    "Path '{}' must be relative to the base directory",
                    relative
                )))
            }
        }
    }

    Ok(resolved)
}

/// Metadata for `path`, or `None` when it does not exist
pub(crate) async fn metadata_if_exists(path: &Path) -> LocalResult<Option<Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Display form of `path` relative to `base`, using `/` separators
pub(crate) fn display_relative(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        let base = Path::new("/srv/md");
        assert_eq!(
            resolve(base, "notes/a.md").unwrap(),
            PathBuf::from("/srv/md/notes/a.md")
        );
        assert_eq!(resolve(base, "./a.md").unwrap(), PathBuf::from("/srv/md/a.md"));
        assert_eq!(resolve(base, ".").unwrap(), PathBuf::from("/srv/md"));
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let base = Path::new("/srv/md");
        assert!(resolve(base, "../etc/passwd").is_err());
        assert!(resolve(base, "notes/../../x").is_err());
        assert!(resolve(base, "/tmp").is_err());
    }

    #[test]
    fn test_display_relative() {
        let base = Path::new("/srv/md");
        assert_eq!(display_relative(base, Path::new("/srv/md/a/b.md")), "a/b.md");
        assert_eq!(display_relative(base, Path::new("/srv/md")), ".");
    }
}
