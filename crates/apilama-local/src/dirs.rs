//! Directory operations rooted at a base directory

use std::path::PathBuf;

use apilama_core::{Arguments, CapabilityKind, Operation, Payload};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::args;
use crate::error::{LocalError, LocalResult};
use crate::files::into_payload;
use crate::sandbox::{display_relative, metadata_if_exists, resolve};
use crate::service::LocalService;

/// One entry of a directory listing
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct DirectoryService {
    base_dir: PathBuf,
}

impl DirectoryService {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub async fn list_directory(&self, path: &str) -> LocalResult<Vec<DirectoryEntry>> {
        let dir = resolve(&self.base_dir, path)?;
        match metadata_if_exists(&dir).await? {
            None => return Err(LocalError::NotFound(format!("Directory {}", path))),
            Some(meta) if !meta.is_dir() => {
                return Err(LocalError::InvalidArgument(format!(
                    "{} is not a directory",
                    path
                )))
            }
            Some(_) => {}
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let meta = entry.metadata().await?;
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: display_relative(&self.base_dir, &entry.path()),
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Create `path` and any missing parents. Existing directories are fine.
    pub async fn create_directory(&self, path: &str) -> LocalResult<String> {
        let dir = resolve(&self.base_dir, path)?;
        if let Some(meta) = metadata_if_exists(&dir).await? {
            if !meta.is_dir() {
                return Err(LocalError::InvalidArgument(format!(
                    "{} exists and is not a directory",
                    path
                )));
            }
        }

        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(path = %path, "Created directory");
        Ok(display_relative(&self.base_dir, &dir))
    }
}

#[async_trait]
impl LocalService for DirectoryService {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Dirs
    }

    async fn self_test(&self) -> bool {
        tokio::fs::create_dir_all(&self.base_dir).await.is_ok()
    }

    async fn call(&self, operation: Operation, arguments: &Arguments) -> LocalResult<Payload> {
        let value = match operation {
            Operation::ListDirectory => {
                let path = args::optional_str(arguments, "path")?
                    .filter(|p| !p.is_empty())
                    .unwrap_or(".");
                let entries = self.list_directory(path).await?;
                json!({
                    "path": display_relative(&self.base_dir, &resolve(&self.base_dir, path)?),
                    "entries": entries,
                })
            }
            Operation::CreateDirectory => {
                let path = args::required_str(arguments, "path")?;
                let created = self.create_directory(path).await?;
                json!({
                    "message": format!("Directory {} created successfully", created),
                    "path": created,
                })
            }
            other => {
                return Err(LocalError::Unsupported {
                    capability: self.kind().to_string(),
                    operation: other.to_string(),
                })
            }
        };

        Ok(into_payload(value))
    }
}
