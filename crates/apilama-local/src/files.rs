//! Markdown file store rooted at a base directory

use std::path::{Path, PathBuf};

use apilama_core::{Arguments, CapabilityKind, Operation, Payload};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::args;
use crate::error::{LocalError, LocalResult};
use crate::sandbox::{display_relative, metadata_if_exists, resolve};
use crate::service::LocalService;

/// One entry of a file listing
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the base directory
    pub path: String,
    pub size: u64,
    /// Seconds since the Unix epoch
    pub last_modified: f64,
}

/// File operations confined to `base_dir`
#[derive(Debug, Clone)]
pub struct FileService {
    base_dir: PathBuf,
    /// Only files with this extension are listed (`None` lists everything)
    extension: Option<String>,
}

impl FileService {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: None,
        }
    }

    /// Restrict listings to one extension (without the leading dot)
    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension.map(|e| e.trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// List files in `directory` (relative, defaults to the base directory)
    pub async fn list_files(&self, directory: Option<&str>) -> LocalResult<Vec<FileEntry>> {
        let dir = match directory {
            Some(d) if !d.is_empty() => resolve(&self.base_dir, d)?,
            _ => {
                // The store root is created on demand.
                tokio::fs::create_dir_all(&self.base_dir).await?;
                self.base_dir.clone()
            }
        };

        match metadata_if_exists(&dir).await? {
            None => {
                return Err(LocalError::NotFound(format!(
                    "Directory {}",
                    directory.unwrap_or(".")
                )))
            }
            Some(meta) if !meta.is_dir() => {
                return Err(LocalError::InvalidArgument(format!(
                    "{} is not a directory",
                    directory.unwrap_or(".")
                )))
            }
            Some(_) => {}
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            let meta = entry.metadata().await?;
            if !meta.is_file() || !self.matches_extension(&path) {
                continue;
            }

            let modified: DateTime<Utc> = meta.modified()?.into();
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: display_relative(&self.base_dir, &path),
                size: meta.len(),
                last_modified: modified.timestamp_millis() as f64 / 1000.0,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::info!(count = entries.len(), dir = %dir.display(), "Listed files");
        Ok(entries)
    }

    /// Read a file's content as UTF-8 text
    pub async fn read_file(&self, filename: &str) -> LocalResult<String> {
        let path = self.existing_file(filename).await?;
        let content = tokio::fs::read_to_string(&path).await?;
        tracing::info!(filename = %filename, "Read file");
        Ok(content)
    }

    /// Create or overwrite a file, creating parent directories as needed.
    /// Returns the number of bytes written.
    pub async fn write_file(&self, filename: &str, content: &str) -> LocalResult<u64> {
        let path = resolve(&self.base_dir, filename)?;
        if let Some(meta) = metadata_if_exists(&path).await? {
            if meta.is_dir() {
                return Err(LocalError::InvalidArgument(format!(
                    "{} is a directory",
                    filename
                )));
            }
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content.as_bytes()).await?;
        tracing::info!(filename = %filename, size = content.len(), "Saved file");
        Ok(content.len() as u64)
    }

    pub async fn delete_file(&self, filename: &str) -> LocalResult<()> {
        let path = self.existing_file(filename).await?;
        tokio::fs::remove_file(&path).await?;
        tracing::info!(filename = %filename, "Deleted file");
        Ok(())
    }

    async fn existing_file(&self, filename: &str) -> LocalResult<PathBuf> {
        let path = resolve(&self.base_dir, filename)?;
        match metadata_if_exists(&path).await? {
            None => Err(LocalError::NotFound(format!("File {}", filename))),
            Some(meta) if meta.is_dir() => Err(LocalError::InvalidArgument(format!(
                "{} is a directory",
                filename
            ))),
            Some(_) => Ok(path),
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        match &self.extension {
            None => true,
            Some(wanted) => path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                .unwrap_or(false),
        }
    }

    fn relative(&self, filename: &str) -> LocalResult<String> {
        let path = resolve(&self.base_dir, filename)?;
        Ok(display_relative(&self.base_dir, &path))
    }
}

#[async_trait]
impl LocalService for FileService {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Files
    }

    async fn self_test(&self) -> bool {
        match tokio::fs::create_dir_all(&self.base_dir).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    base_dir = %self.base_dir.display(),
                    error = %e,
                    "File store unusable"
                );
                false
            }
        }
    }

    async fn call(&self, operation: Operation, arguments: &Arguments) -> LocalResult<Payload> {
        let value = match operation {
            Operation::ListFiles => {
                let directory = args::optional_str(arguments, "directory")?;
                let files = self.list_files(directory).await?;
                json!({ "files": files })
            }
            Operation::ReadFile => {
                let filename = args::required_str(arguments, "filename")?;
                let content = self.read_file(filename).await?;
                json!({
                    "name": file_name(filename),
                    "path": self.relative(filename)?,
                    "content": content,
                })
            }
            Operation::CreateFile => {
                let filename = args::first_str(arguments, &["path", "filename"])?;
                let content = args::required_str(arguments, "content")?;
                let size = self.write_file(filename, content).await?;
                let path = self.relative(filename)?;
                json!({
                    "message": format!("File {} created/updated successfully", path),
                    "path": path,
                    "size": size,
                })
            }
            Operation::DeleteFile => {
                let filename = args::required_str(arguments, "filename")?;
                self.delete_file(filename).await?;
                let path = self.relative(filename)?;
                json!({
                    "message": format!("File {} deleted successfully", path),
                    "path": path,
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

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

pub(crate) fn into_payload(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        other => {
            let mut map = Payload::new();
            map.insert("result".to_string(), other);
            map
        }
    }
}
