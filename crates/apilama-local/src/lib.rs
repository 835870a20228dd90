//! apilama-local - In-process capability services
//!
//! Concrete implementations of the capabilities the gateway can serve
//! without a network hop, plus [`InProcessAdapter`] which exposes any of
//! them through the [`CapabilityAdapter`](apilama_core::CapabilityAdapter)
//! trait.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use apilama_local::{FileService, InProcessAdapter};
//!
//! let files = FileService::new("./markdown").with_extension(Some("md".into()));
//! let adapter = InProcessAdapter::new("files", Arc::new(files));
//! ```

mod adapter;
mod args;
mod dirs;
mod error;
mod files;
mod sandbox;
mod service;
mod shell;

pub use adapter::InProcessAdapter;
pub use dirs::DirectoryService;
pub use error::{LocalError, LocalResult};
pub use files::FileService;
pub use service::LocalService;
pub use shell::{ShellService, DEFAULT_COMMAND_TIMEOUT};
