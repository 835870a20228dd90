//! Operation catalog
//!
//! Every operation the gateway can dispatch is listed here together with
//! the capability kind that owns it, the arguments it requires and the
//! HTTP route it is served on. The same route table is used by the gateway
//! router and by the remote adapter when forwarding to another backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation arguments, keyed by parameter name
pub type Arguments = serde_json::Map<String, Value>;

/// Kind of backend functionality a capability provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Markdown file store
    Files,
    /// Directory listing and creation
    Dirs,
    /// Shell command execution
    Shell,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] =
        [CapabilityKind::Files, CapabilityKind::Dirs, CapabilityKind::Shell];

    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityKind::Files => "files",
            CapabilityKind::Dirs => "dirs",
            CapabilityKind::Shell => "shell",
        }
    }

    /// Operations offered by this kind
    pub fn operations(self) -> &'static [Operation] {
        match self {
            CapabilityKind::Files => &[
                Operation::ListFiles,
                Operation::ReadFile,
                Operation::CreateFile,
                Operation::DeleteFile,
            ],
            CapabilityKind::Dirs => &[Operation::ListDirectory, Operation::CreateDirectory],
            CapabilityKind::Shell => &[Operation::ExecuteCommand],
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(CapabilityKind::Files),
            "dirs" => Ok(CapabilityKind::Dirs),
            "shell" => Ok(CapabilityKind::Shell),
            _ => Err(format!("Unknown capability kind: '{}'", s)),
        }
    }
}

/// A logical operation against a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListFiles,
    ReadFile,
    CreateFile,
    DeleteFile,
    ListDirectory,
    CreateDirectory,
    ExecuteCommand,
}

/// HTTP method of an operation route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// Where an operation route carries its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
    Query,
    JsonBody,
}

/// Method/path convention for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRoute {
    pub method: HttpMethod,
    pub path: &'static str,
    pub arguments: ArgumentSource,
}

impl OperationRoute {
    const fn new(method: HttpMethod, path: &'static str, arguments: ArgumentSource) -> Self {
        Self {
            method,
            path,
            arguments,
        }
    }
}

/// Arguments that may legitimately be an empty string
const EMPTY_ALLOWED: &[&str] = &["content"];

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ListFiles => "list_files",
            Operation::ReadFile => "read_file",
            Operation::CreateFile => "create_file",
            Operation::DeleteFile => "delete_file",
            Operation::ListDirectory => "list_directory",
            Operation::CreateDirectory => "create_directory",
            Operation::ExecuteCommand => "execute_command",
        }
    }

    /// Capability kind that owns this operation
    pub fn kind(self) -> CapabilityKind {
        match self {
            Operation::ListFiles
            | Operation::ReadFile
            | Operation::CreateFile
            | Operation::DeleteFile => CapabilityKind::Files,
            Operation::ListDirectory | Operation::CreateDirectory => CapabilityKind::Dirs,
            Operation::ExecuteCommand => CapabilityKind::Shell,
        }
    }

    /// Required arguments, as groups of alternatives.
    ///
    /// Each inner slice is satisfied when any one of its names is present.
    pub fn required_arguments(self) -> &'static [&'static [&'static str]] {
        match self {
            Operation::ListFiles | Operation::ListDirectory => &[],
            Operation::ReadFile | Operation::DeleteFile => &[&["filename"]],
            Operation::CreateFile => &[&["path", "filename"], &["content"]],
            Operation::CreateDirectory => &[&["path"]],
            Operation::ExecuteCommand => &[&["command"]],
        }
    }

    /// Returns a description of the first missing required argument, if any
    pub fn missing_argument(self, arguments: &Arguments) -> Option<String> {
        self.required_arguments()
            .iter()
            .find(|group| !group.iter().any(|name| is_present(name, arguments)))
            .map(|group| group.join(" or "))
    }

    /// HTTP route serving this operation
    pub fn route(self) -> OperationRoute {
        use ArgumentSource::{JsonBody, Query};
        use HttpMethod::{Delete, Get, Post};

        match self {
            Operation::ListFiles => OperationRoute::new(Get, "/api/files", Query),
            Operation::ReadFile => OperationRoute::new(Get, "/api/file", Query),
            Operation::CreateFile => OperationRoute::new(Post, "/api/file", JsonBody),
            Operation::DeleteFile => OperationRoute::new(Delete, "/api/file", Query),
            Operation::ListDirectory => OperationRoute::new(Get, "/api/directories", Query),
            Operation::CreateDirectory => OperationRoute::new(Post, "/api/directory", JsonBody),
            Operation::ExecuteCommand => OperationRoute::new(Post, "/api/shell/execute", JsonBody),
        }
    }
}

fn is_present(name: &str, arguments: &Arguments) -> bool {
    match arguments.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty() || EMPTY_ALLOWED.contains(&name),
        Some(_) => true,
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list_files" => Ok(Operation::ListFiles),
            "read_file" => Ok(Operation::ReadFile),
            "create_file" => Ok(Operation::CreateFile),
            "delete_file" => Ok(Operation::DeleteFile),
            "list_directory" => Ok(Operation::ListDirectory),
            "create_directory" => Ok(Operation::CreateDirectory),
            "execute_command" => Ok(Operation::ExecuteCommand),
            _ => Err(format!("Unknown operation: '{}'", s)),
        }
    }
}

/// A single inbound call, constructed per request
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub capability: String,
    pub operation: String,
    pub arguments: Arguments,
}

impl OperationRequest {
    pub fn new(
        capability: impl Into<String>,
        operation: impl Into<String>,
        arguments: Arguments,
    ) -> Self {
        Self {
            capability: capability.into(),
            operation: operation.into(),
            arguments,
        }
    }
}
