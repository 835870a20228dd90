//! Configuration file handling for apilamad
//!
//! Precedence, lowest to highest: built-in defaults, TOML file,
//! environment (including a `.env` file), command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use apilama_core::CapabilityKind;
use serde::Deserialize;

const DEFAULT_MARKDOWN_DIR: &str = "./markdown";
const DEFAULT_EXTENSION: &str = "md";

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub availability: AvailabilityConfig,
    pub capabilities: BTreeMap<String, CapabilityConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Reported by `GET /health`
    pub name: String,
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    pub ttl_secs: u64,
    pub probe_timeout_ms: u64,
}

/// How a capability is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeConfig {
    #[default]
    InProcess,
    RemoteHttp,
}

/// One `[capabilities.<name>]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Defaults to the table key
    pub kind: Option<CapabilityKind>,
    pub mode: ModeConfig,
    /// Root for file-backed capabilities, working directory for shell
    pub base_dir: Option<PathBuf>,
    /// Listing filter for `files`
    pub extension: Option<String>,
    /// Required for `remote_http`
    pub endpoint: Option<String>,
    /// Per-operation timeout (remote), default command timeout (shell)
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            availability: AvailabilityConfig::default(),
            capabilities: default_capabilities(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "apilama".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            debug: false,
        }
    }
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30,
            probe_timeout_ms: 2000,
        }
    }
}

fn default_capabilities() -> BTreeMap<String, CapabilityConfig> {
    let markdown = || CapabilityConfig {
        base_dir: Some(PathBuf::from(DEFAULT_MARKDOWN_DIR)),
        ..Default::default()
    };

    let mut caps = BTreeMap::new();
    caps.insert(
        "files".to_string(),
        CapabilityConfig {
            extension: Some(DEFAULT_EXTENSION.to_string()),
            ..markdown()
        },
    );
    caps.insert("dirs".to_string(), markdown());
    caps.insert("shell".to_string(), CapabilityConfig::default());
    caps
}

impl CapabilityConfig {
    /// Kind of capability `name`, from the table or the key itself
    pub fn resolve_kind(&self, name: &str) -> Result<CapabilityKind> {
        match self.kind {
            Some(kind) => Ok(kind),
            None => name.parse::<CapabilityKind>().map_err(|_| {
                anyhow::anyhow!(
                    "Capability '{}' needs a 'kind' (one of files, dirs, shell)",
                    name
                )
            }),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AvailabilityConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Config {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if given, otherwise start from defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("MARKDOWN_DIR") {
            for (name, cap) in self.capabilities.iter_mut() {
                if matches!(
                    cap.resolve_kind(name),
                    Ok(CapabilityKind::Files | CapabilityKind::Dirs)
                ) {
                    cap.base_dir = Some(PathBuf::from(&dir));
                }
            }
        }

        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: '{}'", port))?;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = parse_flag(&debug);
        }

        for (name, cap) in self.capabilities.iter_mut() {
            if let Some(url) = lookup(&endpoint_var(name)) {
                cap.mode = ModeConfig::RemoteHttp;
                cap.endpoint = Some(url);
            }
        }

        Ok(())
    }

    /// Merge command-line arguments over file and environment values
    pub fn merge_with_args(&mut self, host: Option<&str>, port: Option<u16>, debug: bool) {
        if let Some(host) = host {
            self.server.host = host.to_string();
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self.server.debug |= debug;
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `APILAMA_<NAME>_URL` for capability `name`
pub fn endpoint_var(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("APILAMA_{}_URL", upper)
}

/// Load a `.env` file into the process environment.
///
/// Without `path`, `.env` is looked up from the current directory upwards
/// and a missing file yields `None`. Variables already set are kept.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e).context("Failed to load .env"),
        },
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "127.0.0.1:8000");
        assert_eq!(config.availability.ttl(), Duration::from_secs(30));
        assert_eq!(
            config.capabilities.keys().collect::<Vec<_>>(),
            vec!["dirs", "files", "shell"]
        );
        let files = &config.capabilities["files"];
        assert_eq!(files.mode, ModeConfig::InProcess);
        assert_eq!(files.extension.as_deref(), Some("md"));
        assert_eq!(files.base_dir.as_deref(), Some(Path::new("./markdown")));
        assert!(config.capabilities["shell"].base_dir.is_none());
        assert!(!config.server.debug);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
name = "edge"
port = 9000

[availability]
ttl_secs = 5

[capabilities.notes]
kind = "files"
base_dir = "/srv/notes"

[capabilities.shell]
mode = "remote_http"
endpoint = "http://127.0.0.1:8002"
timeout_secs = 300
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.name, "edge");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.availability.probe_timeout(), Duration::from_millis(2000));

        let notes = &config.capabilities["notes"];
        assert_eq!(notes.resolve_kind("notes").unwrap(), CapabilityKind::Files);

        let shell = &config.capabilities["shell"];
        assert_eq!(shell.mode, ModeConfig::RemoteHttp);
        assert_eq!(shell.timeout(), Some(Duration::from_secs(300)));
        assert!(!config.capabilities.contains_key("files"));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let cap = CapabilityConfig::default();
        assert!(cap.resolve_kind("archive").is_err());
        assert!(toml::from_str::<Config>("[capabilities.x]\nkind = \"bogus\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_from(lookup(&[
                ("MARKDOWN_DIR", "/data/md"),
                ("HOST", "0.0.0.0"),
                ("PORT", "8100"),
                ("DEBUG", "T"),
                ("APILAMA_SHELL_URL", "http://shell:8002"),
            ]))
            .unwrap();

        assert_eq!(config.listen_addr(), "0.0.0.0:8100");
        assert!(config.server.debug);
        assert_eq!(
            config.capabilities["dirs"].base_dir.as_deref(),
            Some(Path::new("/data/md"))
        );
        assert!(config.capabilities["shell"].base_dir.is_none());
        assert_eq!(config.capabilities["shell"].mode, ModeConfig::RemoteHttp);
        assert_eq!(
            config.capabilities["shell"].endpoint.as_deref(),
            Some("http://shell:8002")
        );
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let mut config = Config::default();
        assert!(config.apply_env_from(lookup(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_cli_wins_over_env() {
        let mut config = Config::default();
        config.apply_env_from(lookup(&[("PORT", "8100")])).unwrap();
        config.merge_with_args(Some("localhost"), Some(9999), false);
        assert_eq!(config.listen_addr(), "localhost:9999");
        assert!(!config.server.debug);
    }

    #[test]
    fn test_endpoint_var_name() {
        assert_eq!(endpoint_var("files"), "APILAMA_FILES_URL");
        assert_eq!(endpoint_var("my-notes"), "APILAMA_MY_NOTES_URL");
    }

    #[test]
    fn test_parse_flag() {
        for v in ["true", "1", "t", "TRUE"] {
            assert!(parse_flag(v), "{}", v);
        }
        for v in ["false", "0", "yes", ""] {
            assert!(!parse_flag(v), "{}", v);
        }
    }

    #[test]
    #[serial]
    fn test_apply_env_reads_process_environment() {
        std::env::set_var("APILAMA_FILES_URL", "http://files:8001");
        let mut config = Config::default();
        let result = config.apply_env();
        std::env::remove_var("APILAMA_FILES_URL");

        result.unwrap();
        assert_eq!(config.capabilities["files"].mode, ModeConfig::RemoteHttp);
    }

    #[test]
    #[serial]
    fn test_dotenv_file_feeds_environment_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "APILAMA_SHELL_URL=http://shell:8003\nMARKDOWN_DIR=/srv/notes\nPORT=9100\n",
        )
        .unwrap();
        // Already-set variables take precedence over the file
        std::env::set_var("PORT", "9200");

        let loaded = load_dotenv(Some(&path));
        let mut config = Config::default();
        let applied = config.apply_env();
        for key in ["APILAMA_SHELL_URL", "MARKDOWN_DIR", "PORT"] {
            std::env::remove_var(key);
        }

        assert_eq!(loaded.unwrap(), Some(path));
        applied.unwrap();
        assert_eq!(config.capabilities["shell"].mode, ModeConfig::RemoteHttp);
        assert_eq!(
            config.capabilities["files"].base_dir.as_deref(),
            Some(Path::new("/srv/notes"))
        );
        assert_eq!(config.server.port, 9200);
    }

    #[test]
    fn test_missing_explicit_dotenv_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dotenv(Some(&dir.path().join("absent.env"))).is_err());
    }
}
