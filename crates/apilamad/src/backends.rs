//! Builds the dispatcher from configuration

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use apilama_core::{BackendDescriptor, CapabilityAdapter, CapabilityKind};
use apilama_gateway::{AvailabilityMonitor, Dispatcher};
use apilama_local::{DirectoryService, FileService, InProcessAdapter, LocalService, ShellService};
use apilama_proxy::RemoteProxyAdapter;

use crate::config::{CapabilityConfig, Config, ModeConfig};

/// Create a dispatcher with one adapter per configured capability
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let monitor = AvailabilityMonitor::new(
        config.availability.ttl(),
        config.availability.probe_timeout(),
    );
    let mut dispatcher = Dispatcher::new(monitor);

    for (name, cap) in &config.capabilities {
        let (descriptor, adapter) = build_backend(name, cap, config)
            .with_context(|| format!("Invalid configuration for capability '{}'", name))?;
        dispatcher.register(descriptor, adapter);
    }

    Ok(dispatcher)
}

fn build_backend(
    name: &str,
    cap: &CapabilityConfig,
    config: &Config,
) -> Result<(BackendDescriptor, Arc<dyn CapabilityAdapter>)> {
    let kind = cap.resolve_kind(name)?;

    match cap.mode {
        ModeConfig::InProcess => {
            let descriptor = BackendDescriptor::in_process(name, kind);
            let adapter = InProcessAdapter::new(name, local_service(kind, cap));
            Ok((descriptor, Arc::new(adapter)))
        }
        ModeConfig::RemoteHttp => {
            let endpoint = cap.endpoint.as_deref().unwrap_or_default();
            let mut descriptor = BackendDescriptor::remote(name, kind, endpoint)?;
            if let Some(timeout) = cap.timeout() {
                descriptor = descriptor.with_operation_timeout(timeout);
            }
            let adapter = RemoteProxyAdapter::new(&descriptor)?
                .with_probe_timeout(config.availability.probe_timeout());
            tracing::info!(capability = %name, endpoint = %endpoint, "Using remote backend");
            Ok((descriptor, Arc::new(adapter)))
        }
    }
}

fn local_service(kind: CapabilityKind, cap: &CapabilityConfig) -> Arc<dyn LocalService> {
    match kind {
        CapabilityKind::Files => {
            let base = cap.base_dir.clone().unwrap_or_else(|| PathBuf::from("./markdown"));
            Arc::new(FileService::new(base).with_extension(cap.extension.clone()))
        }
        CapabilityKind::Dirs => {
            let base = cap.base_dir.clone().unwrap_or_else(|| PathBuf::from("./markdown"));
            Arc::new(DirectoryService::new(base))
        }
        CapabilityKind::Shell => {
            let work_dir = cap.base_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            let mut shell = ShellService::new(work_dir);
            if let Some(timeout) = cap.timeout() {
                shell = shell.with_default_timeout(timeout);
            }
            Arc::new(shell)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds_three_local_capabilities() {
        let dispatcher = build_dispatcher(&Config::default()).unwrap();
        assert_eq!(dispatcher.capability_names(), vec!["dirs", "files", "shell"]);
        assert!(dispatcher
            .descriptors()
            .all(|d| d.mode_name() == "in_process"));
    }

    #[test]
    fn test_remote_capability_uses_endpoint_and_timeout() {
        let mut config = Config::default();
        let shell = config.capabilities.get_mut("shell").unwrap();
        shell.mode = ModeConfig::RemoteHttp;
        shell.endpoint = Some("http://127.0.0.1:8002".to_string());
        shell.timeout_secs = Some(300);

        let dispatcher = build_dispatcher(&config).unwrap();
        let descriptor = dispatcher.descriptor("shell").unwrap();
        assert_eq!(descriptor.mode_name(), "remote_http");
        assert_eq!(descriptor.endpoint().unwrap().as_str(), "http://127.0.0.1:8002/");
        assert_eq!(descriptor.operation_timeout().as_secs(), 300);
    }

    #[test]
    fn test_remote_without_endpoint_is_an_error() {
        let mut config = Config::default();
        config.capabilities.get_mut("files").unwrap().mode = ModeConfig::RemoteHttp;
        let err = build_dispatcher(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("files"));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let mut config = Config::default();
        config
            .capabilities
            .insert("archive".to_string(), CapabilityConfig::default());
        assert!(build_dispatcher(&config).is_err());
    }
}
