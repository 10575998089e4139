// labforge/src/commands/mod.rs

pub mod definition;
pub mod policy;
pub mod pool;
pub mod setup;

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use labforge_core::application::ClustersProvisioner;
use labforge_core::infrastructure::adapters::{DatabricksClient, InMemoryWorkspace};
use labforge_core::infrastructure::config::{LabforgeConfig, load_optional_config};
use labforge_core::infrastructure::display::ConsoleDisplay;
use labforge_core::ports::workspace::WorkspaceApi;

/// Loads `labforge.yaml` (defaults when absent) layered with the environment.
pub fn load(project_dir: &Path) -> anyhow::Result<LabforgeConfig> {
    load_optional_config(project_dir)
        .with_context(|| format!("Failed to load configuration from {}", project_dir.display()))
}

/// Wires the provisioner: the REST client, or an in-memory workspace on
/// `--dry-run`.
pub fn provisioner(config: &LabforgeConfig, dry_run: bool) -> anyhow::Result<ClustersProvisioner> {
    if dry_run {
        println!("🧪 Dry run: using an in-memory workspace");
        return Ok(provisioner_offline(config));
    }

    let connection = &config.connection;
    let host = connection.require_host()?;
    let token = connection
        .token_from(|key| std::env::var(key).ok())
        .context("No API token available")?;
    println!("🌐 Workspace: {}", host);
    debug!(timeout = ?connection.timeout(), token_env = %connection.token_env, "REST client configured");

    let api: Arc<dyn WorkspaceApi> = Arc::new(DatabricksClient::new(host, token, connection.timeout())?);
    Ok(ClustersProvisioner::new(
        api,
        Arc::new(ConsoleDisplay),
        config.workspace.context(),
    ))
}

pub fn provisioner_offline(config: &LabforgeConfig) -> ClustersProvisioner {
    ClustersProvisioner::new(
        Arc::new(InMemoryWorkspace::new()),
        Arc::new(ConsoleDisplay),
        config.workspace.context(),
    )
}
