// labforge-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::infrastructure::config::settings::LabforgeConfig;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["labforge.yaml", "labforge.yml"];

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_config(project_dir: &Path) -> Result<LabforgeConfig, InfrastructureError> {
    // 1. Discovery
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading labforge configuration");

    // 2. YAML
    let mut config = parse_config(&config_path)?;

    // 3. Layering: environment wins over the file
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    // 4. Fail fast on nonsense values
    config.validate()?;

    Ok(config)
}

/// Like [`load_config`], but a project without a config file yields defaults
/// (still layered with the environment).
pub fn load_optional_config(project_dir: &Path) -> Result<LabforgeConfig, InfrastructureError> {
    match load_config(project_dir) {
        Err(InfrastructureError::ConfigNotFound(_)) => {
            let mut config = LabforgeConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            config.validate()?;
            Ok(config)
        }
        other => other,
    }
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "{} (checked {:?})",
        root.display(),
        CONFIG_CANDIDATES
    )))
}

fn parse_config(path: &Path) -> Result<LabforgeConfig, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    // An empty file is a valid, all-defaults config
    if content.trim().is_empty() {
        return Ok(LabforgeConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Applies `LABFORGE_*` and `DATABRICKS_HOST` overrides. `lookup` stands in for
/// `std::env::var` so callers and tests control the source.
pub fn apply_env_overrides<F>(config: &mut LabforgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let ws = &mut config.workspace;
    for (key, slot) in [
        ("LABFORGE_LAB_ID", &mut ws.lab_id),
        ("LABFORGE_DESCRIPTION", &mut ws.description),
        ("LABFORGE_WORKSPACE_NAME", &mut ws.workspace_name),
        ("LABFORGE_ORG_ID", &mut ws.org_id),
    ] {
        if let Some(val) = lookup(key) {
            info!(key, "Overriding workspace value via ENV");
            *slot = Some(val);
        }
    }

    if let Some(val) = lookup("LABFORGE_SMOKE_TEST") {
        let flag = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        info!(old = ws.smoke_test, new = flag, "Overriding smoke-test flag via ENV");
        ws.smoke_test = flag;
    }

    if let Some(val) = lookup("DATABRICKS_HOST") {
        info!(old = ?config.connection.host, new = ?val, "Overriding host via ENV");
        config.connection.host = Some(val);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::policy::PolicyArchetype;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
workspace:
  lab_id: "Lab 101"
  description: "Data Engineering with Databricks"
  workspace_name: ws-101
  org_id: "998877"
connection:
  host: https://ws-101.cloud.databricks.com
pool:
  min_idle_instances: 2
  node_type_id: i3.xlarge
policies:
  spark_version: 13.3.x-scala2.12
  archetypes: [all-purpose, dlt]
"#;

    fn write_config(name: &str, content: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(name), content).unwrap();
        dir
    }

    #[test]
    fn test_load_full_config() -> anyhow::Result<()> {
        let dir = write_config("labforge.yaml", SAMPLE);
        let config = load_config(dir.path())?;

        assert_eq!(config.workspace.lab_id.as_deref(), Some("Lab 101"));
        assert_eq!(config.pool.name, "DBAcademy");
        assert_eq!(config.pool.min_idle_instances, 2);
        assert_eq!(config.pool.idle_instance_autotermination_minutes, 15);
        assert_eq!(config.connection.token_env, "DATABRICKS_TOKEN");
        assert_eq!(
            config.policies.archetypes,
            vec![PolicyArchetype::AllPurpose, PolicyArchetype::DltOnly]
        );
        Ok(())
    }

    #[test]
    fn test_yml_extension_is_found() -> anyhow::Result<()> {
        let dir = write_config("labforge.yml", "pool:\n  name: Custom\n");
        let config = load_config(dir.path())?;
        assert_eq!(config.pool.name, "Custom");
        assert_eq!(config.policies.archetypes.len(), 3);
        Ok(())
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let dir = write_config("labforge.yaml", "pool: [unclosed");
        assert!(matches!(
            load_config(dir.path()),
            Err(InfrastructureError::YamlError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let dir = write_config("labforge.yaml", "connection:\n  timeout_secs: 0\n");
        assert!(matches!(
            load_config(dir.path()),
            Err(InfrastructureError::Validation(_))
        ));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config: LabforgeConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("LABFORGE_LAB_ID", "lab-from-env"),
            ("LABFORGE_SMOKE_TEST", "TRUE"),
            ("DATABRICKS_HOST", "https://other.example.com"),
        ]);

        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.workspace.lab_id.as_deref(), Some("lab-from-env"));
        assert_eq!(config.workspace.org_id.as_deref(), Some("998877"));
        assert!(config.workspace.smoke_test);
        assert_eq!(config.connection.host.as_deref(), Some("https://other.example.com"));
    }

    #[test]
    fn test_token_lookup() {
        let config = LabforgeConfig::default();
        let token = config
            .connection
            .token_from(|k| (k == "DATABRICKS_TOKEN").then(|| "dapi123".to_string()));
        assert_eq!(token.unwrap(), "dapi123");

        let missing = config.connection.token_from(|_| None);
        assert!(matches!(missing, Err(InfrastructureError::MissingCredentials(v)) if v == "DATABRICKS_TOKEN"));
    }
}
