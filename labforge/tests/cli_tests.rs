use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const LAB_CONFIG: &str = r#"
workspace:
  lab_id: "Lab 42"
  description: "Data Engineering"
  workspace_name: "ws-training-01"
  org_id: "1234567890"
pool:
  min_idle_instances: 1
policies:
  spark_version: "13.3.x-scala2.12"
"#;

/// A throwaway project directory holding a `labforge.yaml`.
struct LabforgeTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl LabforgeTestEnv {
    fn new(config: &str) -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().to_path_buf();
        std::fs::write(root.join("labforge.yaml"), config).context("write labforge.yaml")?;
        Ok(Self { _tmp: tmp, root })
    }

    fn labforge(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("labforge"));
        cmd.current_dir(&self.root);
        // Keep the caller's environment out of the layering
        for key in [
            "LABFORGE_LAB_ID",
            "LABFORGE_DESCRIPTION",
            "LABFORGE_WORKSPACE_NAME",
            "LABFORGE_ORG_ID",
            "LABFORGE_SMOKE_TEST",
            "DATABRICKS_HOST",
            "DATABRICKS_TOKEN",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    fn definition_json(&self, args: &[&str]) -> Result<serde_json::Value> {
        let output = self.labforge().arg("definition").args(args).output()?;
        assert!(output.status.success(), "definition failed: {:?}", output);
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[test]
fn test_definition_prints_normalized_all_purpose_policy() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    let json = env.definition_json(&["all-purpose", "--instance-pool-id", "pool-1"])?;

    assert_eq!(json["cluster_type"]["type"], "fixed");
    assert_eq!(json["cluster_type"]["value"], "all-purpose");
    assert_eq!(json["instance_pool_id"]["value"], "pool-1");
    assert_eq!(
        json["spark_conf.spark.databricks.cluster.profile"]["value"],
        "singleNode"
    );
    assert_eq!(json["spark_version"]["defaultValue"], "13.3.x-scala2.12");
    assert_eq!(json["spark_version"]["isOptional"], true);
    assert_eq!(json["autotermination_minutes"]["maxValue"], 180);
    Ok(())
}

#[test]
fn test_definition_flag_overrides_config_spark_version() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    let json = env.definition_json(&["jobs", "--spark-version", "14.3.x"])?;

    assert_eq!(json["cluster_type"]["value"], "job");
    assert_eq!(json["spark_version"]["defaultValue"], "14.3.x");
    assert!(json.get("instance_pool_id").is_none());
    Ok(())
}

#[test]
fn test_definition_dlt_smoke_test_source() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    let output = env
        .labforge()
        .env("LABFORGE_SMOKE_TEST", "true")
        .args(["definition", "dlt"])
        .output()?;
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(json["custom_tags.dbacademy.source"]["value"], "Smoke-Test");
    assert_eq!(json["custom_tags.dbacademy.lab_id"]["value"], "Lab_42");
    Ok(())
}

#[test]
fn test_setup_dry_run_provisions_every_slot() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    env.labforge()
        .args(["setup", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pool-000001"))
        .stdout(predicate::str::contains("DBAcademy Jobs"))
        .stdout(predicate::str::contains("DBAcademy DLT"))
        .stdout(predicate::str::contains("/#setting/clusters/instance-pools/view/pool-000001"));
    Ok(())
}

#[test]
fn test_pool_dry_run() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    env.labforge()
        .args(["pool", "--dry-run", "--min-idle", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("min idle 2"))
        .stdout(predicate::str::contains("Pool ready: pool-000001"));
    Ok(())
}

#[test]
fn test_pool_flags_are_validated() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    env.labforge()
        .args(["pool", "--dry-run", "--autotermination", "20000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    Ok(())
}

#[test]
fn test_policy_without_context_for_untagged_archetype() -> Result<()> {
    let env = LabforgeTestEnv::new("policies:\n  spark_version: \"13.3.x\"\n")?;

    env.labforge()
        .args(["policy", "jobs", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy created"));
    Ok(())
}

#[test]
fn test_pool_without_context_fails() -> Result<()> {
    let env = LabforgeTestEnv::new("pool:\n  name: empty\n")?;

    env.labforge()
        .args(["pool", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing workspace context value: lab_id"));
    Ok(())
}

#[test]
fn test_policy_needs_spark_version() -> Result<()> {
    let env = LabforgeTestEnv::new("workspace:\n  lab_id: x\n  description: d\n  workspace_name: w\n  org_id: o\n")?;

    env.labforge()
        .args(["policy", "all-purpose", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("spark_version"));
    Ok(())
}

#[test]
fn test_live_run_requires_host() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    env.labforge()
        .arg("pool")
        .assert()
        .failure()
        .stderr(predicate::str::contains("connection.host"));
    Ok(())
}

#[test]
fn test_live_run_requires_token() -> Result<()> {
    let env = LabforgeTestEnv::new(LAB_CONFIG)?;

    env.labforge()
        .env("DATABRICKS_HOST", "http://127.0.0.1:9")
        .arg("pool")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABRICKS_TOKEN"));
    Ok(())
}
