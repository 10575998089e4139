// labforge/src/commands/definition.rs
//
// USE CASE: show the exact policy document `policy` would send.

use anyhow::Context;
use std::path::PathBuf;

use labforge_core::domain::policy::PolicyArchetype;
use labforge_core::domain::resource::InstancePoolId;
use labforge_core::domain::tags::ContextOverrides;

pub fn execute(
    archetype: PolicyArchetype,
    project_dir: PathBuf,
    instance_pool_id: Option<String>,
    spark_version: Option<String>,
) -> anyhow::Result<()> {
    let config = super::load(&project_dir)?;
    let spark_version = spark_version.or(config.policies.spark_version.clone());
    let pool_id = instance_pool_id.map(InstancePoolId::new);

    // Never contacts the workspace: the in-memory one is only there to
    // satisfy the wiring.
    let provisioner = super::provisioner_offline(&config);
    let definition = provisioner.preview_policy(
        archetype,
        pool_id.as_ref(),
        spark_version.as_deref(),
        &ContextOverrides::default(),
    )?;

    let json = definition
        .to_json_pretty()
        .context("Failed to serialize policy definition")?;
    println!("{}", json);
    Ok(())
}
