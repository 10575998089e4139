// labforge/src/commands/policy.rs
//
// USE CASE: create or update one cluster policy.

use std::path::PathBuf;

use labforge_core::domain::policy::PolicyArchetype;
use labforge_core::domain::resource::InstancePoolId;
use labforge_core::domain::tags::ContextOverrides;

pub async fn execute(
    archetype: PolicyArchetype,
    project_dir: PathBuf,
    instance_pool_id: Option<String>,
    spark_version: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let config = super::load(&project_dir)?;
    let spark_version = spark_version.or(config.policies.spark_version.clone());
    let pool_id = instance_pool_id.map(InstancePoolId::new);

    println!("📜 Reconciling policy '{}'...", archetype.policy_name());

    let provisioner = super::provisioner(&config, dry_run)?;
    let outcome = provisioner
        .provision_policy(
            archetype,
            pool_id.as_ref(),
            spark_version.as_deref(),
            &ContextOverrides::default(),
        )
        .await?;

    let verb = if outcome.replaced { "updated" } else { "created" };
    println!("✨ Policy {}: {}", verb, outcome.id);
    Ok(())
}
