// labforge/src/commands/pool.rs
//
// USE CASE: replace the instance pool slot.

use std::path::PathBuf;

pub async fn execute(
    project_dir: PathBuf,
    name: Option<String>,
    min_idle: Option<u32>,
    autotermination: Option<u32>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let config = super::load(&project_dir)?;

    // CLI flags win over labforge.yaml, and go through the same checks
    let settings = config.pool.merged(name, min_idle, autotermination)?;

    println!(
        "🏊 Replacing pool '{}' (min idle {}, idle timeout {} min)...",
        settings.name, settings.min_idle_instances, settings.idle_instance_autotermination_minutes
    );

    let provisioner = super::provisioner(&config, dry_run)?;
    let outcome = provisioner
        .reconciler()
        .replace_instance_pool(&settings.request())
        .await?;

    if outcome.replaced {
        println!("   ♻️  Previous pool deleted");
    }
    println!("✨ Pool ready: {}", outcome.id);
    Ok(())
}
