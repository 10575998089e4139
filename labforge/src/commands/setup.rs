// labforge/src/commands/setup.rs
//
// USE CASE: provision a whole lab (pool, then policies bound to it).

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use std::time::Instant;

use labforge_core::application::{LabPlan, LabReport};
use labforge_core::domain::lifecycle::SlotTrace;
use labforge_core::domain::tags::ContextOverrides;

pub async fn execute(project_dir: PathBuf, no_pool: bool, dry_run: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    println!("⚙️  Loading configuration...");
    let config = super::load(&project_dir)?;
    println!(
        "   Lab: {} | policies: {}",
        config.workspace.lab_id.as_deref().unwrap_or("<unset>"),
        config
            .policies
            .archetypes
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let plan = LabPlan {
        pool: (!no_pool).then(|| config.pool.request()),
        archetypes: config.policies.archetypes.clone(),
        spark_version: config.policies.spark_version.clone(),
        overrides: ContextOverrides::default(),
    };

    let provisioner = super::provisioner(&config, dry_run)?;
    let report = provisioner.setup(&plan).await?;

    println!("\n{}", summary(&report));
    println!("✨ SUCCESS! Lab provisioned in {:.2?}", start.elapsed());
    Ok(())
}

fn summary(report: &LabReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Kind", "Name", "Id", "Lifecycle", "Completed (UTC)"]);

    fn row(kind: &str, name: &str, id: &str, trace: &SlotTrace, at: String) -> Vec<String> {
        vec![kind.to_string(), name.to_string(), id.to_string(), trace.path(), at]
    }

    if let Some(pool) = &report.pool {
        table.add_row(row(
            "instance pool",
            &pool.name,
            pool.id.as_str(),
            &pool.trace,
            pool.completed_at.format("%H:%M:%S").to_string(),
        ));
    }
    for (_, policy) in &report.policies {
        table.add_row(row(
            "cluster policy",
            &policy.name,
            policy.id.as_str(),
            &policy.trace,
            policy.completed_at.format("%H:%M:%S").to_string(),
        ));
    }
    table
}
