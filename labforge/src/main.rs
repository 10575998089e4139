// labforge/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use labforge_core::LabforgeError;
use labforge_core::infrastructure::error::InfrastructureError;

#[tokio::main]
async fn main() {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug labforge setup ... for the state-machine traces.
    // Logs go to stderr so `definition` output stays pipeable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n💥 {:#}", e);
        if let Some(help) = help_for(&e) {
            eprintln!("   💡 {}", help);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Pool {
            project_dir,
            name,
            min_idle,
            autotermination,
            dry_run,
        } => commands::pool::execute(project_dir, name, min_idle, autotermination, dry_run).await,

        Commands::Policy {
            archetype,
            project_dir,
            instance_pool_id,
            spark_version,
            dry_run,
        } => {
            commands::policy::execute(
                archetype.into(),
                project_dir,
                instance_pool_id,
                spark_version,
                dry_run,
            )
            .await
        }

        Commands::Setup {
            project_dir,
            no_pool,
            dry_run,
        } => commands::setup::execute(project_dir, no_pool, dry_run).await,

        Commands::Definition {
            archetype,
            project_dir,
            instance_pool_id,
            spark_version,
        } => commands::definition::execute(
            archetype.into(),
            project_dir,
            instance_pool_id,
            spark_version,
        ),
    }
}

// Surfaces the miette `help` of library errors, wherever they sit in the chain.
fn help_for(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<LabforgeError>() {
            return e.help().map(|h| h.to_string());
        }
        cause
            .downcast_ref::<InfrastructureError>()
            .and_then(|e| e.help().map(|h| h.to_string()))
    })
}
