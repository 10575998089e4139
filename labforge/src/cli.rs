// labforge/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use labforge_core::domain::policy::PolicyArchetype;

#[derive(Parser)]
#[command(name = "labforge")]
#[command(about = "Idempotent provisioning of lab instance pools and cluster policies", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ArchetypeArg {
    AllPurpose,
    Jobs,
    Dlt,
}

impl From<ArchetypeArg> for PolicyArchetype {
    fn from(arg: ArchetypeArg) -> Self {
        match arg {
            ArchetypeArg::AllPurpose => PolicyArchetype::AllPurpose,
            ArchetypeArg::Jobs => PolicyArchetype::JobsOnly,
            ArchetypeArg::Dlt => PolicyArchetype::DltOnly,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🏊 Replaces the instance pool (delete by name, then create)
    Pool {
        /// Project directory (where labforge.yaml lives)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Pool name (default: from config, else "DBAcademy")
        #[arg(long)]
        name: Option<String>,

        /// Idle instances kept warm
        #[arg(long)]
        min_idle: Option<u32>,

        /// Minutes before an idle instance is terminated
        #[arg(long)]
        autotermination: Option<u32>,

        /// Run against an in-memory workspace
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// 📜 Creates or updates one cluster policy
    Policy {
        archetype: ArchetypeArg,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Pin clusters to this instance pool
        #[arg(long)]
        instance_pool_id: Option<String>,

        /// Default spark version (ex: "13.3.x-scala2.12")
        #[arg(long)]
        spark_version: Option<String>,

        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// 🏗️  Provisions the pool, then every configured policy bound to it
    Setup {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Skip the pool; policies are left unbound
        #[arg(long, default_value = "false")]
        no_pool: bool,

        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// 🔎 Prints the normalized policy definition without calling the API
    Definition {
        archetype: ArchetypeArg,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long)]
        instance_pool_id: Option<String>,

        #[arg(long)]
        spark_version: Option<String>,
    },
}
