// labforge-core/src/infrastructure/config/mod.rs

pub mod project;
pub mod settings;

pub use project::{apply_env_overrides, load_config, load_optional_config};
pub use settings::{ConnectionSettings, LabforgeConfig, PolicySettings, PoolSettings, WorkspaceSettings};
