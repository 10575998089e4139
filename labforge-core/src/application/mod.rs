// labforge-core/src/application/mod.rs

pub mod ports;
pub mod provisioning;
pub mod reconciler;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use labforge_core::application::{ClustersProvisioner, Reconciler};`

pub use provisioning::{ClustersProvisioner, LabPlan, LabReport};
pub use reconciler::{ReconcileOutcome, Reconciler};
