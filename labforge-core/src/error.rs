// labforge-core/src/error.rs

use crate::domain::error::DomainError;
use crate::domain::lifecycle::SlotTrace;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum LabforgeError {
    // --- DOMAIN (definitions, lifecycle) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (HTTP, config, rendering) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- RECONCILE (a remote step failed mid-lifecycle) ---
    #[error("Reconcile of '{}' stopped: {}", .trace.slot(), .trace.path())]
    #[diagnostic(
        code(labforge::reconcile),
        help("Nothing is rolled back. Fix the cause and run again: the slot converges.")
    )]
    SlotFailed {
        trace: SlotTrace,
        #[source]
        source: Box<LabforgeError>,
    },

    #[error("Internal Error: {0}")]
    #[diagnostic(code(labforge::internal))]
    InternalError(String),
}

impl LabforgeError {
    pub fn slot_failed(trace: SlotTrace, source: LabforgeError) -> Self {
        LabforgeError::SlotFailed {
            trace,
            source: Box::new(source),
        }
    }

    /// True when the failure came back from the remote workspace API.
    pub fn is_remote(&self) -> bool {
        match self {
            LabforgeError::Infrastructure(InfrastructureError::Api { .. })
            | LabforgeError::Infrastructure(InfrastructureError::Http(_)) => true,
            LabforgeError::SlotFailed { source, .. } => source.is_remote(),
            _ => false,
        }
    }

    /// Lifecycle path of the slot when a reconcile step failed, ending in `ERROR`.
    pub fn trace(&self) -> Option<&SlotTrace> {
        match self {
            LabforgeError::SlotFailed { trace, .. } => Some(trace),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LabforgeError {
    fn from(err: std::io::Error) -> Self {
        LabforgeError::Infrastructure(InfrastructureError::Io(err))
    }
}
