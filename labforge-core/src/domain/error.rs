// labforge-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::lifecycle::{SlotEvent, SlotState};

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Malformed definition for '{key}': {reason}")]
    #[diagnostic(
        code(labforge::domain::definition),
        help("Fixed needs a value, range needs numeric min/max with min <= max.")
    )]
    MalformedDefinition { key: String, reason: String },

    #[error("Illegal transition for slot '{slot}': {from} --{event}--> ?")]
    #[diagnostic(code(labforge::domain::lifecycle))]
    InvalidTransition {
        slot: String,
        from: SlotState,
        event: SlotEvent,
    },

    #[error("Missing workspace context value: {0}")]
    #[diagnostic(
        code(labforge::domain::context),
        help("Set it in labforge.yaml under `workspace:` or through LABFORGE_* variables.")
    )]
    MissingContext(String),

    #[error("Unknown policy archetype: {0}")]
    #[diagnostic(
        code(labforge::domain::archetype),
        help("Expected one of: all-purpose, jobs, dlt.")
    )]
    UnknownArchetype(String),
}
