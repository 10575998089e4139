// labforge-core/src/lib.rs

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used, clippy::expect_used)]

// Contract towards the remote workspace API.
pub mod ports;

// Policy definitions, tags, resource slots and their lifecycle.
pub mod domain;

// REST client, in-memory workspace, YAML config, HTML rendering.
pub mod infrastructure;

// Reconciler and the provisioning facade.
pub mod application;

pub mod error;

pub use error::LabforgeError;
