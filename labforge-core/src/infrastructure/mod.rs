// labforge-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod config;
pub mod display;
pub mod error;
