// src/domain/ports/mod.rs

pub mod sanitizer;

pub use sanitizer::Sanitizer;
