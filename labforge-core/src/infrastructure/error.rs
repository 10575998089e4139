// labforge-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- REMOTE API ---
    #[error("HTTP transport error: {0}")]
    #[diagnostic(
        code(labforge::infra::http),
        help("Check the workspace host and your network connectivity.")
    )]
    Http(#[from] reqwest::Error),

    #[error("Workspace API error ({status} {error_code}): {message}")]
    #[diagnostic(code(labforge::infra::api))]
    Api {
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("JSON Error: {0}")]
    #[diagnostic(code(labforge::infra::json))]
    Json(#[from] serde_json::Error),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(labforge::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(labforge::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(labforge::infra::validation))]
    Validation(#[from] validator::ValidationErrors),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(labforge::infra::config_missing))]
    ConfigNotFound(String),

    #[error("No API token found in environment variable '{0}'")]
    #[diagnostic(
        code(labforge::infra::credentials),
        help("Export a personal access token, or use --dry-run to provision against an in-memory workspace.")
    )]
    MissingCredentials(String),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(code(labforge::infra::template))]
    TemplateError(#[from] minijinja::Error),
}

impl InfrastructureError {
    /// Remote "does not exist" answers, which a delete treats as success.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api {
                status, error_code, ..
            } => *status == 404 || error_code == "RESOURCE_DOES_NOT_EXIST",
            _ => false,
        }
    }
}
