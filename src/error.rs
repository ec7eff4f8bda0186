//! Error types for the bill of materials

use thiserror::Error;

use crate::validate::ValidationError;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, BomError>;

/// Registry errors
#[derive(Error, Debug)]
pub enum BomError {
    /// The manifest is not well-formed YAML. Nothing else can be checked.
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Manifest failed validation with {} error(s):\n{}", .0.len(), render_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid embedded schema: {0}")]
    SchemaCompile(String),

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn render_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
