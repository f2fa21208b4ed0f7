// Validation error taxonomy
use super::path::FieldPath;

/// Why a snapshot document was rejected. The whole document is refused on any variant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("schema violation at {path}: {reason}")]
    SchemaViolation { path: FieldPath, reason: String },

    #[error("unknown widget type {found:?} at {path} (expected chart, table or map)")]
    UnknownWidgetType { path: FieldPath, found: String },

    #[error("inconsistent widget order at {path}: {reason}")]
    InconsistentOrder { path: FieldPath, reason: String },
}

impl ValidationError {
    pub fn schema(path: &FieldPath, reason: impl Into<String>) -> Self {
        ValidationError::SchemaViolation {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            ValidationError::SchemaViolation { path, .. }
            | ValidationError::UnknownWidgetType { path, .. }
            | ValidationError::InconsistentOrder { path, .. } => path,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
