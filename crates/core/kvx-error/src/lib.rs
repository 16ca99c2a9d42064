//! Error types and classification for kvx.
//!
//! This crate provides:
//! - [`KvxError`] - Top-level error enum for all transform errors
//! - Domain-specific errors ([`SchemaError`], [`TransformError`])
//! - [`ErrorCategory`] for drop / dead-letter / abort decisions made by a driver

use thiserror::Error;

/// Top-level error type for kvx.
#[derive(Error, Debug)]
pub enum KvxError {
    /// Schema construction or record/schema mismatch
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Step execution errors (conversion failures)
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Schema and record construction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Two fields in one record schema share a name
    #[error("Duplicate field '{field}' in schema {schema}")]
    DuplicateField { schema: String, field: String },

    /// A value was set for a field the schema does not declare
    #[error("Unknown field '{field}' in schema {schema}")]
    UnknownField { schema: String, field: String },

    /// A value does not match the declared field type
    #[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// A required field had no value and no default
    #[error("Missing value for field '{field}' in schema {schema}")]
    MissingValue { schema: String, field: String },

    /// A field default does not match the field type
    #[error("Invalid default for field '{field}': expected {expected}")]
    InvalidDefault { field: String, expected: String },
}

/// Step execution errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// No conversion path exists between two representations
    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    /// A conversion path exists but this value cannot be converted
    #[error("Cannot convert value to {to}: {reason}")]
    InvalidValue { to: String, reason: String },

    /// Schema/data desynchronisation detected while copying fields
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error classification for driver decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The message itself cannot be transformed - drop or dead-letter it
    ///
    /// Examples: unsupported cast, unparsable numeric string
    Permanent,

    /// The engine or its configuration is inconsistent - abort
    ///
    /// Examples: derived schema missing a source field, invalid step config
    Internal,
}

/// Classifies an error to decide whether only the message or the whole
/// pipeline is affected.
pub fn classify_error(error: &KvxError) -> ErrorCategory {
    match error {
        KvxError::Transform(e) => classify_transform_error(e),
        KvxError::Schema(_) => ErrorCategory::Internal,
        KvxError::Config(_) => ErrorCategory::Internal,
        KvxError::Other(_) => ErrorCategory::Internal,
    }
}

fn classify_transform_error(error: &TransformError) -> ErrorCategory {
    match error {
        TransformError::UnsupportedConversion { .. } => ErrorCategory::Permanent,
        TransformError::InvalidValue { .. } => ErrorCategory::Permanent,
        TransformError::Internal(_) => ErrorCategory::Internal,
    }
}

/// Result type alias using KvxError.
pub type Result<T> = std::result::Result<T, KvxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification_unsupported_conversion() {
        let error = KvxError::Transform(TransformError::UnsupportedConversion {
            from: "OPAQUE(protobuf)".to_string(),
            to: "STRING".to_string(),
        });
        assert_eq!(classify_error(&error), ErrorCategory::Permanent);
    }

    #[test]
    fn test_error_classification_internal() {
        let error = KvxError::Schema(SchemaError::MissingValue {
            schema: "record".to_string(),
            field: "age".to_string(),
        });
        assert_eq!(classify_error(&error), ErrorCategory::Internal);

        let error = KvxError::Transform(TransformError::Internal("desync".to_string()));
        assert_eq!(classify_error(&error), ErrorCategory::Internal);
    }

    #[test]
    fn test_error_display() {
        let error = KvxError::Transform(TransformError::UnsupportedConversion {
            from: "RECORD(record)".to_string(),
            to: "INT32".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Transform error: Unsupported conversion from RECORD(record) to INT32"
        );
    }

    #[test]
    fn test_schema_error_display() {
        let error = SchemaError::DuplicateField {
            schema: "com.example.User".to_string(),
            field: "id".to_string(),
        };
        assert!(error.to_string().contains("Duplicate field 'id'"));
    }
}
