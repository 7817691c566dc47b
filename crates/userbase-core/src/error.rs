//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use thiserror::Error;

/// Boxed cause carried by infrastructure errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of an error, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Validation,
    ImmutableField,
    Conflict,
    Connectivity,
    Query,
    Configuration,
    Internal,
}

/// The kind of integrity rule a write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unique => "unique",
            Self::ForeignKey => "foreign key",
            Self::NotNull => "not null",
            Self::Check => "check",
        };
        f.write_str(label)
    }
}

/// Unified error type for all layers of Userbase.
///
/// Infrastructure variants keep the originating error reachable through
/// [`std::error::Error::source`], so callers can tell a constraint violation
/// from a lost connection without parsing messages.
#[derive(Error, Debug)]
pub enum UserbaseError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A filter key or value that cannot be turned into a predicate
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Attempt to assign a derived, read-only field
    #[error("Field '{field}' is computed and cannot be set")]
    ImmutableField { field: String },

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Infrastructure Errors ============
    /// Integrity constraint rejected a write
    #[error("{operation} failed: {kind} constraint violated: {message}")]
    Constraint {
        operation: &'static str,
        kind: ConstraintKind,
        message: String,
        #[source]
        source: BoxError,
    },

    /// Database could not be reached
    #[error("{operation} failed: database unavailable: {source}")]
    Connectivity {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// Any other statement failure
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UserbaseError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) | Self::InvalidFilter(_) => ErrorKind::Validation,
            Self::ImmutableField { .. } => ErrorKind::ImmutableField,
            Self::Conflict(_) | Self::Constraint { .. } => ErrorKind::Conflict,
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::Query { .. } => ErrorKind::Query,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Internal(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation | ErrorKind::ImmutableField => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Connectivity => 503,
            ErrorKind::Query | ErrorKind::Configuration | ErrorKind::Internal => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::ImmutableField { .. } => "IMMUTABLE_FIELD",
            Self::Conflict(_) => "CONFLICT",
            Self::Constraint { .. } => "CONSTRAINT_VIOLATION",
            Self::Connectivity { .. } => "DATABASE_UNAVAILABLE",
            Self::Query { .. } => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an invalid filter error.
    #[must_use]
    pub fn invalid_filter<T: Into<String>>(message: T) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Creates an immutable field error.
    #[must_use]
    pub fn immutable_field<T: Into<String>>(field: T) -> Self {
        Self::ImmutableField {
            field: field.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true when a unique index on `column` rejected the write.
    ///
    /// Matches both `table.column` (SQLite, MySQL) and bare column names in
    /// the driver message.
    #[must_use]
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        match self {
            Self::Constraint {
                kind: ConstraintKind::Unique,
                message,
                ..
            } => message
                .rsplit(':')
                .next()
                .unwrap_or(message)
                .split(',')
                .map(str::trim)
                .any(|target| target == column || target.rsplit('.').next() == Some(column)),
            _ => false,
        }
    }
}

#[cfg(feature = "sqlx")]
impl UserbaseError {
    /// Classifies a driver error raised while running `operation`.
    ///
    /// The driver error is kept as the source of the returned value.
    #[must_use]
    pub fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as DbKind;

        if matches!(
            err,
            sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::WorkerCrashed
        ) {
            return Self::Connectivity {
                operation,
                source: Box::new(err),
            };
        }

        let constraint = err.as_database_error().and_then(|db_err| {
            let kind = match db_err.kind() {
                DbKind::UniqueViolation => ConstraintKind::Unique,
                DbKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
                DbKind::NotNullViolation => ConstraintKind::NotNull,
                DbKind::CheckViolation => ConstraintKind::Check,
                _ => return None,
            };
            Some((kind, db_err.message().to_string()))
        });

        match constraint {
            Some((kind, message)) => Self::Constraint {
                operation,
                kind,
                message,
                source: Box::new(err),
            },
            None => Self::Query {
                operation,
                source: Box::new(err),
            },
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for UserbaseError {
    fn from(err: sqlx::Error) -> Self {
        Self::from_sqlx("database", err)
    }
}

/// Serializable error envelope for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable summary of what the caller asked for
    pub message: String,
    /// The underlying cause
    pub error: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates an envelope for `error` under the given summary message.
    #[must_use]
    pub fn from_error(message: impl Into<String>, error: &UserbaseError) -> Self {
        Self {
            message: message.into(),
            error: error.to_string(),
            code: error.error_code().to_string(),
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}
