//! # Error Types
//!
//! Storage errors and the engine's user-facing error taxonomy.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / serde_json::Error                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ─────────────────────────┐                                    │
//! │                                   ▼                                    │
//! │  CoreError ──────────────► EngineError                                 │
//! │                            ├── Rejected  (nothing changed)             │
//! │                            ├── Storage   (memory ahead of disk)        │
//! │                            └── NotFound  (no-op)                       │
//! │                                   │                                    │
//! │                                   ▼                                    │
//! │                            ApiError { code, message } ──► UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal. Each has a defined recovery: fix the input,
//! call `flush()`, or tell the user the target is gone.

use pharma_core::CoreError;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Pool closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    ///
    /// ## When This Occurs
    /// - Missing table
    /// - Disk full / read-only database
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored document could not be encoded or decoded.
    #[error("Corrupt document '{key}': {message}")]
    Serialization { key: String, message: String },

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a Serialization error for a given document key.
    pub fn serialization(key: impl Into<String>, err: serde_json::Error) -> Self {
        DbError::Serialization {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Engine Error
// =============================================================================

/// Errors returned by [`SalesEngine`](crate::SalesEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request was rejected before anything changed.
    #[error("{}", .issues.join("; "))]
    Rejected { issues: Vec<String> },

    /// The change is applied in memory but could not be written to storage.
    /// Call `SalesEngine::flush` to retry the write.
    #[error("Change applied but not saved ({0}); retry saving")]
    Storage(#[source] DbError),

    /// The drug or sale no longer exists.
    #[error("{0}")]
    NotFound(String),
}

impl EngineError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Rejected { .. } => ErrorCode::ValidationError,
            EngineError::Storage(_) => ErrorCode::StorageError,
            EngineError::NotFound(_) => ErrorCode::NotFound,
        }
    }

    /// Issue list shown to the user.
    pub fn issues(&self) -> Vec<String> {
        match self {
            EngineError::Rejected { issues } => issues.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DrugNotFound(_) | CoreError::SaleNotFound(_) => {
                EngineError::NotFound(err.to_string())
            }
            other => EngineError::Rejected {
                issues: other.issues(),
            },
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// API Error
// =============================================================================

/// Error codes for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input rejected, nothing changed
    ValidationError,

    /// Local state is ahead of durable storage
    StorageError,

    /// Target no longer exists
    NotFound,
}

/// Serializable error for the UI layer.
///
/// ```json
/// { "code": "VALIDATION_ERROR", "message": "Insufficient stock for ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharma_core::DrugId;

    #[test]
    fn test_core_errors_map_to_taxonomy() {
        let err: EngineError = CoreError::DrugNotFound(DrugId::from("d1")).into();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err: EngineError = CoreError::ValidationRejected {
            issues: vec!["a".into(), "b".into()],
        }
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.issues(), vec!["a", "b"]);

        let err: EngineError = CoreError::InsufficientStock {
            name: "X".into(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_api_error_serialization() {
        let api: ApiError = EngineError::Storage(DbError::QueryFailed("disk full".into())).into();
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "STORAGE_ERROR");
        assert!(json["message"].as_str().unwrap().contains("disk full"));
    }
}
