//! # Error Types
//!
//! Domain-specific error types for pharma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharma-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  pharma-db errors (separate crate)                                     │
//! │  ├── DbError          - Storage failures                               │
//! │  └── EngineError      - What the UI layer sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → UI message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is raised BEFORE any state is touched. A caller that
//! receives a `CoreError` can rely on the inventory and sale list being
//! exactly as they were.

use thiserror::Error;

use crate::types::DrugId;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A sale was rejected by the sale validator.
    ///
    /// Carries every issue found, not just the first, so the cashier can fix
    /// all lines in one pass.
    #[error("Sale rejected: {}", .issues.join("; "))]
    ValidationRejected { issues: Vec<String> },

    /// Drug cannot be found in the inventory.
    #[error("Drug not found: {0}")]
    DrugNotFound(DrugId),

    /// Sale record cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A stock decrease would take the quantity below zero.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// The user-facing issue list for this error.
    pub fn issues(&self) -> Vec<String> {
        match self {
            CoreError::ValidationRejected { issues } => issues.clone(),
            other => vec![other.to_string()],
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
