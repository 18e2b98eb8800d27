//! # AppError
//!
//! Centralized error handling for the order service.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all jw-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Order)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Requester is authenticated but may not touch the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Missing or invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Validation failure (e.g., no line items, unknown status)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The request is well-formed but the order's state rules it out
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn order_not_found(id: impl ToString) -> Self {
        AppError::NotFound("Order".to_string(), id.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for order logic.
pub type Result<T> = std::result::Result<T, AppError>;
