//! Domain-level error type shared by every layer above `campus-core`.

use crate::types::DbId;

/// Errors raised by domain validation and access checks.
///
/// The HTTP layer maps each variant onto a status code; background jobs
/// only log them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
