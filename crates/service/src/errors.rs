use thiserror::Error;

use models::errors::ModelError;

/// Business errors surfaced by the facade. The HTTP adapter owns the
/// mapping to transport status codes; nothing here retries.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("user has already reviewed this place")]
    DuplicateReview,
    #[error("users cannot review their own place")]
    SelfReviewForbidden,
    #[error("insufficient privilege")]
    Unauthorized,
    #[error("missing or invalid credential")]
    Unauthenticated,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("update failed: {0}")]
    UpdateFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 2001,
            ServiceError::DuplicateKey(_) => 2002,
            ServiceError::DuplicateReview => 2003,
            ServiceError::SelfReviewForbidden => 2004,
            ServiceError::Unauthorized => 2005,
            ServiceError::Unauthenticated => 2006,
            ServiceError::InvalidInput(_) => 2007,
            ServiceError::UpdateFailed(_) => 2101,
            ServiceError::DeleteFailed(_) => 2102,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => ServiceError::InvalidInput(msg),
        }
    }
}
