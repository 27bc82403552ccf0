use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    Conflict,
    #[error("admin privilege required")]
    Forbidden,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("missing or invalid token")]
    Unauthenticated,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::Forbidden => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::Unauthenticated => 1005,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
        }
    }
}
