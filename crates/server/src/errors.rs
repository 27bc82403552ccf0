use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// JSON error envelope returned by every handler.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, title = self.title, detail = ?self.detail, "internal error");
        }
        let body = serde_json::json!({
            "error": self.title,
            "detail": self.detail,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Taxonomy-to-transport mapping. The business layer never sees status
/// codes; this is the only place where that translation happens.
impl From<ServiceError> for JsonApiError {
    fn from(err: ServiceError) -> Self {
        let detail = Some(err.to_string());
        match err {
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            ServiceError::DuplicateKey(_) => Self::new(StatusCode::CONFLICT, "Conflict", detail),
            ServiceError::DuplicateReview => {
                Self::new(StatusCode::CONFLICT, "Duplicate Review", detail)
            }
            ServiceError::SelfReviewForbidden => {
                Self::new(StatusCode::FORBIDDEN, "Self Review Forbidden", detail)
            }
            ServiceError::Unauthorized => {
                Self::new(StatusCode::FORBIDDEN, "Unauthorized Action", detail)
            }
            ServiceError::Unauthenticated => {
                Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated", detail)
            }
            ServiceError::InvalidInput(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid Input", detail)
            }
            ServiceError::UpdateFailed(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Update Failed", detail)
            }
            ServiceError::DeleteFailed(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Delete Failed", detail)
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(err: AuthError) -> Self {
        let detail = Some(err.to_string());
        match err {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Invalid Input", detail),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", detail),
            AuthError::Forbidden => {
                Self::new(StatusCode::FORBIDDEN, "Unauthorized Action", detail)
            }
            AuthError::Unauthorized => {
                Self::new(StatusCode::UNAUTHORIZED, "Invalid Credentials", detail)
            }
            AuthError::Unauthenticated => {
                Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated", detail)
            }
            AuthError::HashError(_) | AuthError::TokenError(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Auth Failure", detail)
            }
        }
    }
}
