use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use models::review::{Review, ReviewPatch};
use service::facade::CreateReview;

use crate::errors::JsonApiError;
use crate::routes::auth::{authenticate, ServerState};

#[derive(Debug, Deserialize)]
pub struct CreateReviewInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub place_id: Uuid,
    pub comment: String,
    /// Integer 1..=5; fractional JSON numbers are rejected at the
    /// deserialization boundary.
    pub rating: i32,
}

pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<CreateReviewInput>,
) -> Result<(StatusCode, Json<Review>), JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let review = state.facade.create_review(
        CreateReview {
            id: input.id,
            place_id: input.place_id,
            comment: input.comment,
            rating: input.rating,
        },
        &identity,
    )?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn list(State(state): State<ServerState>) -> Json<Vec<Review>> {
    Json(state.facade.list_reviews())
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Review>, StatusCode> {
    state.facade.get_review(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<Review>, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let review = state.facade.update_review(id, &patch, &identity)?;
    Ok(Json(review))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    state.facade.delete_review(id, &identity)?;
    Ok(StatusCode::NO_CONTENT)
}
