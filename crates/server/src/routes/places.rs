use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use models::place::{NewPlace, Place, PlacePatch};
use models::review::Review;

use crate::errors::JsonApiError;
use crate::routes::auth::{authenticate, ServerState};

#[derive(Debug, Deserialize)]
pub struct CreatePlaceInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Defaults to the requester; only admins may create for someone else.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_per_night: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub amenity_ids: Vec<Uuid>,
}

pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<CreatePlaceInput>,
) -> Result<(StatusCode, Json<Place>), JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let place = state.facade.create_place(
        NewPlace {
            id: input.id,
            owner_id: input.owner_id.unwrap_or(identity.user_id),
            title: input.title,
            description: input.description,
            price_per_night: input.price_per_night,
            latitude: input.latitude,
            longitude: input.longitude,
            amenity_ids: input.amenity_ids,
        },
        &identity,
    )?;
    Ok((StatusCode::CREATED, Json(place)))
}

pub async fn list(State(state): State<ServerState>) -> Json<Vec<Place>> {
    Json(state.facade.list_places())
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Place>, StatusCode> {
    state.facade.get_place(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<PlacePatch>,
) -> Result<Json<Place>, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let place = state.facade.update_place(id, &patch, &identity)?;
    Ok(Json(place))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    state.facade.delete_place(id, &identity)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reviews for one place. The place is checked first so callers can tell
/// "no such place" apart from "no reviews yet".
pub async fn reviews(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, JsonApiError> {
    if state.facade.get_place(id).is_none() {
        return Err(JsonApiError::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            Some("place not found".into()),
        ));
    }
    Ok(Json(state.facade.get_reviews_by_place(id)))
}
