use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use models::amenity::{Amenity, AmenityPatch, NewAmenity};

use crate::errors::JsonApiError;
use crate::routes::auth::{authenticate, ServerState};

#[derive(Debug, Deserialize)]
pub struct CreateAmenityInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<CreateAmenityInput>,
) -> Result<(StatusCode, Json<Amenity>), JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let amenity = state.facade.create_amenity(
        NewAmenity { id: input.id, name: input.name, description: input.description },
        &identity,
    )?;
    Ok((StatusCode::CREATED, Json(amenity)))
}

pub async fn list(State(state): State<ServerState>) -> Json<Vec<Amenity>> {
    Json(state.facade.list_amenities())
}

/// Derived name -> description view, recomputed on every call.
pub async fn catalog(State(state): State<ServerState>) -> Json<BTreeMap<String, String>> {
    Json(state.facade.amenity_catalog())
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Amenity>, StatusCode> {
    state.facade.get_amenity(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<AmenityPatch>,
) -> Result<Json<Amenity>, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let amenity = state.facade.update_amenity(id, &patch, &identity)?;
    Ok(Json(amenity))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    state.facade.delete_amenity(id, &identity)?;
    Ok(StatusCode::NO_CONTENT)
}
