use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::user::{User, UserPatch};
use service::auth::domain::RegisterInput;

use crate::errors::JsonApiError;
use crate::routes::auth::{authenticate, ServerState};

/// Admin-gated creation; unlike open registration the admin flag is
/// caller-controlled.
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let user = state.auth.create_user(
        RegisterInput {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password: input.password,
        },
        input.is_admin,
        &identity,
    )?;
    info!(user_id = %user.meta.id, "user created via admin endpoint");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list(State(state): State<ServerState>) -> Json<Vec<User>> {
    Json(state.facade.list_users())
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, StatusCode> {
    state.facade.get_user(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let user = state.facade.update_user(id, &patch, &identity)?;
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    state.facade.delete_user(id, &identity)?;
    Ok(StatusCode::NO_CONTENT)
}
