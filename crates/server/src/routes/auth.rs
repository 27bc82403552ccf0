use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use uuid::Uuid;

use models::user::User;
use service::auth::domain::{AuthSession, Identity, LoginInput, RegisterInput};
use service::auth::AuthService;
use service::Facade;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub facade: Arc<Facade>,
    pub auth: Arc<AuthService>,
}

#[derive(Serialize)]
pub struct RegisterOutput {
    pub user_id: Uuid,
}

/// Pull the bearer token from the `Authorization` header, falling back to
/// the login cookie.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());
    if from_header.is_some() {
        return from_header;
    }
    headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let mut it = pair.trim().splitn(2, '=');
                match (it.next(), it.next()) {
                    (Some(AUTH_COOKIE), Some(v)) if !v.is_empty() => Some(v.to_string()),
                    _ => None,
                }
            })
        })
}

/// Resolve the authenticated identity for a request, or fail with 401.
pub fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<Identity, JsonApiError> {
    let token = bearer_token(headers).ok_or_else(|| {
        JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthenticated", Some("missing credential".into()))
    })?;
    Ok(state.auth.authenticate(&token)?)
}

pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<RegisterOutput>), JsonApiError> {
    let user = state.auth.register(input)?;
    Ok((StatusCode::CREATED, Json(RegisterOutput { user_id: user.meta.id })))
}

pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<AuthSession>), JsonApiError> {
    let session = state.auth.login(input)?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(session)))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::from(AUTH_COOKIE));
    (jar, StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<User>, JsonApiError> {
    let identity = authenticate(&state, &headers)?;
    let user = state
        .facade
        .get_user(identity.user_id)
        .ok_or_else(|| JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("user not found".into())))?;
    Ok(Json(user))
}
