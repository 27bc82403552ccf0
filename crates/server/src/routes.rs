use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

pub mod amenities;
pub mod auth;
pub mod places;
pub mod reviews;
pub mod users;

pub use auth::ServerState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, auth, and the four entity
/// resources under `/api/v1`.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let api = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/places", get(places::list).post(places::create))
        .route("/places/:id", get(places::get).put(places::update).delete(places::delete))
        .route("/places/:id/reviews", get(places::reviews))
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route("/amenities/catalog", get(amenities::catalog))
        .route(
            "/amenities/:id",
            get(amenities::get).put(amenities::update).delete(amenities::delete),
        )
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route("/reviews/:id", get(reviews::get).put(reviews::update).delete(reviews::delete));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
