use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::auth::service::{AuthConfig, AuthService};
use service::Facade;

use crate::routes::{self, ServerState};

fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: &configs::AppConfig) -> anyhow::Result<SocketAddr> {
    let (host, port) = (cfg.server.host.clone(), cfg.server.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

fn load_config() -> configs::AppConfig {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config load failed, falling back to env/defaults");
            let mut cfg = configs::AppConfig::default();
            if let Ok(host) = env::var("SERVER_HOST") {
                cfg.server.host = host;
            }
            if let Some(port) = env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                cfg.server.port = port;
            }
            cfg.auth.normalize_from_env();
            cfg
        }
    }
}

/// Build the shared application state: one store constructed at process
/// start and handed by reference into every handler. Tests build their
/// own fresh state instead.
pub fn build_state(cfg: &configs::AppConfig) -> ServerState {
    let facade = Arc::new(Facade::new());
    let jwt_secret = if cfg.auth.jwt_secret.trim().is_empty() {
        warn!("JWT_SECRET not configured, using a development fallback");
        "dev-secret-change-me".to_string()
    } else {
        cfg.auth.jwt_secret.clone()
    };
    let auth = Arc::new(AuthService::new(
        Arc::clone(&facade),
        AuthConfig { jwt_secret, token_ttl_hours: cfg.auth.token_ttl_hours },
    ));
    ServerState { facade, auth }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config();
    let state = build_state(&cfg);

    // Optional admin bootstrap; the store starts empty on every boot
    if let (Some(email), Some(password)) = (&cfg.auth.admin_email, &cfg.auth.admin_password) {
        match state.auth.seed_admin(email, password) {
            Ok(Some(user)) => info!(user_id = %user.meta.id, "seeded admin account"),
            Ok(None) => info!("admin account already present"),
            Err(e) => warn!(error = %e, "admin seed failed"),
        }
    }

    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting listing service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
