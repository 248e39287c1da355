// src/main.rs
mod auth;
mod bom;
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod logger;
mod middleware;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_utils;

use axum::Router;
use http::HeaderValue;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    // Load environment variables before anything reads them
    dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            // Logger level comes from config, so fall back to stderr here
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    logger::init(config.log_level.as_deref());

    let db_pool = match database::create_pool(&config.database_url, config.db_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create database pool");
            return;
        }
    };

    if let Err(e) = database::run_migrations(&db_pool).await {
        tracing::error!(error = %e, "Failed to run migrations");
        return;
    }

    if let Some(admin) = &config.admin {
        if let Err(e) = auth::bootstrap::ensure_admin(&db_pool, admin).await {
            tracing::error!(error = ?e, "Failed to bootstrap admin account");
            return;
        }
    }

    let cors = match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    };

    let (host, base_port) = (config.host, config.port);
    let app_state = state::AppState::new(db_pool, config);

    let app = Router::new()
        .nest("/api", routes::create_router(&app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}
