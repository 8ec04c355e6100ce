use axum::http::{HeaderValue, Method};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod controllers;
mod db;
mod middleware;
mod models;
mod policy;
mod routes;
mod state;
mod store;
mod utils;
mod voting;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let addr = config.server_addr;
    let cors_origin = config.cors_origin.clone();

    let app_state = match state::AppState::from_config(config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize store: {}", e);
            std::process::exit(1);
        }
    };

    let mut app = routes::app(app_state);

    if let Some(cors_origin) = cors_origin {
        let origin = cors_origin.parse::<HeaderValue>().unwrap_or_else(|_| {
            error!("Failed to parse CORS origin: {}", cors_origin);
            std::process::exit(1);
        });

        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
                axum::http::header::AUTHORIZATION,
            ]);

        info!(origin = %cors_origin, "CORS enabled");
        app = app.layer(cors);
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server running at http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
