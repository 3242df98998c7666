use anyhow::Context;
use axum::extract::State;
use axum::Router;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

mod api;
mod app_env;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routing_utils;

/// Application state shared across all request handlers.
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

/// Extractor alias for pulling [SharedData] out of the request context
pub type AppState = State<Arc<SharedData>>;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let db_url = env::var(app_env::DB_URL).context("DATABASE_URL must be set to start")?;
    let db_pool = PgPoolOptions::new()
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&db_url)
        .await
        .context("connecting to the database")?;
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("running database migrations")?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
    });

    let router = Router::new()
        .merge(api::user::user_routes())
        .merge(api::auth::auth_routes())
        .merge(api::todo::task_routes())
        .merge(api::swagger_main::build_documentation())
        .with_state(shared_data);
    let router = logging::attach_tracing_http(router);

    let listen_addr =
        env::var(app_env::LISTEN_ADDR).unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!("Starting server on {listen_addr}.");
    axum::serve(listener, router)
        .await
        .context("serving the API")?;

    Ok(())
}
