use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pawsitivecheck_backend::handlers::admin_sync;
use pawsitivecheck_backend::jobs::sync_scheduler::{SyncScheduler, DEFAULT_CHECK_INTERVAL};
use pawsitivecheck_backend::services::schedule_store::{DbScheduleStore, ScheduleStore};
use pawsitivecheck_backend::services::sync_executors::SyncDispatcher;
use pawsitivecheck_backend::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pawsitivecheck_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let admin_api_key = env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set");
    let check_interval = env::var("SYNC_CHECK_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CHECK_INTERVAL);

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let store: Arc<dyn ScheduleStore> = Arc::new(DbScheduleStore::new(db));

    // Start the background scheduler; stopped again on graceful shutdown.
    let scheduler = SyncScheduler::new(
        Arc::clone(&store),
        Arc::new(SyncDispatcher::new()),
        check_interval,
    );
    scheduler.start().await;

    let state = AppState {
        store,
        admin_api_key,
    };

    // Build router
    let app = Router::new()
        .route("/", get(hello_pawsitivecheck))
        .route("/api/health", get(health))
        .merge(admin_sync::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind 0.0.0.0:3000");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("listener has no local addr")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    scheduler.stop().await;
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutdown signal received");
}

async fn hello_pawsitivecheck() -> &'static str {
    "Hello from PawsitiveCheck Backend! 🐾"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
