//! Verdant server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::{ServiceExt, extract::Request};
use tokio::signal;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdant_api::AppState;
use verdant_common::{Config, S3Storage, config::CatalogConfig};
use verdant_core::{
    CommentService, LikeService, NewPlant, PlantService, SavedPlantService, StorageService,
    TokenService, UserService,
};
use verdant_db::repositories::{
    CommentRepository, PlantLikeRepository, PlantRepository, SavedPlantRepository,
    UserRepository,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Populate an empty catalog from the configured seed file.
async fn seed_catalog(
    plant_service: &PlantService,
    catalog: &CatalogConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &catalog.seed_file else {
        return Ok(());
    };

    let raw = tokio::fs::read(path).await?;
    let plants: Vec<NewPlant> = serde_json::from_slice(&raw)?;
    let seeded = plant_service.seed_catalog(plants).await?;

    if seeded > 0 {
        info!(count = seeded, path = %path.display(), "Seeded plant catalog");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verdant=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting verdant server...");

    // Load configuration, from an explicit file if VERDANT_CONFIG names one
    let config = match std::env::var_os("VERDANT_CONFIG") {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    // Connect to database
    let db = Arc::new(verdant_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    verdant_db::migrate(&db).await?;
    info!("Migrations completed");

    // Object storage
    let backend = S3Storage::new(&config.storage).await;
    let storage = StorageService::new(
        Arc::new(backend),
        Duration::from_secs(config.storage.url_expiry_secs),
    );

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let plant_repo = PlantRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = PlantLikeRepository::new(Arc::clone(&db));
    let saved_repo = SavedPlantRepository::new(Arc::clone(&db));

    // Initialize services
    let tokens = TokenService::from_config(&config.auth);
    let user_service = UserService::new(user_repo.clone(), tokens.clone());
    let plant_service = PlantService::new(
        plant_repo.clone(),
        comment_repo.clone(),
        like_repo.clone(),
        saved_repo.clone(),
        storage.clone(),
    );
    let comment_service = CommentService::new(
        comment_repo,
        plant_repo.clone(),
        user_repo.clone(),
        storage.clone(),
    );
    let like_service = LikeService::new(like_repo.clone(), plant_repo.clone(), user_repo.clone());
    let saved_plant_service =
        SavedPlantService::new(saved_repo, like_repo, plant_repo, user_repo, storage);

    seed_catalog(&plant_service, &config.catalog).await?;

    let state = AppState {
        user_service,
        plant_service,
        comment_service,
        like_service,
        saved_plant_service,
        tokens,
    };

    let router = verdant_api::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Trailing slashes are trimmed before routing
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);

    // Start server with graceful shutdown
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
