use std::sync::Arc;

use grid_wars_domain::{
    account::ArcAccountRepository,
    game::ArcGameRepository,
    upload::ArcImageStorage,
};
use grid_wars_persistence_sqlite::{
    accounts::SqliteAccountRepository, create_db_pool, games::SqliteGameRepository, init_schema,
};
use log::info;

use crate::{
    app::construct_app,
    config::ServerConfig,
    s3::{DisabledImageStorage, S3ImageStorage},
};

mod api;
mod app;
mod config;
mod jwt;
mod logs;
mod s3;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    logs::init_logger();

    let config = ServerConfig::from_env();

    let pool = create_db_pool(&config.database_url)
        .await
        .expect("Failed to create DB pool");
    init_schema(&pool).await.expect("Failed to initialize schema");

    let account_repository: ArcAccountRepository =
        Arc::new(Box::new(SqliteAccountRepository::new(pool.clone())));
    let game_repository: ArcGameRepository = Arc::new(Box::new(SqliteGameRepository::new(pool)));

    let image_storage: ArcImageStorage = match &config.s3 {
        Some(s3_config) => Arc::new(Box::new(S3ImageStorage::new(s3_config).await)),
        None => {
            log::warn!("S3 is not configured, profile image upload is disabled");
            Arc::new(Box::new(DisabledImageStorage))
        }
    };

    let state = construct_app(&config, account_repository, game_repository, image_storage);

    info!("Starting Grid Wars server");
    api::run(state, config.port, shutdown_signal()).await;
}
