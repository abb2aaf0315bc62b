use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};
use log::info;

use crate::app::AppState;

mod accounts;
mod games;
pub mod response;

// Generous outer limit so oversized uploads reach the 5 MB domain check
// instead of tripping axum's default body cap.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub async fn run(
    state: AppState,
    port: u16,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) {
    let router = Router::new()
        .route("/accounts/register", post(accounts::register))
        .route("/accounts/login", post(accounts::login))
        .route("/accounts/profile", get(accounts::profile))
        .route("/accounts/update-username", patch(accounts::update_username))
        .route("/accounts/update-password", patch(accounts::update_password))
        .route("/accounts/upload-image", post(accounts::upload_image))
        .route("/games/create-game", post(games::create_game))
        .route("/games/complete-game", post(games::complete_game))
        .layer(DefaultBodyLimit::max(BODY_LIMIT));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    info!("API server listening on port {}", port);
    axum::serve(listener, router.with_state(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .unwrap();

    info!("HTTP API shut down gracefully");
}
