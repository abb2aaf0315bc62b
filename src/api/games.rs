use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::Response,
};
use grid_wars_domain::game::{CreateGameRequest, Difficulty, GameId, GameMode, PlayerSymbol};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::response::{ApiError, success},
    app::AppState,
    jwt::AuthUser,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameDto {
    pub player1_id: Uuid,
    pub player2_id: Option<Uuid>,
    pub game_mode: GameMode,
    pub difficulty: Option<Difficulty>,
    pub player1_symbol: Option<PlayerSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteGameDto {
    pub game_id: GameId,
}

pub async fn create_game(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AuthUser(_claims): AuthUser,
    axum::Json(dto): axum::Json<CreateGameDto>,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let request = CreateGameRequest {
        player1_id: dto.player1_id,
        player2_id: dto.player2_id,
        game_mode: dto.game_mode,
        difficulty: dto.difficulty,
        player1_symbol: dto.player1_symbol,
    };
    let game = state
        .game_service
        .create_game(request)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success(
        StatusCode::CREATED,
        Some(game),
        "Game created successfully",
        &path,
    ))
}

pub async fn complete_game(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    axum::Json(dto): axum::Json<CompleteGameDto>,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let completed = state
        .game_service
        .complete_game(dto.game_id)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    // Completing a missing game is a no-op, not an error.
    match completed {
        Some(game) => Ok(success(
            StatusCode::OK,
            Some(game),
            "Game completed successfully",
            &path,
        )),
        None => Ok(success::<()>(StatusCode::OK, None, "Game not found", &path)),
    }
}
