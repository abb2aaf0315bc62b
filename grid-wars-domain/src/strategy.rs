use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServiceError, ServiceResult,
    game::{CreateGameRequest, Game, GameMode, GameStatus, PlayerSymbol},
};

/// Mode-keyed strategy dispatch: each game mode validates its own
/// preconditions and shapes the initial row. The match is exhaustive, so
/// adding a mode forces a decision here.
pub fn build_game(request: &CreateGameRequest) -> ServiceResult<Game> {
    match request.game_mode {
        GameMode::Pvp => build_pvp_game(request),
        GameMode::Ai => build_ai_game(request),
    }
}

fn build_pvp_game(request: &CreateGameRequest) -> ServiceResult<Game> {
    let Some(player2_id) = request.player2_id else {
        return ServiceError::bad_request("Player 2 ID is required for PVP games");
    };
    if player2_id == request.player1_id {
        return ServiceError::bad_request("Player 1 and Player 2 must be different players");
    }

    let player1_symbol = request.player1_symbol.unwrap_or(PlayerSymbol::X);
    Ok(Game {
        id: Uuid::new_v4(),
        player1_id: request.player1_id,
        player2_id: Some(player2_id),
        winner_id: None,
        game_status: GameStatus::Waiting,
        current_turn: PlayerSymbol::X,
        player1_symbol,
        player2_symbol: player1_symbol.other(),
        game_mode: GameMode::Pvp,
        difficulty: None,
        result_type: None,
        started_at: Some(Utc::now()),
        completed_at: None,
        created_at: Utc::now(),
    })
}

fn build_ai_game(request: &CreateGameRequest) -> ServiceResult<Game> {
    let Some(difficulty) = request.difficulty else {
        return ServiceError::bad_request("Difficulty is required for AI games");
    };

    let player1_symbol = request.player1_symbol.unwrap_or(PlayerSymbol::X);
    Ok(Game {
        id: Uuid::new_v4(),
        player1_id: request.player1_id,
        player2_id: None,
        winner_id: None,
        game_status: GameStatus::Active,
        current_turn: PlayerSymbol::X,
        player1_symbol,
        player2_symbol: player1_symbol.other(),
        game_mode: GameMode::Ai,
        difficulty: Some(difficulty),
        result_type: None,
        started_at: Some(Utc::now()),
        completed_at: None,
        created_at: Utc::now(),
    })
}
