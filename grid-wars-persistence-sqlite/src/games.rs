use chrono::Utc;
use grid_wars_domain::{
    ServiceError, ServiceResult,
    account::AccountId,
    game::{
        Difficulty, Game, GameId, GameMode, GameRepository, GameStatus, PlayerSymbol, ResultType,
    },
};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{db_err, parse_timestamp, parse_uuid};

pub struct SqliteGameRepository {
    pool: Pool<Sqlite>,
}

impl SqliteGameRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn game_from_row(row: &SqliteRow) -> ServiceResult<Game> {
        let id: String = row.try_get("id").map_err(db_err)?;
        let player1_id: String = row.try_get("player1_id").map_err(db_err)?;
        let player2_id: Option<String> = row.try_get("player2_id").map_err(db_err)?;
        let winner_id: Option<String> = row.try_get("winner_id").map_err(db_err)?;
        let game_status: String = row.try_get("game_status").map_err(db_err)?;
        let current_turn: String = row.try_get("current_turn").map_err(db_err)?;
        let player1_symbol: String = row.try_get("player1_symbol").map_err(db_err)?;
        let player2_symbol: String = row.try_get("player2_symbol").map_err(db_err)?;
        let game_mode: String = row.try_get("game_mode").map_err(db_err)?;
        let difficulty: Option<String> = row.try_get("difficulty").map_err(db_err)?;
        let result_type: Option<String> = row.try_get("result_type").map_err(db_err)?;
        let started_at: Option<String> = row.try_get("started_at").map_err(db_err)?;
        let completed_at: Option<String> = row.try_get("completed_at").map_err(db_err)?;
        let created_at: String = row.try_get("created_at").map_err(db_err)?;

        Ok(Game {
            id: parse_uuid(&id)?,
            player1_id: parse_uuid(&player1_id)?,
            player2_id: player2_id.as_deref().map(parse_uuid).transpose()?,
            winner_id: winner_id.as_deref().map(parse_uuid).transpose()?,
            game_status: parse_enum(&game_status, GameStatus::from_str, "game status")?,
            current_turn: parse_enum(&current_turn, PlayerSymbol::from_str, "symbol")?,
            player1_symbol: parse_enum(&player1_symbol, PlayerSymbol::from_str, "symbol")?,
            player2_symbol: parse_enum(&player2_symbol, PlayerSymbol::from_str, "symbol")?,
            game_mode: parse_enum(&game_mode, GameMode::from_str, "game mode")?,
            difficulty: difficulty
                .as_deref()
                .map(|s| parse_enum(s, Difficulty::from_str, "difficulty"))
                .transpose()?,
            result_type: result_type
                .as_deref()
                .map(|s| parse_enum(s, ResultType::from_str, "result type"))
                .transpose()?,
            started_at: started_at.as_deref().map(parse_timestamp).transpose()?,
            completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    async fn find_by_id(&self, id: GameId) -> ServiceResult<Option<Game>> {
        let row = sqlx::query("SELECT * FROM games WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::game_from_row).transpose()
    }
}

fn parse_enum<T>(s: &str, parse: fn(&str) -> Option<T>, kind: &str) -> ServiceResult<T> {
    parse(s).ok_or_else(|| ServiceError::Internal(format!("Unknown {} in row: {}", kind, s)))
}

#[async_trait::async_trait]
impl GameRepository for SqliteGameRepository {
    async fn insert(&self, game: &Game) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO games (id, player1_id, player2_id, winner_id, game_status, \
             current_turn, player1_symbol, player2_symbol, game_mode, difficulty, \
             result_type, started_at, completed_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(game.id.to_string())
        .bind(game.player1_id.to_string())
        .bind(game.player2_id.map(|id| id.to_string()))
        .bind(game.winner_id.map(|id| id.to_string()))
        .bind(game.game_status.as_str())
        .bind(game.current_turn.as_str())
        .bind(game.player1_symbol.as_str())
        .bind(game.player2_symbol.as_str())
        .bind(game.game_mode.as_str())
        .bind(game.difficulty.map(|d| d.as_str()))
        .bind(game.result_type.map(|r| r.as_str()))
        .bind(game.started_at.map(|t| t.to_rfc3339()))
        .bind(game.completed_at.map(|t| t.to_rfc3339()))
        .bind(game.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_active_between(
        &self,
        player1_id: AccountId,
        player2_id: Option<AccountId>,
    ) -> ServiceResult<Option<Game>> {
        let row = match player2_id {
            Some(player2_id) => {
                sqlx::query(
                    "SELECT * FROM games WHERE game_status = 'active' AND \
                     ((player1_id = ? AND player2_id = ?) OR (player1_id = ? AND player2_id = ?))",
                )
                .bind(player1_id.to_string())
                .bind(player2_id.to_string())
                .bind(player2_id.to_string())
                .bind(player1_id.to_string())
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM games WHERE game_status = 'active' AND \
                     player1_id = ? AND player2_id IS NULL",
                )
                .bind(player1_id.to_string())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;
        row.as_ref().map(Self::game_from_row).transpose()
    }

    async fn complete(&self, id: GameId) -> ServiceResult<Option<Game>> {
        let result = sqlx::query(
            "UPDATE games SET game_status = 'completed', completed_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use grid_wars_domain::{game::CreateGameRequest, strategy::build_game};
    use uuid::Uuid;

    use crate::{create_db_pool, init_schema, temp_db_url};

    use super::*;

    async fn make_repository() -> SqliteGameRepository {
        let pool = create_db_pool(&temp_db_url()).await.unwrap();
        init_schema(&pool).await.unwrap();
        SqliteGameRepository::new(pool)
    }

    fn pvp_game(player1_id: AccountId, player2_id: AccountId) -> Game {
        build_game(&CreateGameRequest {
            player1_id,
            player2_id: Some(player2_id),
            game_mode: GameMode::Pvp,
            difficulty: None,
            player1_symbol: Some(PlayerSymbol::X),
        })
        .unwrap()
    }

    fn ai_game(player1_id: AccountId) -> Game {
        build_game(&CreateGameRequest {
            player1_id,
            player2_id: None,
            game_mode: GameMode::Ai,
            difficulty: Some(Difficulty::Medium),
            player1_symbol: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_complete_roundtrip() {
        let repository = make_repository().await;
        let game = ai_game(Uuid::new_v4());
        repository.insert(&game).await.unwrap();

        let completed = repository.complete(game.id).await.unwrap().unwrap();
        assert_eq!(completed.game_status, GameStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.game_mode, GameMode::Ai);
        assert_eq!(completed.difficulty, Some(Difficulty::Medium));
        assert_eq!(completed.player2_id, None);
    }

    #[tokio::test]
    async fn test_complete_missing_game_is_none() {
        let repository = make_repository().await;
        assert!(repository.complete(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_active_between_matches_either_order() {
        let repository = make_repository().await;
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        let mut game = pvp_game(p1, p2);
        game.game_status = GameStatus::Active;
        repository.insert(&game).await.unwrap();

        let found = repository
            .find_active_between(p1, Some(p2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, game.id);

        let reversed = repository
            .find_active_between(p2, Some(p1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reversed.id, game.id);

        assert!(repository
            .find_active_between(p1, Some(Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_waiting_games_are_not_active() {
        let repository = make_repository().await;
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        repository.insert(&pvp_game(p1, p2)).await.unwrap();

        assert!(repository
            .find_active_between(p1, Some(p2))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_active_ai_game_by_single_player() {
        let repository = make_repository().await;
        let p1 = Uuid::new_v4();
        repository.insert(&ai_game(p1)).await.unwrap();

        assert!(repository
            .find_active_between(p1, None)
            .await
            .unwrap()
            .is_some());
        assert!(repository
            .find_active_between(Uuid::new_v4(), None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_check_constraint_rejects_same_player_twice() {
        let repository = make_repository().await;
        let p1 = Uuid::new_v4();

        // Bypass the strategy guard; the database must reject this on its own.
        let mut game = pvp_game(p1, Uuid::new_v4());
        game.player2_id = Some(p1);
        assert!(repository.insert(&game).await.is_err());
    }

    #[tokio::test]
    async fn test_check_constraint_rejects_same_symbol_twice() {
        let repository = make_repository().await;
        let mut game = pvp_game(Uuid::new_v4(), Uuid::new_v4());
        game.player2_symbol = game.player1_symbol;
        assert!(repository.insert(&game).await.is_err());
    }
}
