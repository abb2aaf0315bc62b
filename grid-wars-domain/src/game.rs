use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ServiceError, ServiceResult,
    account::{AccountId, ArcAccountRepository},
    strategy::build_game,
};

pub type GameId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Completed,
    Abandoned,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Completed => "completed",
            GameStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(GameStatus::Waiting),
            "active" => Some(GameStatus::Active),
            "completed" => Some(GameStatus::Completed),
            "abandoned" => Some(GameStatus::Abandoned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Pvp,
    Ai,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Pvp => "pvp",
            GameMode::Ai => "ai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pvp" => Some(GameMode::Pvp),
            "ai" => Some(GameMode::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultType {
    #[serde(rename = "win")]
    Win,
    #[serde(rename = "draw")]
    Draw,
    #[serde(rename = "forfeit")]
    Forfeit,
    #[serde(rename = "timeout")]
    Timeout,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Win => "win",
            ResultType::Draw => "draw",
            ResultType::Forfeit => "forfeit",
            ResultType::Timeout => "timeout",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "win" => Some(ResultType::Win),
            "draw" => Some(ResultType::Draw),
            "forfeit" => Some(ResultType::Forfeit),
            "timeout" => Some(ResultType::Timeout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSymbol {
    X,
    O,
}

impl PlayerSymbol {
    pub fn other(&self) -> Self {
        match self {
            PlayerSymbol::X => PlayerSymbol::O,
            PlayerSymbol::O => PlayerSymbol::X,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerSymbol::X => "X",
            PlayerSymbol::O => "O",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "X" => Some(PlayerSymbol::X),
            "O" => Some(PlayerSymbol::O),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub player1_id: AccountId,
    pub player2_id: Option<AccountId>,
    pub winner_id: Option<AccountId>,
    pub game_status: GameStatus,
    pub current_turn: PlayerSymbol,
    pub player1_symbol: PlayerSymbol,
    pub player2_symbol: PlayerSymbol,
    pub game_mode: GameMode,
    pub difficulty: Option<Difficulty>,
    pub result_type: Option<ResultType>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Board-move inventory. The table exists with its constraints, but no
/// code path writes to it yet; move application and turn advancement live
/// elsewhere.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMove {
    pub id: i64,
    pub game_id: GameId,
    pub player_id: AccountId,
    pub position: i64,
    pub symbol: PlayerSymbol,
    pub move_number: i64,
    pub created_at: DateTime<Utc>,
}

impl GameMove {
    pub fn row(&self) -> i64 {
        self.position / 3
    }

    pub fn col(&self) -> i64 {
        self.position % 3
    }
}

#[derive(Debug, Clone)]
pub struct CreateGameRequest {
    pub player1_id: AccountId,
    pub player2_id: Option<AccountId>,
    pub game_mode: GameMode,
    pub difficulty: Option<Difficulty>,
    pub player1_symbol: Option<PlayerSymbol>,
}

pub type ArcGameRepository = Arc<Box<dyn GameRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait GameRepository {
    async fn insert(&self, game: &Game) -> ServiceResult<()>;
    /// Looks for an ACTIVE game pairing these players in either order. A
    /// missing `player2` matches AI games of `player1` only.
    async fn find_active_between(
        &self,
        player1_id: AccountId,
        player2_id: Option<AccountId>,
    ) -> ServiceResult<Option<Game>>;
    /// Stamps COMPLETED and `completed_at`; `None` when no such row exists.
    async fn complete(&self, id: GameId) -> ServiceResult<Option<Game>>;
}

pub type ArcPlayerDirectory = Arc<Box<dyn PlayerDirectory + Send + Sync + 'static>>;

/// Player-existence lookup backing game creation. In a split deployment
/// this is a call to the account service; here it is a port.
#[async_trait::async_trait]
pub trait PlayerDirectory {
    async fn player_exists(&self, id: AccountId) -> ServiceResult<bool>;
}

pub struct AccountPlayerDirectory {
    accounts: ArcAccountRepository,
}

impl AccountPlayerDirectory {
    pub fn new(accounts: ArcAccountRepository) -> Self {
        Self { accounts }
    }
}

#[async_trait::async_trait]
impl PlayerDirectory for AccountPlayerDirectory {
    async fn player_exists(&self, id: AccountId) -> ServiceResult<bool> {
        Ok(self.accounts.find_active_by_id(id).await?.is_some())
    }
}

pub type ArcGameService = Arc<Box<dyn GameService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait GameService {
    async fn create_game(&self, request: CreateGameRequest) -> ServiceResult<Game>;
    async fn complete_game(&self, id: GameId) -> ServiceResult<Option<Game>>;
}

pub struct GameServiceImpl {
    games: ArcGameRepository,
    players: ArcPlayerDirectory,
}

impl GameServiceImpl {
    pub fn new(games: ArcGameRepository, players: ArcPlayerDirectory) -> Self {
        Self { games, players }
    }

    async fn check_no_active_game(&self, request: &CreateGameRequest) -> ServiceResult<()> {
        let existing = self
            .games
            .find_active_between(request.player1_id, request.player2_id)
            .await?;
        if existing.is_some() {
            return ServiceError::bad_request(
                "An active game between these players already exists.",
            );
        }
        Ok(())
    }

    async fn ensure_player_exists(&self, id: AccountId) -> ServiceResult<()> {
        if !self.players.player_exists(id).await? {
            return ServiceError::bad_request("Player Id does not exist.");
        }
        Ok(())
    }

    async fn validate_players(&self, request: &CreateGameRequest) -> ServiceResult<()> {
        self.ensure_player_exists(request.player1_id).await?;
        if let Some(player2_id) = request.player2_id {
            self.ensure_player_exists(player2_id).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl GameService for GameServiceImpl {
    async fn create_game(&self, request: CreateGameRequest) -> ServiceResult<Game> {
        self.check_no_active_game(&request).await?;
        self.validate_players(&request).await?;

        let game = build_game(&request)?;
        self.games.insert(&game).await?;
        log::info!(
            "Created {} game {} for player {}",
            game.game_mode.as_str(),
            game.id,
            game.player1_id
        );
        Ok(game)
    }

    async fn complete_game(&self, id: GameId) -> ServiceResult<Option<Game>> {
        let completed = self.games.complete(id).await?;
        if let Some(game) = &completed {
            log::info!("Completed game {}", game.id);
        }
        Ok(completed)
    }
}

#[derive(Default, Clone)]
pub struct MockGameRepository {
    games: Arc<std::sync::Mutex<Vec<Game>>>,
}

impl MockGameRepository {
    pub fn all(&self) -> Vec<Game> {
        self.games.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GameRepository for MockGameRepository {
    async fn insert(&self, game: &Game) -> ServiceResult<()> {
        self.games.lock().unwrap().push(game.clone());
        Ok(())
    }

    async fn find_active_between(
        &self,
        player1_id: AccountId,
        player2_id: Option<AccountId>,
    ) -> ServiceResult<Option<Game>> {
        Ok(self
            .games
            .lock()
            .unwrap()
            .iter()
            .find(|g| {
                g.game_status == GameStatus::Active
                    && ((g.player1_id == player1_id && g.player2_id == player2_id)
                        || (player2_id.is_some()
                            && g.player2_id == Some(player1_id)
                            && Some(g.player1_id) == player2_id))
            })
            .cloned())
    }

    async fn complete(&self, id: GameId) -> ServiceResult<Option<Game>> {
        let mut games = self.games.lock().unwrap();
        match games.iter_mut().find(|g| g.id == id) {
            Some(game) => {
                game.game_status = GameStatus::Completed;
                game.completed_at = Some(Utc::now());
                Ok(Some(game.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Directory that knows a fixed set of player ids.
#[derive(Default, Clone)]
pub struct MockPlayerDirectory {
    pub known_players: Arc<std::sync::Mutex<Vec<AccountId>>>,
}

impl MockPlayerDirectory {
    pub fn with_players(ids: &[AccountId]) -> Self {
        Self {
            known_players: Arc::new(std::sync::Mutex::new(ids.to_vec())),
        }
    }
}

#[async_trait::async_trait]
impl PlayerDirectory for MockPlayerDirectory {
    async fn player_exists(&self, id: AccountId) -> ServiceResult<bool> {
        Ok(self.known_players.lock().unwrap().contains(&id))
    }
}
