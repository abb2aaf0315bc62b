use std::sync::Arc;

use grid_wars_domain::{
    account::{AccountServiceImpl, ArcAccountRepository, ArcAccountService},
    game::{AccountPlayerDirectory, ArcGameRepository, ArcGameService, ArcPlayerDirectory, GameServiceImpl},
    token::ArcTokenIssuer,
    upload::ArcImageStorage,
};

use crate::{config::ServerConfig, jwt::JwtAuthService};

#[derive(Clone)]
pub struct AppState {
    pub account_service: ArcAccountService,
    pub game_service: ArcGameService,
    pub token_issuer: ArcTokenIssuer,
}

pub fn construct_app(
    config: &ServerConfig,
    account_repository: ArcAccountRepository,
    game_repository: ArcGameRepository,
    image_storage: ArcImageStorage,
) -> AppState {
    let token_issuer: ArcTokenIssuer = Arc::new(Box::new(JwtAuthService::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl,
    )));

    let account_service: ArcAccountService = Arc::new(Box::new(AccountServiceImpl::new(
        account_repository.clone(),
        token_issuer.clone(),
        image_storage,
    )));

    let player_directory: ArcPlayerDirectory =
        Arc::new(Box::new(AccountPlayerDirectory::new(account_repository)));
    let game_service: ArcGameService = Arc::new(Box::new(GameServiceImpl::new(
        game_repository,
        player_directory,
    )));

    AppState {
        account_service,
        game_service,
        token_issuer,
    }
}
