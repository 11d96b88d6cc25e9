//! The battle engine.
//!
//! Validates layouts, opens and answers challenges, keeps the turn and resolves
//! strikes. All state lives behind a [`Store`]; the engine itself holds none,
//! so one instance is shared by every request handler.

use std::sync::Arc;

use log::info;

use crate::models::board::{valid_board_name, Board, BoardId};
use crate::models::player::{valid_screen_name, Player, PlayerId};
use crate::store::{Store, StoreError};

pub mod errors;
pub mod layout;
pub mod query;
pub mod registry;
pub mod ships;
pub mod strike;
pub mod turn;

use self::errors::EngineError;
use self::layout::{validate_layout, ShipCell};

pub struct Engine {
    store: Arc<dyn Store>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>) -> Engine {
        Engine { store }
    }

    pub async fn register_player(
        &self,
        screen_name: &str,
        password_hash: &str,
    ) -> Result<PlayerId, EngineError> {
        if !valid_screen_name(screen_name) {
            return Err(EngineError::InvalidScreenName);
        }
        match self.store.insert_player(screen_name, password_hash).await {
            Ok(id) => {
                info!("Registered player {} as {}", screen_name, id);
                Ok(id)
            }
            Err(StoreError::Duplicate) => Err(EngineError::ScreenNameTaken),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_player(&self, screen_name: &str) -> Result<Player, EngineError> {
        self.store
            .player_by_name(screen_name)
            .await?
            .ok_or(EngineError::PlayerNotFound)
    }

    pub async fn list_players(&self) -> Result<Vec<Player>, EngineError> {
        Ok(self.store.players().await?)
    }

    /// Validates a layout and stores it as a new board for `player`. Nothing is
    /// stored when any ship is wrong.
    pub async fn submit_layout(
        &self,
        player: PlayerId,
        board_name: &str,
        cells: &[ShipCell],
    ) -> Result<BoardId, EngineError> {
        if !valid_board_name(board_name) {
            return Err(EngineError::InvalidBoardName);
        }
        self.player(player).await?;
        let layout = validate_layout(cells)?;
        let id = self
            .store
            .insert_board(player, board_name.trim(), &layout)
            .await?;
        info!("Player {} stored board {} ({})", player, id, board_name);
        Ok(id)
    }

    pub async fn list_boards(&self, player: PlayerId) -> Result<Vec<Board>, EngineError> {
        Ok(self.store.boards_of(player).await?)
    }

    async fn player(&self, id: PlayerId) -> Result<Player, EngineError> {
        self.store.player(id).await?.ok_or(EngineError::PlayerNotFound)
    }

    async fn board(&self, id: BoardId) -> Result<Board, EngineError> {
        self.store.board(id).await?.ok_or(EngineError::BoardNotFound)
    }

    /// A board that has to belong to `owner`.
    async fn owned_board(&self, owner: PlayerId, id: BoardId) -> Result<Board, EngineError> {
        let board = self.board(id).await?;
        if board.player_id != owner {
            return Err(EngineError::NotBoardOwner);
        }
        Ok(board)
    }
}
