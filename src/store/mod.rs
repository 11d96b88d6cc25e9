//! Persistence seam of the engine.
//!
//! Every method that changes more than one record does so atomically: either
//! the whole change becomes visible or none of it does.

use async_trait::async_trait;
use thiserror::Error;

use crate::engine::layout::Layout;
use crate::engine::turn::{TurnAuthority, TurnToken};
use crate::models::battle::{Battle, BattleId};
use crate::models::board::{Board, BoardId, Marker};
use crate::models::player::{Player, PlayerId};

pub mod memory;
pub mod mysql;

pub use self::memory::MemoryStore;
pub use self::mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A conditional write found the record in a different state than expected.
    #[error("record changed before the write could be applied")]
    Conflict,
    #[error("record already exists")]
    Duplicate,
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything a single accepted strike changes, written as one unit.
#[derive(Debug, Clone)]
pub struct StrikeCommit {
    pub board_id: BoardId,
    /// The token the strike was authorized with. The commit only applies while
    /// it is still the battle's current token.
    pub expected_token: TurnToken,
    pub marker: Marker,
    /// The battle after the strike: new turn, sunk counters, status and winner.
    pub battle: Battle,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the screen name is taken.
    async fn insert_player(&self, screen_name: &str, password_hash: &str)
        -> Result<PlayerId, StoreError>;
    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError>;
    async fn player_by_name(&self, screen_name: &str) -> Result<Option<Player>, StoreError>;
    async fn players(&self) -> Result<Vec<Player>, StoreError>;

    /// Stores the board together with all of its ship cells.
    async fn insert_board(
        &self,
        player: PlayerId,
        name: &str,
        layout: &Layout,
    ) -> Result<BoardId, StoreError>;
    async fn board(&self, id: BoardId) -> Result<Option<Board>, StoreError>;
    /// Newest first.
    async fn boards_of(&self, player: PlayerId) -> Result<Vec<Board>, StoreError>;

    /// Opens a challenge, or reuses the open battle between the pair as
    /// decided by [`crate::engine::registry::plan_challenge`].
    async fn open_challenge(
        &self,
        challenger: PlayerId,
        challenger_board: BoardId,
        opponent: PlayerId,
    ) -> Result<BattleId, StoreError>;
    async fn battle(&self, id: BattleId) -> Result<Option<Battle>, StoreError>;
    /// Every battle the player takes part in, on either side, newest first.
    async fn battles_of(&self, player: PlayerId) -> Result<Vec<Battle>, StoreError>;
    /// Activates a pending battle for its recorded opponent. [`StoreError::Conflict`]
    /// when the battle is no longer pending for that player.
    async fn accept_battle(
        &self,
        id: BattleId,
        opponent: PlayerId,
        opponent_board: BoardId,
        turn: &TurnAuthority,
    ) -> Result<(), StoreError>;
    /// Same conditions as [`Store::accept_battle`].
    async fn decline_battle(&self, id: BattleId, opponent: PlayerId) -> Result<(), StoreError>;

    async fn markers(&self, battle: BattleId, board: BoardId) -> Result<Vec<Marker>, StoreError>;
    /// Applies a strike if the battle still carries `expected_token` and has no
    /// winner, otherwise fails with [`StoreError::Conflict`] and changes nothing.
    async fn commit_strike(&self, commit: &StrikeCommit) -> Result<(), StoreError>;
}
