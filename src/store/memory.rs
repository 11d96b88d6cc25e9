//! Store kept in process memory, used when no database is configured and by
//! the tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Mutex;

use crate::engine::layout::Layout;
use crate::engine::registry::{is_open_between, plan_challenge, ChallengePlan};
use crate::engine::turn::TurnAuthority;
use crate::models::battle::{Battle, BattleId, BattleStatus};
use crate::models::board::{Board, BoardId, Marker};
use crate::models::player::{Player, PlayerId};
use crate::store::{Store, StoreError, StrikeCommit};

#[derive(Default)]
struct Tables {
    players: HashMap<PlayerId, Player>,
    boards: HashMap<BoardId, Board>,
    battles: HashMap<BattleId, Battle>,
    markers: HashMap<(BattleId, BoardId), Vec<Marker>>,
    last_player: PlayerId,
    last_board: BoardId,
    last_battle: BattleId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Makes every following write fail, as if the storage had gone away.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes are switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_player(
        &self,
        screen_name: &str,
        password_hash: &str,
    ) -> Result<PlayerId, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables
            .players
            .values()
            .any(|player| player.screen_name == screen_name)
        {
            return Err(StoreError::Duplicate);
        }
        tables.last_player += 1;
        let id = tables.last_player;
        tables.players.insert(
            id,
            Player {
                id,
                screen_name: screen_name.to_string(),
                password_hash: password_hash.to_string(),
                created: Local::now(),
            },
        );
        Ok(id)
    }

    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        Ok(self.tables.lock().await.players.get(&id).cloned())
    }

    async fn player_by_name(&self, screen_name: &str) -> Result<Option<Player>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .players
            .values()
            .find(|player| player.screen_name == screen_name)
            .cloned())
    }

    async fn players(&self) -> Result<Vec<Player>, StoreError> {
        let mut players: Vec<Player> = self.tables.lock().await.players.values().cloned().collect();
        players.sort_by(|a, b| a.screen_name.cmp(&b.screen_name));
        Ok(players)
    }

    async fn insert_board(
        &self,
        player: PlayerId,
        name: &str,
        layout: &Layout,
    ) -> Result<BoardId, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        tables.last_board += 1;
        let id = tables.last_board;
        tables.boards.insert(
            id,
            Board {
                id,
                player_id: player,
                name: name.to_string(),
                created: Local::now(),
                layout: layout.clone(),
            },
        );
        Ok(id)
    }

    async fn board(&self, id: BoardId) -> Result<Option<Board>, StoreError> {
        Ok(self.tables.lock().await.boards.get(&id).cloned())
    }

    async fn boards_of(&self, player: PlayerId) -> Result<Vec<Board>, StoreError> {
        let mut boards: Vec<Board> = self
            .tables
            .lock()
            .await
            .boards
            .values()
            .filter(|board| board.player_id == player)
            .cloned()
            .collect();
        boards.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(boards)
    }

    async fn open_challenge(
        &self,
        challenger: PlayerId,
        challenger_board: BoardId,
        opponent: PlayerId,
    ) -> Result<BattleId, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let open = tables
            .battles
            .values()
            .find(|battle| is_open_between(battle, challenger, opponent));

        match plan_challenge(open, challenger) {
            ChallengePlan::Keep(id) => Ok(id),
            ChallengePlan::RefreshBoard(id) => {
                let battle = tables.battles.get_mut(&id).ok_or(StoreError::Conflict)?;
                battle.challenger_board_id = challenger_board;
                Ok(id)
            }
            ChallengePlan::Create => {
                tables.last_battle += 1;
                let id = tables.last_battle;
                tables.battles.insert(
                    id,
                    Battle {
                        id,
                        challenger_id: challenger,
                        challenger_board_id: challenger_board,
                        opponent_id: opponent,
                        opponent_board_id: None,
                        status: BattleStatus::Pending,
                        turn: None,
                        challenger_sunk: 0,
                        opponent_sunk: 0,
                        winner: None,
                        challenged: Local::now(),
                    },
                );
                Ok(id)
            }
        }
    }

    async fn battle(&self, id: BattleId) -> Result<Option<Battle>, StoreError> {
        Ok(self.tables.lock().await.battles.get(&id).cloned())
    }

    async fn battles_of(&self, player: PlayerId) -> Result<Vec<Battle>, StoreError> {
        let mut battles: Vec<Battle> = self
            .tables
            .lock()
            .await
            .battles
            .values()
            .filter(|battle| battle.is_participant(player))
            .cloned()
            .collect();
        battles.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(battles)
    }

    async fn accept_battle(
        &self,
        id: BattleId,
        opponent: PlayerId,
        opponent_board: BoardId,
        turn: &TurnAuthority,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let battle = tables
            .battles
            .get_mut(&id)
            .filter(|battle| battle.status == BattleStatus::Pending && battle.opponent_id == opponent)
            .ok_or(StoreError::Conflict)?;
        battle.opponent_board_id = Some(opponent_board);
        battle.status = BattleStatus::Active;
        battle.turn = Some(turn.clone());
        Ok(())
    }

    async fn decline_battle(&self, id: BattleId, opponent: PlayerId) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let battle = tables
            .battles
            .get_mut(&id)
            .filter(|battle| battle.status == BattleStatus::Pending && battle.opponent_id == opponent)
            .ok_or(StoreError::Conflict)?;
        battle.status = BattleStatus::Declined;
        Ok(())
    }

    async fn markers(&self, battle: BattleId, board: BoardId) -> Result<Vec<Marker>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .markers
            .get(&(battle, board))
            .cloned()
            .unwrap_or_default())
    }

    async fn commit_strike(&self, commit: &StrikeCommit) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let Tables {
            battles, markers, ..
        } = &mut *tables;

        let battle = battles.get_mut(&commit.battle.id).ok_or(StoreError::Conflict)?;
        let current = battle
            .turn
            .as_ref()
            .map(|turn| turn.token() == &commit.expected_token)
            .unwrap_or(false);
        if !current || battle.winner.is_some() {
            return Err(StoreError::Conflict);
        }

        let struck = markers.entry((commit.battle.id, commit.board_id)).or_default();
        if struck.iter().any(|marker| marker.cell == commit.marker.cell) {
            return Err(StoreError::Conflict);
        }
        struck.push(commit.marker);

        battle.turn = commit.battle.turn.clone();
        battle.challenger_sunk = commit.battle.challenger_sunk;
        battle.opponent_sunk = commit.battle.opponent_sunk;
        battle.status = commit.battle.status;
        battle.winner = commit.battle.winner;
        Ok(())
    }
}
