use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;
use crate::engine::turn::TurnAuthority;
use crate::models::board::{BoardId, Marker};
use crate::models::player::PlayerId;

pub type BattleId = u32;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BattleStatus {
    Pending,
    Active,
    Complete,
    Declined,
}

impl BattleStatus {
    pub fn from_code(code: u8) -> Option<BattleStatus> {
        match code {
            0 => Some(BattleStatus::Pending),
            1 => Some(BattleStatus::Active),
            2 => Some(BattleStatus::Complete),
            3 => Some(BattleStatus::Declined),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Pending and active battles block a new challenge between the same pair.
    pub fn is_open(self) -> bool {
        matches!(self, BattleStatus::Pending | BattleStatus::Active)
    }
}

/// A challenge between two players and, once accepted, the game they play.
#[derive(Debug, Clone)]
pub struct Battle {
    pub id: BattleId,
    pub challenger_id: PlayerId,
    pub challenger_board_id: BoardId,
    pub opponent_id: PlayerId,
    pub opponent_board_id: Option<BoardId>,
    pub status: BattleStatus,
    pub turn: Option<TurnAuthority>,
    /// Ships of the challenger sunk so far.
    pub challenger_sunk: u8,
    /// Ships of the opponent sunk so far.
    pub opponent_sunk: u8,
    pub winner: Option<PlayerId>,
    pub challenged: chrono::DateTime<Local>,
}

impl Battle {
    pub fn is_participant(&self, player: PlayerId) -> bool {
        player == self.challenger_id || player == self.opponent_id
    }

    pub fn other_player(&self, player: PlayerId) -> Result<PlayerId, EngineError> {
        if player == self.challenger_id {
            Ok(self.opponent_id)
        } else if player == self.opponent_id {
            Ok(self.challenger_id)
        } else {
            Err(EngineError::NotParticipant)
        }
    }

    /// The board a participant plays with. The opponent has none until they
    /// accept.
    pub fn board_of(&self, player: PlayerId) -> Option<BoardId> {
        if player == self.challenger_id {
            Some(self.challenger_board_id)
        } else if player == self.opponent_id {
            self.opponent_board_id
        } else {
            None
        }
    }

    /// The participant whose board `board` is.
    pub fn owner_of_board(&self, board: BoardId) -> Option<PlayerId> {
        if board == self.challenger_board_id {
            Some(self.challenger_id)
        } else if Some(board) == self.opponent_board_id {
            Some(self.opponent_id)
        } else {
            None
        }
    }

    pub fn sunk_count(&self, defender: PlayerId) -> u8 {
        if defender == self.challenger_id {
            self.challenger_sunk
        } else {
            self.opponent_sunk
        }
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some() || self.status == BattleStatus::Complete
    }
}

/// What a participant sees when listing their battles.
#[derive(Serialize, Debug, Clone)]
pub struct BattleSummary {
    pub id: BattleId,
    pub challenger_id: PlayerId,
    pub challenger_board_id: BoardId,
    pub opponent_id: PlayerId,
    pub opponent_board_id: Option<BoardId>,
    pub status: BattleStatus,
    pub mover: Option<PlayerId>,
    pub challenger_sunk: u8,
    pub opponent_sunk: u8,
    pub winner: Option<PlayerId>,
    pub challenged: chrono::DateTime<Local>,
}

impl From<&Battle> for BattleSummary {
    fn from(battle: &Battle) -> Self {
        BattleSummary {
            id: battle.id,
            challenger_id: battle.challenger_id,
            challenger_board_id: battle.challenger_board_id,
            opponent_id: battle.opponent_id,
            opponent_board_id: battle.opponent_board_id,
            status: battle.status,
            mover: battle.turn.as_ref().map(TurnAuthority::mover),
            challenger_sunk: battle.challenger_sunk,
            opponent_sunk: battle.opponent_sunk,
            winner: battle.winner,
            challenged: battle.challenged,
        }
    }
}

/// Revealed markers of one board plus enough turn state for a client to tell
/// whether it may strike now.
#[derive(Serialize, Debug, Clone)]
pub struct MarkerPoll {
    pub battle_id: BattleId,
    pub board_id: BoardId,
    pub status: BattleStatus,
    pub mover: Option<PlayerId>,
    /// Only handed to the player who holds the move.
    pub turn_token: Option<String>,
    pub winner: Option<PlayerId>,
    pub markers: Vec<Marker>,
}

// The struct used for a new challenge
#[derive(Deserialize, Serialize, Debug)]
pub struct NewChallenge {
    pub board_id: BoardId,
    pub opponent_id: PlayerId,
}

// The struct used to accept a challenge
#[derive(Deserialize, Serialize, Debug)]
pub struct Acceptance {
    pub board_id: BoardId,
}

// The struct used for firing at a cell
#[derive(Deserialize, Serialize, Debug)]
pub struct StrikeRequest {
    pub board_id: BoardId,
    pub row: u8,
    pub col: char,
    pub token: String,
}
