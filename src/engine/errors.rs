//! Errors produced by the battle engine.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::engine::ships::{Coordinate, ShipKind};
use crate::store::StoreError;

/// One problem found while validating a proposed layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShipViolation {
    TooFew { ship: ShipKind, required: usize, found: usize },
    TooMany { ship: ShipKind, required: usize, found: usize },
    /// The ship's cells do not form one straight, unbroken run.
    BadShape { ship: ShipKind },
    /// More than one entry was given for the same cell. `ship` is the ship of
    /// the entry that came second.
    Overlap { cell: Coordinate, ship: ShipKind },
    OffGrid { row: u8, col: char },
    UnknownShip { symbol: char },
}

impl ShipViolation {
    /// The ship this violation belongs to, if it belongs to one.
    pub fn ship(&self) -> Option<ShipKind> {
        match self {
            ShipViolation::TooFew { ship, .. }
            | ShipViolation::TooMany { ship, .. }
            | ShipViolation::BadShape { ship }
            | ShipViolation::Overlap { ship, .. } => Some(*ship),
            _ => None,
        }
    }
}

impl fmt::Display for ShipViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipViolation::TooFew { ship, required, found } => write!(
                f,
                "The number of coordinates for {} is too low. We need {}, got {}",
                ship, required, found
            ),
            ShipViolation::TooMany { ship, required, found } => write!(
                f,
                "The number of coordinates for {} is too high. We need {}, got {}",
                ship, required, found
            ),
            ShipViolation::BadShape { ship } => write!(
                f,
                "The {} must be one straight line of {} cells",
                ship,
                ship.length()
            ),
            ShipViolation::Overlap { cell, ship } => {
                write!(f, "Cell {} of the {} is already taken", cell, ship)
            }
            ShipViolation::OffGrid { row, col } => {
                write!(f, "Cell {}{} is not on the board", row, col)
            }
            ShipViolation::UnknownShip { symbol } => {
                write!(f, "'{}' is not a ship, use one of C, B, R, S or D", symbol)
            }
        }
    }
}

/// Broad classes of engine failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Conflict,
    NotFound,
    Persistence,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid layout: {} problem(s)", .0.len())]
    InvalidLayout(Vec<ShipViolation>),
    #[error("board name must be between 1 and 32 characters")]
    InvalidBoardName,
    #[error("screen name must be between 1 and 16 characters without whitespace")]
    InvalidScreenName,
    #[error("{row}{col} is not on the board")]
    InvalidCoordinate { row: u8, col: char },

    #[error("player does not match the challenged player")]
    PlayerMismatch,
    #[error("not your turn")]
    NotYourTurn,
    #[error("board belongs to another player")]
    NotBoardOwner,
    #[error("player is not part of this battle")]
    NotParticipant,
    #[error("board is not the opponent's board in this battle")]
    NotOpponentBoard,
    #[error("board is not part of this battle")]
    BoardNotInBattle,

    #[error("battle has already been decided")]
    BattleAlreadyDecided,
    #[error("battle is not active")]
    BattleNotActive,
    #[error("battle is no longer waiting for an answer")]
    BattleNotPending,
    #[error("a player cannot challenge themselves")]
    SelfChallenge,
    #[error("screen name is already taken")]
    ScreenNameTaken,

    #[error("battle not found")]
    BattleNotFound,
    #[error("board not found")]
    BoardNotFound,
    #[error("player not found")]
    PlayerNotFound,

    #[error("storage failure: {0}")]
    Persistence(#[from] StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidLayout(_)
            | EngineError::InvalidBoardName
            | EngineError::InvalidScreenName
            | EngineError::InvalidCoordinate { .. } => ErrorKind::Validation,
            EngineError::PlayerMismatch
            | EngineError::NotYourTurn
            | EngineError::NotBoardOwner
            | EngineError::NotParticipant
            | EngineError::NotOpponentBoard
            | EngineError::BoardNotInBattle => ErrorKind::Authorization,
            EngineError::BattleAlreadyDecided
            | EngineError::BattleNotActive
            | EngineError::BattleNotPending
            | EngineError::SelfChallenge
            | EngineError::ScreenNameTaken => ErrorKind::Conflict,
            EngineError::BattleNotFound
            | EngineError::BoardNotFound
            | EngineError::PlayerNotFound => ErrorKind::NotFound,
            EngineError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
