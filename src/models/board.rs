use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::engine::layout::{Layout, ShipCell};
use crate::engine::ships::{Coordinate, ShipKind};
use crate::models::player::PlayerId;

pub type BoardId = u32;

/// A player's named grid with its validated fleet.
#[derive(Serialize, Debug, Clone)]
pub struct Board {
    pub id: BoardId,
    pub player_id: PlayerId,
    pub name: String,
    pub created: chrono::DateTime<Local>,
    #[serde(skip)]
    pub layout: Layout,
}

/// Recorded outcome of a strike at one cell. `None` only shows up in
/// projections, for cells nobody has fired at.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PinColor {
    None,
    Miss,
    Hit,
}

impl PinColor {
    pub fn from_code(code: u8) -> Option<PinColor> {
        match code {
            0 => Some(PinColor::None),
            1 => Some(PinColor::Miss),
            2 => Some(PinColor::Hit),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A struck cell on a board within one battle.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    #[serde(flatten)]
    pub cell: Coordinate,
    pub pin: PinColor,
}

// The struct used for receiving a new board as json
#[derive(Deserialize, Debug)]
pub struct NewBoard {
    pub name: String,
    pub cells: Vec<ShipCell>,
}

/// One cell of a board as its owner sees it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OwnCell {
    #[serde(flatten)]
    pub cell: Coordinate,
    pub ship: Option<ShipKind>,
    pub pin: PinColor,
}

/// The owner's view of a board: every ship cell, plus the strikes received in
/// a battle when one is given.
#[derive(Serialize, Debug, Clone)]
pub struct OwnLayout {
    pub board_id: BoardId,
    pub name: String,
    pub cells: Vec<OwnCell>,
}

/// Board names are 1 to 32 characters.
pub fn valid_board_name(name: &str) -> bool {
    let length = name.trim().chars().count();
    (1..=32).contains(&length)
}
