use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;

/// Number of rows and columns on every board.
pub const GRID_SIZE: u8 = 10;

/// Column letters in board order.
pub const COLUMNS: [char; GRID_SIZE as usize] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

/// The closed catalog of ships every board carries exactly once.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    pub const ALL: [ShipKind; 5] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Cruiser,
        ShipKind::Submarine,
        ShipKind::Destroyer,
    ];

    /// Number of cells the ship occupies.
    pub fn length(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }

    /// Single letter used when a layout is drawn on a grid. The cruiser is `R`
    /// so it does not clash with the carrier.
    pub fn symbol(self) -> char {
        match self {
            ShipKind::Carrier => 'C',
            ShipKind::Battleship => 'B',
            ShipKind::Cruiser => 'R',
            ShipKind::Submarine => 'S',
            ShipKind::Destroyer => 'D',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<ShipKind> {
        match symbol.to_ascii_uppercase() {
            'C' => Some(ShipKind::Carrier),
            'B' => Some(ShipKind::Battleship),
            'R' => Some(ShipKind::Cruiser),
            'S' => Some(ShipKind::Submarine),
            'D' => Some(ShipKind::Destroyer),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "carrier",
            ShipKind::Battleship => "battleship",
            ShipKind::Cruiser => "cruiser",
            ShipKind::Submarine => "submarine",
            ShipKind::Destroyer => "destroyer",
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cell on the 10×10 grid. Rows run 1 to 10, columns A to J. Ordering is
/// row-major.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    row: u8,
    col: char,
}

impl Coordinate {
    pub fn new(row: u8, col: char) -> Result<Coordinate, EngineError> {
        let col = col.to_ascii_uppercase();
        if !(1..=GRID_SIZE).contains(&row) || !COLUMNS.contains(&col) {
            return Err(EngineError::InvalidCoordinate { row, col });
        }
        Ok(Coordinate { row, col })
    }

    /// Builds a coordinate from zero-based grid indices.
    pub fn from_index(row_index: u8, col_index: u8) -> Option<Coordinate> {
        if row_index >= GRID_SIZE || col_index >= GRID_SIZE {
            return None;
        }
        Some(Coordinate {
            row: row_index + 1,
            col: COLUMNS[col_index as usize],
        })
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> char {
        self.col
    }

    pub fn row_index(&self) -> u8 {
        self.row - 1
    }

    pub fn col_index(&self) -> u8 {
        self.col as u8 - b'A'
    }

    /// Position of the cell in a row-major bitmap of the grid.
    pub fn cell_index(&self) -> usize {
        self.row_index() as usize * GRID_SIZE as usize + self.col_index() as usize
    }

    /// The cell one column to the right, if still on the grid.
    pub fn next_col(&self) -> Option<Coordinate> {
        Coordinate::from_index(self.row_index(), self.col_index() + 1)
    }

    /// The cell one row down, if still on the grid.
    pub fn next_row(&self) -> Option<Coordinate> {
        Coordinate::from_index(self.row_index() + 1, self.col_index())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.col)
    }
}
