//! Board validation.
//!
//! A proposed layout arrives as a flat list of `(row, column, ship symbol)`
//! entries, the way a player fills in a grid. [`validate_layout`] turns it into
//! a [`Layout`] or reports every problem it found, grouped by ship where the
//! problem belongs to one.

use std::collections::BTreeMap;

use bit_vec::BitVec;
use serde::Deserialize;

use crate::engine::errors::{EngineError, ShipViolation};
use crate::engine::ships::{Coordinate, ShipKind, GRID_SIZE};

/// One filled-in cell of a proposed layout.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipCell {
    pub row: u8,
    pub col: char,
    pub ship: char,
}

impl ShipCell {
    pub fn new(row: u8, col: char, ship: char) -> ShipCell {
        ShipCell { row, col, ship }
    }
}

/// A complete, validated placement of the fleet. Only [`validate_layout`] and
/// the stores (re-reading what was validated before) build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    cells: BTreeMap<Coordinate, ShipKind>,
}

impl Layout {
    pub(crate) fn from_cells(cells: impl IntoIterator<Item = (Coordinate, ShipKind)>) -> Layout {
        Layout {
            cells: cells.into_iter().collect(),
        }
    }

    /// The ship occupying `cell`, if any.
    pub fn ship_at(&self, cell: Coordinate) -> Option<ShipKind> {
        self.cells.get(&cell).copied()
    }

    /// Every cell of the given ship, in row-major order.
    pub fn cells_of(&self, kind: ShipKind) -> impl Iterator<Item = Coordinate> + '_ {
        self.cells
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(cell, _)| *cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, ShipKind)> + '_ {
        self.cells.iter().map(|(cell, kind)| (*cell, *kind))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Validates a proposed layout. On failure every violation is returned, not
/// only the first one.
pub fn validate_layout(cells: &[ShipCell]) -> Result<Layout, EngineError> {
    let mut violations = Vec::new();
    let mut occupied = BitVec::from_elem((GRID_SIZE as usize) * (GRID_SIZE as usize), false);
    let mut ships: BTreeMap<ShipKind, Vec<Coordinate>> = BTreeMap::new();

    for cell in cells {
        let coordinate = match Coordinate::new(cell.row, cell.col) {
            Ok(coordinate) => coordinate,
            Err(_) => {
                violations.push(ShipViolation::OffGrid {
                    row: cell.row,
                    col: cell.col,
                });
                continue;
            }
        };
        let kind = match ShipKind::from_symbol(cell.ship) {
            Some(kind) => kind,
            None => {
                violations.push(ShipViolation::UnknownShip { symbol: cell.ship });
                continue;
            }
        };
        if occupied.get(coordinate.cell_index()).unwrap_or(false) {
            let overlap = ShipViolation::Overlap {
                cell: coordinate,
                ship: kind,
            };
            if !violations.contains(&overlap) {
                violations.push(overlap);
            }
            continue;
        }
        occupied.set(coordinate.cell_index(), true);
        ships.entry(kind).or_default().push(coordinate);
    }

    for kind in ShipKind::ALL {
        let placed = ships.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        let required = kind.length();
        if placed.len() < required {
            violations.push(ShipViolation::TooFew {
                ship: kind,
                required,
                found: placed.len(),
            });
        } else if placed.len() > required {
            violations.push(ShipViolation::TooMany {
                ship: kind,
                required,
                found: placed.len(),
            });
        } else if !is_straight_run(placed) {
            violations.push(ShipViolation::BadShape { ship: kind });
        }
    }

    if !violations.is_empty() {
        return Err(EngineError::InvalidLayout(violations));
    }

    Ok(Layout::from_cells(ships.into_iter().flat_map(|(kind, coordinates)| {
        coordinates.into_iter().map(move |coordinate| (coordinate, kind))
    })))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

/// Walks the ship from its top-left cell one step at a time. The first step
/// found fixes the axis; every later step must continue along it.
fn is_straight_run(cells: &[Coordinate]) -> bool {
    let seed = match cells.iter().min() {
        Some(seed) => *seed,
        None => return false,
    };
    let mut current = seed;
    let mut axis: Option<Axis> = None;
    let mut remaining = cells.len() - 1;

    while remaining > 0 {
        let along_row = current.next_col().filter(|next| cells.contains(next));
        let along_column = current.next_row().filter(|next| cells.contains(next));
        let step = match axis {
            None => match (along_row, along_column) {
                (Some(next), _) => {
                    axis = Some(Axis::Row);
                    Some(next)
                }
                (None, Some(next)) => {
                    axis = Some(Axis::Column);
                    Some(next)
                }
                (None, None) => None,
            },
            Some(Axis::Row) => along_row,
            Some(Axis::Column) => along_column,
        };
        match step {
            Some(next) => current = next,
            None => return false,
        }
        remaining -= 1;
    }
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Carrier on row 1, battleship on row 3, cruiser on row 5, submarine down
    /// column J, destroyer on row 10.
    pub(crate) fn standard_cells() -> Vec<ShipCell> {
        let mut cells = Vec::new();
        for col in ['A', 'B', 'C', 'D', 'E'] {
            cells.push(ShipCell::new(1, col, 'C'));
        }
        for col in ['B', 'C', 'D', 'E'] {
            cells.push(ShipCell::new(3, col, 'B'));
        }
        for col in ['C', 'D', 'E'] {
            cells.push(ShipCell::new(5, col, 'R'));
        }
        for row in [6, 7, 8] {
            cells.push(ShipCell::new(row, 'J', 'S'));
        }
        for col in ['A', 'B'] {
            cells.push(ShipCell::new(10, col, 'D'));
        }
        cells
    }

    fn violations(cells: &[ShipCell]) -> Vec<ShipViolation> {
        match validate_layout(cells) {
            Err(EngineError::InvalidLayout(violations)) => violations,
            other => panic!("expected layout violations, got {:?}", other),
        }
    }

    #[test]
    fn standard_layout_is_accepted() {
        let layout = validate_layout(&standard_cells()).unwrap();
        assert_eq!(layout.len(), 17);
        assert_eq!(
            layout.ship_at(Coordinate::new(7, 'J').unwrap()),
            Some(ShipKind::Submarine)
        );
        assert_eq!(layout.ship_at(Coordinate::new(2, 'A').unwrap()), None);
        assert_eq!(layout.cells_of(ShipKind::Destroyer).count(), 2);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut cells = standard_cells();
        cells.reverse();
        assert!(validate_layout(&cells).is_ok());
    }

    #[test]
    fn every_removed_cell_is_reported_against_its_ship() {
        let cells = standard_cells();
        for skip in 0..cells.len() {
            let mut fewer = cells.clone();
            let removed = fewer.remove(skip);
            let kind = ShipKind::from_symbol(removed.ship).unwrap();
            let found = violations(&fewer);
            assert_eq!(
                found,
                vec![ShipViolation::TooFew {
                    ship: kind,
                    required: kind.length(),
                    found: kind.length() - 1,
                }]
            );
        }
    }

    #[test]
    fn duplicated_cell_is_reported_against_its_ship() {
        let mut cells = standard_cells();
        cells.push(ShipCell::new(1, 'A', 'C'));
        assert_eq!(
            violations(&cells),
            vec![ShipViolation::Overlap {
                cell: Coordinate::new(1, 'A').unwrap(),
                ship: ShipKind::Carrier,
            }]
        );

        let mut cells = standard_cells();
        cells.push(ShipCell::new(10, 'A', 'D'));
        let found = violations(&cells);
        assert!(found
            .iter()
            .any(|violation| violation.ship() == Some(ShipKind::Destroyer)));
    }

    #[test]
    fn ships_crossing_each_other_are_rejected() {
        let mut cells = standard_cells();
        // Move the destroyer onto the carrier.
        cells.retain(|cell| cell.ship != 'D');
        cells.push(ShipCell::new(1, 'A', 'D'));
        cells.push(ShipCell::new(2, 'A', 'D'));
        let found = violations(&cells);
        assert!(found.contains(&ShipViolation::Overlap {
            cell: Coordinate::new(1, 'A').unwrap(),
            ship: ShipKind::Destroyer,
        }));
        assert!(found.contains(&ShipViolation::TooFew {
            ship: ShipKind::Destroyer,
            required: 2,
            found: 1,
        }));
    }

    #[test]
    fn surplus_cell_is_too_many() {
        let mut cells = standard_cells();
        cells.push(ShipCell::new(10, 'C', 'D'));
        assert_eq!(
            violations(&cells),
            vec![ShipViolation::TooMany {
                ship: ShipKind::Destroyer,
                required: 2,
                found: 3,
            }]
        );
    }

    #[test]
    fn every_failing_ship_is_listed() {
        let cells: Vec<ShipCell> = standard_cells()
            .into_iter()
            .filter(|cell| cell.ship != 'C' && cell.ship != 'S')
            .collect();
        let found = violations(&cells);
        let ships: Vec<_> = found.iter().filter_map(ShipViolation::ship).collect();
        assert_eq!(ships, vec![ShipKind::Carrier, ShipKind::Submarine]);
    }

    #[test]
    fn gaps_and_bends_are_bad_shapes() {
        let mut gap = standard_cells();
        gap.retain(|cell| cell.ship != 'R');
        gap.extend([
            ShipCell::new(5, 'C', 'R'),
            ShipCell::new(5, 'D', 'R'),
            ShipCell::new(5, 'F', 'R'),
        ]);
        assert_eq!(
            violations(&gap),
            vec![ShipViolation::BadShape {
                ship: ShipKind::Cruiser
            }]
        );

        let mut bend = standard_cells();
        bend.retain(|cell| cell.ship != 'B');
        bend.extend([
            ShipCell::new(3, 'B', 'B'),
            ShipCell::new(3, 'C', 'B'),
            ShipCell::new(4, 'C', 'B'),
            ShipCell::new(4, 'D', 'B'),
        ]);
        assert_eq!(
            violations(&bend),
            vec![ShipViolation::BadShape {
                ship: ShipKind::Battleship
            }]
        );
    }

    #[test]
    fn diagonal_ship_is_a_bad_shape() {
        let mut cells = standard_cells();
        cells.retain(|cell| cell.ship != 'D');
        cells.extend([ShipCell::new(9, 'A', 'D'), ShipCell::new(10, 'B', 'D')]);
        assert_eq!(
            violations(&cells),
            vec![ShipViolation::BadShape {
                ship: ShipKind::Destroyer
            }]
        );
    }

    #[test]
    fn off_grid_and_unknown_symbols_are_reported() {
        let mut cells = standard_cells();
        cells.push(ShipCell::new(11, 'A', 'D'));
        cells.push(ShipCell::new(2, 'H', 'X'));
        let found = violations(&cells);
        assert!(found.contains(&ShipViolation::OffGrid { row: 11, col: 'A' }));
        assert!(found.contains(&ShipViolation::UnknownShip { symbol: 'X' }));
    }

    #[test]
    fn lowercase_input_is_accepted() {
        let cells: Vec<ShipCell> = standard_cells()
            .into_iter()
            .map(|cell| {
                ShipCell::new(
                    cell.row,
                    cell.col.to_ascii_lowercase(),
                    cell.ship.to_ascii_lowercase(),
                )
            })
            .collect();
        assert!(validate_layout(&cells).is_ok());
    }
}
