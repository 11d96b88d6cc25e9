//! Read-only projections of boards and battles.

use std::collections::HashMap;

use crate::engine::errors::EngineError;
use crate::engine::layout::Layout;
use crate::engine::ships::Coordinate;
use crate::engine::turn::TurnCheck;
use crate::engine::Engine;
use crate::models::battle::{BattleId, MarkerPoll};
use crate::models::board::{BoardId, Marker, OwnCell, OwnLayout, PinColor};
use crate::models::player::PlayerId;

/// Overlays received strikes on the owner's ships. Every ship cell is listed,
/// and so is every missed cell.
pub fn own_cells(layout: &Layout, markers: &[Marker]) -> Vec<OwnCell> {
    let mut cells: HashMap<Coordinate, OwnCell> = layout
        .iter()
        .map(|(cell, ship)| {
            (
                cell,
                OwnCell {
                    cell,
                    ship: Some(ship),
                    pin: PinColor::None,
                },
            )
        })
        .collect();
    for marker in markers {
        cells
            .entry(marker.cell)
            .or_insert(OwnCell {
                cell: marker.cell,
                ship: None,
                pin: PinColor::None,
            })
            .pin = marker.pin;
    }
    let mut cells: Vec<OwnCell> = cells.into_values().collect();
    cells.sort_by_key(|cell| cell.cell);
    cells
}

impl Engine {
    /// Cells struck so far on `board_id` in a battle. Never reveals a ship that
    /// has not been hit.
    pub async fn revealed_markers(
        &self,
        battle_id: BattleId,
        board_id: BoardId,
    ) -> Result<Vec<Marker>, EngineError> {
        let mut markers = self.store.markers(battle_id, board_id).await?;
        markers.retain(|marker| marker.pin != PinColor::None);
        markers.sort_by_key(|marker| marker.cell);
        Ok(markers)
    }

    /// What a participant polls to follow a battle. The turn token is only
    /// included for the player who holds the move.
    pub async fn poll_markers(
        &self,
        battle_id: BattleId,
        board_id: BoardId,
        requester: PlayerId,
    ) -> Result<MarkerPoll, EngineError> {
        let battle = self.battle(battle_id).await?;
        if !battle.is_participant(requester) {
            return Err(EngineError::NotParticipant);
        }
        if battle.owner_of_board(board_id).is_none() {
            return Err(EngineError::BoardNotInBattle);
        }
        let markers = self.revealed_markers(battle_id, board_id).await?;
        let mover = battle.turn.as_ref().map(|turn| turn.mover());
        let turn_token = battle
            .turn
            .as_ref()
            .filter(|turn| turn.mover() == requester && !battle.is_decided())
            .map(|turn| turn.token().as_str().to_string());

        Ok(MarkerPoll {
            battle_id,
            board_id,
            status: battle.status,
            mover,
            turn_token,
            winner: battle.winner,
            markers,
        })
    }

    /// Whose move it is in a battle and whether `presented` is its current token.
    pub async fn check_turn(
        &self,
        battle_id: BattleId,
        presented: &str,
    ) -> Result<TurnCheck, EngineError> {
        let battle = self.battle(battle_id).await?;
        let turn = battle.turn.as_ref().ok_or(EngineError::BattleNotActive)?;
        Ok(turn.check(presented))
    }

    /// The full layout of a board, for its owner only. With a battle given, the
    /// strikes the board received in it are overlaid.
    pub async fn own_layout(
        &self,
        owner: PlayerId,
        board_id: BoardId,
        battle_id: Option<BattleId>,
    ) -> Result<OwnLayout, EngineError> {
        let board = self.owned_board(owner, board_id).await?;
        let markers = match battle_id {
            Some(battle_id) => {
                let battle = self.battle(battle_id).await?;
                if battle.owner_of_board(board_id) != Some(owner) {
                    return Err(EngineError::BoardNotInBattle);
                }
                self.revealed_markers(battle_id, board_id).await?
            }
            None => Vec::new(),
        };
        Ok(OwnLayout {
            board_id: board.id,
            name: board.name,
            cells: own_cells(&board.layout, &markers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::layout::{tests::standard_cells, validate_layout};
    use crate::engine::ships::ShipKind;

    #[test]
    fn own_view_shows_ships_and_received_strikes() {
        let layout = validate_layout(&standard_cells()).unwrap();
        let markers = vec![
            Marker {
                cell: Coordinate::new(1, 'A').unwrap(),
                pin: PinColor::Hit,
            },
            Marker {
                cell: Coordinate::new(2, 'A').unwrap(),
                pin: PinColor::Miss,
            },
        ];
        let cells = own_cells(&layout, &markers);
        assert_eq!(cells.len(), 18);
        assert_eq!(
            cells[0],
            OwnCell {
                cell: Coordinate::new(1, 'A').unwrap(),
                ship: Some(ShipKind::Carrier),
                pin: PinColor::Hit,
            }
        );
        assert!(cells.contains(&OwnCell {
            cell: Coordinate::new(2, 'A').unwrap(),
            ship: None,
            pin: PinColor::Miss,
        }));
        assert!(cells
            .iter()
            .filter(|cell| cell.ship.is_some())
            .all(|cell| cell.cell == Coordinate::new(1, 'A').unwrap()
                || cell.pin == PinColor::None));
    }
}
