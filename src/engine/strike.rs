//! Strike resolution.
//!
//! [`resolve`] works out what a strike does to a battle without touching
//! storage; [`Engine::strike`] authorizes the attacker, runs it, and commits the
//! outcome as a single conditional write keyed on the turn token.

use std::collections::HashSet;

use log::{error, info, warn};
use serde::Serialize;

use crate::engine::errors::EngineError;
use crate::engine::layout::Layout;
use crate::engine::ships::{Coordinate, ShipKind};
use crate::engine::Engine;
use crate::models::battle::{Battle, BattleId, BattleStatus};
use crate::models::board::{BoardId, Marker, PinColor};
use crate::models::player::PlayerId;
use crate::store::{StoreError, StrikeCommit};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StrikeResult {
    pub pin_color: PinColor,
    pub sunk_ship: Option<ShipKind>,
    pub battle_won: bool,
}

/// The effect of one strike. `marker` is `None` when the cell had already been
/// struck, in which case `battle` is unchanged.
#[derive(Debug, Clone)]
pub struct StrikeOutcome {
    pub result: StrikeResult,
    pub marker: Option<Marker>,
    pub battle: Battle,
}

/// Works out the effect of `attacker` firing at `target` on the defender's
/// board. The caller has already authorized the attacker.
pub fn resolve(
    battle: &Battle,
    attacker: PlayerId,
    layout: &Layout,
    markers: &[Marker],
    target: Coordinate,
) -> Result<StrikeOutcome, EngineError> {
    let defender = battle.other_player(attacker)?;

    if let Some(existing) = markers.iter().find(|marker| marker.cell == target) {
        return Ok(StrikeOutcome {
            result: StrikeResult {
                pin_color: existing.pin,
                sunk_ship: None,
                battle_won: false,
            },
            marker: None,
            battle: battle.clone(),
        });
    }

    let turn = battle.turn.as_ref().ok_or(EngineError::BattleNotActive)?;
    let mut next = battle.clone();
    next.turn = Some(turn.advance(defender));

    let ship = layout.ship_at(target);
    let pin = match ship {
        Some(_) => PinColor::Hit,
        None => PinColor::Miss,
    };

    let sunk_ship = ship.filter(|kind| {
        let hits: HashSet<Coordinate> = markers
            .iter()
            .filter(|marker| marker.pin == PinColor::Hit)
            .map(|marker| marker.cell)
            .collect();
        layout
            .cells_of(*kind)
            .all(|cell| cell == target || hits.contains(&cell))
    });

    let mut battle_won = false;
    if sunk_ship.is_some() {
        let sunk = if defender == battle.challenger_id {
            &mut next.challenger_sunk
        } else {
            &mut next.opponent_sunk
        };
        *sunk += 1;
        if usize::from(*sunk) == ShipKind::ALL.len() {
            battle_won = true;
            next.winner = Some(attacker);
            next.status = BattleStatus::Complete;
        }
    }

    Ok(StrikeOutcome {
        result: StrikeResult {
            pin_color: pin,
            sunk_ship,
            battle_won,
        },
        marker: Some(Marker { cell: target, pin }),
        battle: next,
    })
}

impl Engine {
    pub async fn strike(
        &self,
        attacker: PlayerId,
        battle_id: BattleId,
        board_id: BoardId,
        target: Coordinate,
        token: &str,
    ) -> Result<StrikeResult, EngineError> {
        let battle = self.battle(battle_id).await?;
        if battle.is_decided() {
            return Err(EngineError::BattleAlreadyDecided);
        }
        if battle.status != BattleStatus::Active {
            return Err(EngineError::BattleNotActive);
        }
        let turn = battle.turn.as_ref().ok_or(EngineError::BattleNotActive)?;
        if let Err(err) = turn.authorize(attacker, token) {
            warn!(
                "Rejected strike by player {} in battle {}: not their turn",
                attacker, battle_id
            );
            return Err(err);
        }

        let defender = battle.other_player(attacker)?;
        if battle.board_of(defender) != Some(board_id) {
            return Err(EngineError::NotOpponentBoard);
        }
        let board = self.board(board_id).await?;
        let markers = self.store.markers(battle_id, board_id).await?;

        let outcome = resolve(&battle, attacker, &board.layout, &markers, target)?;
        let marker = match outcome.marker {
            Some(marker) => marker,
            None => {
                info!(
                    "Player {} fired at {} again in battle {}, nothing changes",
                    attacker, target, battle_id
                );
                return Ok(outcome.result);
            }
        };

        let commit = StrikeCommit {
            board_id,
            expected_token: turn.token().clone(),
            marker,
            battle: outcome.battle,
        };
        match self.store.commit_strike(&commit).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                warn!(
                    "Strike by player {} in battle {} lost the race for the turn",
                    attacker, battle_id
                );
                return Err(EngineError::NotYourTurn);
            }
            Err(err) => {
                error!("Error recording strike in battle {}: {:?}", battle_id, err);
                return Err(err.into());
            }
        }

        info!(
            "Player {} fired at {} in battle {}: {:?}",
            attacker, target, battle_id, outcome.result
        );
        if outcome.result.battle_won {
            info!("Player {} won battle {}", attacker, battle_id);
        }
        Ok(outcome.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::layout::{tests::standard_cells, validate_layout};
    use crate::engine::registry::tests::pending;
    use crate::engine::turn::TurnAuthority;

    fn active() -> Battle {
        let mut battle = pending(1, 100, 200);
        battle.opponent_board_id = Some(20);
        battle.status = BattleStatus::Active;
        battle.turn = Some(TurnAuthority::seed(200));
        battle
    }

    fn cell(row: u8, col: char) -> Coordinate {
        Coordinate::new(row, col).unwrap()
    }

    fn layout() -> Layout {
        validate_layout(&standard_cells()).unwrap()
    }

    #[test]
    fn empty_cell_is_a_miss_and_passes_the_turn() {
        let battle = active();
        let outcome = resolve(&battle, 200, &layout(), &[], cell(2, 'A')).unwrap();
        assert_eq!(outcome.result.pin_color, PinColor::Miss);
        assert_eq!(outcome.result.sunk_ship, None);
        assert_eq!(
            outcome.marker,
            Some(Marker {
                cell: cell(2, 'A'),
                pin: PinColor::Miss
            })
        );
        let turn = outcome.battle.turn.unwrap();
        assert_eq!(turn.mover(), 100);
        assert_ne!(turn.token(), battle.turn.unwrap().token());
    }

    #[test]
    fn last_cell_of_a_ship_sinks_it() {
        let battle = active();
        let first = resolve(&battle, 200, &layout(), &[], cell(10, 'A')).unwrap();
        assert_eq!(first.result.pin_color, PinColor::Hit);
        assert_eq!(first.result.sunk_ship, None);

        let markers = vec![first.marker.unwrap()];
        let second = resolve(&battle, 200, &layout(), &markers, cell(10, 'B')).unwrap();
        assert_eq!(second.result.sunk_ship, Some(ShipKind::Destroyer));
        assert_eq!(second.battle.challenger_sunk, 1);
        assert_eq!(second.battle.opponent_sunk, 0);
        assert!(!second.result.battle_won);
    }

    #[test]
    fn misses_around_a_ship_do_not_sink_it() {
        let battle = active();
        let markers = vec![
            Marker {
                cell: cell(9, 'A'),
                pin: PinColor::Miss,
            },
            Marker {
                cell: cell(9, 'B'),
                pin: PinColor::Miss,
            },
        ];
        let outcome = resolve(&battle, 200, &layout(), &markers, cell(10, 'A')).unwrap();
        assert_eq!(outcome.result.sunk_ship, None);
    }

    #[test]
    fn struck_cell_changes_nothing() {
        let battle = active();
        let markers = vec![Marker {
            cell: cell(10, 'A'),
            pin: PinColor::Hit,
        }];
        let outcome = resolve(&battle, 200, &layout(), &markers, cell(10, 'A')).unwrap();
        assert_eq!(
            outcome.result,
            StrikeResult {
                pin_color: PinColor::Hit,
                sunk_ship: None,
                battle_won: false,
            }
        );
        assert!(outcome.marker.is_none());
        assert_eq!(outcome.battle.turn, battle.turn);
    }

    #[test]
    fn fifth_sunk_ship_wins_the_battle() {
        let mut battle = active();
        battle.challenger_sunk = 4;
        let layout = layout();
        let markers: Vec<Marker> = layout
            .iter()
            .filter(|(at, _)| *at != cell(10, 'B'))
            .map(|(at, _)| Marker {
                cell: at,
                pin: PinColor::Hit,
            })
            .collect();
        let outcome = resolve(&battle, 200, &layout, &markers, cell(10, 'B')).unwrap();
        assert!(outcome.result.battle_won);
        assert_eq!(outcome.battle.winner, Some(200));
        assert_eq!(outcome.battle.status, BattleStatus::Complete);
        assert_eq!(outcome.battle.challenger_sunk, 5);
    }

    #[test]
    fn outsiders_cannot_resolve_strikes() {
        let battle = active();
        assert!(matches!(
            resolve(&battle, 300, &layout(), &[], cell(1, 'A')),
            Err(EngineError::NotParticipant)
        ));
    }
}
