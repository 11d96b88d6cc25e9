//! Battle registry: challenges, answers to them, and the first move.

use log::{info, warn};

use crate::engine::errors::EngineError;
use crate::engine::turn::TurnAuthority;
use crate::engine::Engine;
use crate::models::battle::{Battle, BattleId, BattleStatus};
use crate::models::board::BoardId;
use crate::models::player::PlayerId;
use crate::store::StoreError;

/// What opening a challenge does, given the open battle between the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePlan {
    /// No open battle: start a new pending one.
    Create,
    /// The challenger re-issued a pending challenge: rebind their board.
    RefreshBoard(BattleId),
    /// Leave the open battle as it is and hand back its id.
    Keep(BattleId),
}

/// At most one open battle exists per pair of players, whoever challenged
/// whom. Board bindings only change while the battle is still pending.
pub fn plan_challenge(open: Option<&Battle>, challenger: PlayerId) -> ChallengePlan {
    match open {
        None => ChallengePlan::Create,
        Some(battle) if !battle.status.is_open() => ChallengePlan::Create,
        Some(battle)
            if battle.status == BattleStatus::Pending && battle.challenger_id == challenger =>
        {
            ChallengePlan::RefreshBoard(battle.id)
        }
        Some(battle) => ChallengePlan::Keep(battle.id),
    }
}

/// Whether `battle` is the open battle between `a` and `b`.
pub fn is_open_between(battle: &Battle, a: PlayerId, b: PlayerId) -> bool {
    battle.status.is_open()
        && ((battle.challenger_id == a && battle.opponent_id == b)
            || (battle.challenger_id == b && battle.opponent_id == a))
}

/// The opponent, who accepted the challenge, moves first.
pub fn first_mover(battle: &Battle) -> PlayerId {
    battle.opponent_id
}

impl Engine {
    pub async fn challenge(
        &self,
        challenger: PlayerId,
        challenger_board: BoardId,
        opponent: PlayerId,
    ) -> Result<BattleId, EngineError> {
        if challenger == opponent {
            return Err(EngineError::SelfChallenge);
        }
        self.owned_board(challenger, challenger_board).await?;
        self.player(opponent).await?;

        let id = self
            .store
            .open_challenge(challenger, challenger_board, opponent)
            .await?;
        info!(
            "Player {} challenged player {} with board {} (battle {})",
            challenger, opponent, challenger_board, id
        );
        Ok(id)
    }

    pub async fn accept_challenge(
        &self,
        opponent: PlayerId,
        opponent_board: BoardId,
        battle_id: BattleId,
    ) -> Result<BattleId, EngineError> {
        let battle = self.battle(battle_id).await?;
        if battle.opponent_id != opponent {
            warn!(
                "Player {} tried to accept battle {} meant for player {}",
                opponent, battle_id, battle.opponent_id
            );
            return Err(EngineError::PlayerMismatch);
        }
        if battle.status != BattleStatus::Pending {
            return Err(EngineError::BattleNotPending);
        }
        self.owned_board(opponent, opponent_board).await?;

        let turn = TurnAuthority::seed(first_mover(&battle));
        match self
            .store
            .accept_battle(battle_id, opponent, opponent_board, &turn)
            .await
        {
            Ok(()) => {
                info!("Player {} accepted battle {}", opponent, battle_id);
                Ok(battle_id)
            }
            Err(StoreError::Conflict) => Err(EngineError::BattleNotPending),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn decline_challenge(
        &self,
        opponent: PlayerId,
        battle_id: BattleId,
    ) -> Result<(), EngineError> {
        let battle = self.battle(battle_id).await?;
        if battle.opponent_id != opponent {
            return Err(EngineError::PlayerMismatch);
        }
        if battle.status != BattleStatus::Pending {
            return Err(EngineError::BattleNotPending);
        }
        match self.store.decline_battle(battle_id, opponent).await {
            Ok(()) => {
                info!("Player {} declined battle {}", opponent, battle_id);
                Ok(())
            }
            Err(StoreError::Conflict) => Err(EngineError::BattleNotPending),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_battles(&self, player: PlayerId) -> Result<Vec<Battle>, EngineError> {
        Ok(self.store.battles_of(player).await?)
    }

    /// Battles waiting for `player` to accept or decline.
    pub async fn pending_challenges(&self, player: PlayerId) -> Result<Vec<Battle>, EngineError> {
        let battles = self.store.battles_of(player).await?;
        Ok(battles
            .into_iter()
            .filter(|battle| battle.status == BattleStatus::Pending && battle.opponent_id == player)
            .collect())
    }

    pub(crate) async fn battle(&self, id: BattleId) -> Result<Battle, EngineError> {
        self.store.battle(id).await?.ok_or(EngineError::BattleNotFound)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn pending(id: BattleId, challenger: PlayerId, opponent: PlayerId) -> Battle {
        Battle {
            id,
            challenger_id: challenger,
            challenger_board_id: 10,
            opponent_id: opponent,
            opponent_board_id: None,
            status: BattleStatus::Pending,
            turn: None,
            challenger_sunk: 0,
            opponent_sunk: 0,
            winner: None,
            challenged: chrono::Local::now(),
        }
    }

    #[test]
    fn first_challenge_creates_a_battle() {
        assert_eq!(plan_challenge(None, 1), ChallengePlan::Create);
    }

    #[test]
    fn repeated_challenge_refreshes_the_pending_battle() {
        let battle = pending(4, 1, 2);
        assert_eq!(plan_challenge(Some(&battle), 1), ChallengePlan::RefreshBoard(4));
    }

    #[test]
    fn counter_challenge_keeps_the_pending_battle() {
        let battle = pending(4, 1, 2);
        assert_eq!(plan_challenge(Some(&battle), 2), ChallengePlan::Keep(4));
    }

    #[test]
    fn active_battle_is_never_rebound() {
        let mut battle = pending(4, 1, 2);
        battle.status = BattleStatus::Active;
        battle.opponent_board_id = Some(11);
        assert_eq!(plan_challenge(Some(&battle), 1), ChallengePlan::Keep(4));
    }

    #[test]
    fn finished_battles_do_not_block_a_new_one() {
        let mut battle = pending(4, 1, 2);
        battle.status = BattleStatus::Complete;
        assert_eq!(plan_challenge(Some(&battle), 1), ChallengePlan::Create);
        battle.status = BattleStatus::Declined;
        assert_eq!(plan_challenge(Some(&battle), 2), ChallengePlan::Create);
    }

    #[test]
    fn open_pairs_are_unordered() {
        let battle = pending(4, 1, 2);
        assert!(is_open_between(&battle, 1, 2));
        assert!(is_open_between(&battle, 2, 1));
        assert!(!is_open_between(&battle, 1, 3));
    }

    #[test]
    fn the_accepting_opponent_moves_first() {
        assert_eq!(first_mover(&pending(4, 1, 2)), 2);
    }
}
