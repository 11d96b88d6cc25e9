//! Turn authority: who may strike next, proven by a rotating random token.

use std::fmt;

use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;

use crate::engine::errors::EngineError;
use crate::models::player::PlayerId;

const TOKEN_LENGTH: usize = 32;

/// Opaque proof that the holder saw the latest state of a battle.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct TurnToken(String);

impl TurnToken {
    pub fn generate() -> TurnToken {
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        TurnToken(token)
    }

    /// Wraps a token read back from storage.
    pub(crate) fn from_stored(token: String) -> TurnToken {
        TurnToken(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TurnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of comparing a claimed player and presented token to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnCheck {
    pub mover: PlayerId,
    pub is_current_token: bool,
}

/// The current mover of a battle and the token they have to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnAuthority {
    mover: PlayerId,
    token: TurnToken,
}

impl TurnAuthority {
    /// First turn of a freshly accepted battle.
    pub fn seed(first_mover: PlayerId) -> TurnAuthority {
        TurnAuthority {
            mover: first_mover,
            token: TurnToken::generate(),
        }
    }

    pub(crate) fn from_stored(mover: PlayerId, token: TurnToken) -> TurnAuthority {
        TurnAuthority { mover, token }
    }

    pub fn mover(&self) -> PlayerId {
        self.mover
    }

    pub fn token(&self) -> &TurnToken {
        &self.token
    }

    pub fn check(&self, presented: &str) -> TurnCheck {
        TurnCheck {
            mover: self.mover,
            is_current_token: tokens_match(self.token.as_str(), presented),
        }
    }

    /// Both the player and the token have to match.
    pub fn authorize(&self, claimed: PlayerId, presented: &str) -> Result<(), EngineError> {
        let check = self.check(presented);
        if check.mover != claimed || !check.is_current_token {
            return Err(EngineError::NotYourTurn);
        }
        Ok(())
    }

    /// Hands the move to `next_mover` under a brand-new token.
    pub fn advance(&self, next_mover: PlayerId) -> TurnAuthority {
        let mut token = TurnToken::generate();
        while token == self.token {
            token = TurnToken::generate();
        }
        TurnAuthority {
            mover: next_mover,
            token,
        }
    }
}

// Constant-time comparison.
fn tokens_match(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_and_opaque() {
        let a = TurnToken::generate();
        let b = TurnToken::generate();
        assert_eq!(a.as_str().len(), TOKEN_LENGTH);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn only_the_mover_with_the_current_token_is_authorized() {
        let turn = TurnAuthority::seed(7);
        let token = turn.token().as_str().to_string();
        assert!(turn.authorize(7, &token).is_ok());
        assert!(matches!(turn.authorize(8, &token), Err(EngineError::NotYourTurn)));
        assert!(matches!(turn.authorize(7, "guess"), Err(EngineError::NotYourTurn)));
        assert_eq!(
            turn.check(&token),
            TurnCheck {
                mover: 7,
                is_current_token: true
            }
        );
    }

    #[test]
    fn advancing_flips_the_mover_and_retires_the_old_token() {
        let first = TurnAuthority::seed(1);
        let old = first.token().as_str().to_string();
        let second = first.advance(2);
        assert_eq!(second.mover(), 2);
        assert!(second.authorize(2, &old).is_err());
        assert!(second.authorize(2, second.token().as_str()).is_ok());

        let third = second.advance(1);
        assert!(third.authorize(1, &old).is_err());
        assert!(!third.check(&old).is_current_token);
    }
}
