use chrono::Local;
use serde::{Deserialize, Serialize};

pub type PlayerId = u32;

#[derive(Serialize, Debug, Clone, sqlx::FromRow)]
pub struct Player {
    pub id: PlayerId,
    pub screen_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created: chrono::DateTime<Local>,
}

// The struct used for receiving a new player as json
#[derive(Deserialize, Serialize)]
pub struct SignUp {
    pub screen_name: String,
    pub password: String,
}

// The struct used to respond with an official json for the bearer token
#[derive(Deserialize, Serialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Screen names are 1 to 16 characters without whitespace.
pub fn valid_screen_name(screen_name: &str) -> bool {
    let length = screen_name.chars().count();
    (1..=16).contains(&length) && !screen_name.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_names_are_short_and_unbroken() {
        assert!(valid_screen_name("elvis"));
        assert!(!valid_screen_name(""));
        assert!(!valid_screen_name("bob smith"));
        assert!(!valid_screen_name("abcdefghijklmnopq"));
    }
}
