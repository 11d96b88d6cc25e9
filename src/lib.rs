//! Broadside: a two player battleship server.

use std::sync::Arc;

use axum::{
    headers::{authorization::Bearer, Authorization},
    routing::{get, post},
    Extension, Router,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::error;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod controllers;
pub mod engine;
pub mod errors;
pub mod models;
pub mod store;

use crate::engine::Engine;
use crate::errors::CustomError;
use crate::models::player::PlayerId;

// The claims struct used for creating a Bearer token
#[derive(Deserialize, Serialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub pid: PlayerId,
    pub iat: usize,
    pub exp: usize,
}

// Shared immutable state
#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: String,
    pub token_duration: i64,
}

pub fn router(state: AppState, engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/player", post(controllers::player::signup))
        .route("/login", get(controllers::player::login))
        .route("/players", get(controllers::player::list_players))
        .route(
            "/board",
            post(controllers::board::new_board).get(controllers::board::list_boards),
        )
        .route("/board/:id", get(controllers::board::get_board))
        .route(
            "/battle",
            post(controllers::battle::new_battle).get(controllers::battle::list_battles),
        )
        .route("/battle/challenges", get(controllers::battle::pending_challenges))
        .route("/battle/:id/accept", post(controllers::battle::accept_battle))
        .route("/battle/:id/decline", post(controllers::battle::decline_battle))
        .route("/battle/:id/strike", post(controllers::battle::strike))
        .route("/battle/:id/board/:board_id", get(controllers::battle::poll_markers))
        .with_state(state)
        .layer(Extension(engine))
}

// Checks that the bearer token is valid (the player is logged in) and returns the player id it was issued to.
// The JWT secret is taken from the state shared across all handlers.
pub async fn check_access(
    state: &AppState,
    bearer: &Authorization<Bearer>,
) -> Result<PlayerId, CustomError> {
    match decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(token_data) => Ok(token_data.claims.pid),
        Err(err) => {
            error!("Invalid token: {:?}", err.kind());
            Err(CustomError::InvalidToken)
        }
    }
}
