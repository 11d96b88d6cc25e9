use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, TypedHeader},
    headers::{authorization::Bearer, Authorization},
    http::StatusCode,
    Extension, Json,
};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::check_access;
use crate::engine::Engine;
use crate::errors::CustomError;
use crate::models::battle::BattleId;
use crate::models::board::*;
use crate::AppState;

// Optional battle whose received strikes are laid over the board
#[derive(Deserialize, Debug, Default)]
pub struct BoardQuery {
    pub battle: Option<BattleId>,
}

//handler for storing a new board. Every ship is checked, nothing is stored when one is wrong.
pub async fn new_board(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(board): Json<NewBoard>,
) -> Result<(StatusCode, Json<Value>), CustomError> {
    info!("new board request");

    let player = check_access(&state, &bearer).await?;
    let id = engine
        .submit_layout(player, &board.name, &board.cells)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

//handler listing the boards of the logged in player, newest first
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Board>>, CustomError> {
    info!("list boards request");

    let player = check_access(&state, &bearer).await?;
    Ok(Json(engine.list_boards(player).await?))
}

//handler showing one of the player's own boards with every ship on it
pub async fn get_board(
    Path(id): Path<BoardId>,
    Query(query): Query<BoardQuery>,
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<OwnLayout>, CustomError> {
    info!("get board request for board {}", id);

    let player = check_access(&state, &bearer).await?;
    Ok(Json(engine.own_layout(player, id, query.battle).await?))
}
