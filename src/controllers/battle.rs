use std::sync::Arc;

use axum::{
    extract::{Path, State, TypedHeader},
    headers::{authorization::Bearer, Authorization},
    http::StatusCode,
    Extension, Json,
};
use log::info;
use serde_json::{json, Value};

use crate::check_access;
use crate::engine::ships::Coordinate;
use crate::engine::strike::StrikeResult;
use crate::engine::Engine;
use crate::errors::CustomError;
use crate::models::battle::*;
use crate::models::board::BoardId;
use crate::AppState;

//handler for challenging another player with one of your boards
pub async fn new_battle(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(challenge): Json<NewChallenge>,
) -> Result<(StatusCode, Json<Value>), CustomError> {
    info!("new battle request");

    let player = check_access(&state, &bearer).await?;
    let id = engine
        .challenge(player, challenge.board_id, challenge.opponent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

//handler listing every battle of the logged in player
pub async fn list_battles(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<BattleSummary>>, CustomError> {
    info!("list battles request");

    let player = check_access(&state, &bearer).await?;
    let battles = engine.list_battles(player).await?;
    Ok(Json(battles.iter().map(BattleSummary::from).collect()))
}

//handler listing the challenges waiting for the logged in player
pub async fn pending_challenges(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<BattleSummary>>, CustomError> {
    info!("pending challenges request");

    let player = check_access(&state, &bearer).await?;
    let battles = engine.pending_challenges(player).await?;
    Ok(Json(battles.iter().map(BattleSummary::from).collect()))
}

//handler for accepting a challenge. The accepting player moves first.
pub async fn accept_battle(
    Path(id): Path<BattleId>,
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(acceptance): Json<Acceptance>,
) -> Result<(StatusCode, Json<Value>), CustomError> {
    info!("accept battle request for battle {}", id);

    let player = check_access(&state, &bearer).await?;
    let id = engine
        .accept_challenge(player, acceptance.board_id, id)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "id": id }))))
}

pub async fn decline_battle(
    Path(id): Path<BattleId>,
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<(StatusCode, String), CustomError> {
    info!("decline battle request for battle {}", id);

    let player = check_access(&state, &bearer).await?;
    engine.decline_challenge(player, id).await?;
    Ok((StatusCode::OK, "Challenge declined".to_string()))
}

//handler for firing at a cell of the opponent's board
pub async fn strike(
    Path(id): Path<BattleId>,
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<StrikeRequest>,
) -> Result<Json<StrikeResult>, CustomError> {
    info!("strike request for battle {}", id);

    let player = check_access(&state, &bearer).await?;
    let target = Coordinate::new(request.row, request.col)?;
    let result = engine
        .strike(player, id, request.board_id, target, &request.token)
        .await?;
    Ok(Json(result))
}

//handler polled by both players to follow a battle
pub async fn poll_markers(
    Path((id, board_id)): Path<(BattleId, BoardId)>,
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<MarkerPoll>, CustomError> {
    info!("poll request for board {} in battle {}", board_id, id);

    let player = check_access(&state, &bearer).await?;
    Ok(Json(engine.poll_markers(id, board_id, player).await?))
}
