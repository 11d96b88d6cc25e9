use std::sync::Arc;

use axum::{
    extract::{State, TypedHeader},
    headers::{
        authorization::{Basic, Bearer},
        Authorization,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::{debug, error, info};
use pwhash::bcrypt;
use serde_json::{json, Value};

use crate::check_access;
use crate::engine::Engine;
use crate::errors::CustomError;
use crate::models::player::*;
use crate::AppState;
use crate::Claims;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler for signing up. The screen name must be free, the password is stored as a bcrypt hash.
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn signup(
    State(_state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    Json(player): Json<SignUp>,
) -> Result<(StatusCode, Json<Value>), CustomError> {
    info!("signup request for {}", player.screen_name);

    if player.password.is_empty() {
        return Err(CustomError::BadRequest);
    }

    // Create the password hash
    let password_hash = match bcrypt::hash(&player.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Unexpected error encrypting password {:?}", err);
            return Err(CustomError::InternalServerError);
        }
    };

    let id = engine
        .register_player(&player.screen_name, &password_hash)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler for logging in. Basic authentication carries screen name and password. If the password checks out
// a JWT Bearer token is returned with the player id and expiration encoded within
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn login(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(basic): TypedHeader<Authorization<Basic>>,
) -> Result<(StatusCode, Json<AuthResponse>), CustomError> {
    info!("login request by player: {}", basic.username());

    let player = engine.find_player(basic.username()).await?;

    //Check password hash is equal to stored password hash. if not, error out
    if !bcrypt::verify(basic.password(), &player.password_hash) {
        return Err(CustomError::WrongPassword);
    }

    let now = Utc::now();
    let expires = now
        .checked_add_signed(Duration::seconds(state.token_duration))
        .ok_or(CustomError::InternalServerError)?;

    let claims = Claims {
        sub: player.screen_name.clone(),
        pid: player.id,
        iat: now.timestamp() as usize,
        exp: expires.timestamp() as usize,
    };

    // generate the Bearer token
    match encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    ) {
        Ok(token) => {
            debug!("Issued token for player {}", player.id);
            Ok((
                StatusCode::OK,
                Json(AuthResponse {
                    access_token: token,
                    token_type: "bearer".to_string(),
                    expires_in: state.token_duration,
                }),
            ))
        }
        Err(err) => {
            error!("Unexpected error while encoding the bearer token ({:?})", err);
            Err(CustomError::InternalServerError)
        }
    }
}

// Handler listing everyone who can be challenged.
pub async fn list_players(
    State(state): State<AppState>,
    Extension(engine): Extension<Arc<Engine>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Player>>, CustomError> {
    info!("list players request");

    check_access(&state, &bearer).await?;
    Ok(Json(engine.list_players().await?))
}
