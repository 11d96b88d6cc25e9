use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use log::error;
use serde_json::json;

use crate::engine::errors::{EngineError, ErrorKind, ShipViolation};

// Custom Errors used in handlers
#[derive(Debug)]
pub enum CustomError {
    BadRequest,
    InternalServerError,
    InvalidToken,
    WrongPassword,
    PlayerNotFound,
    InvalidLayout(Vec<ShipViolation>),
    Engine(EngineError),
}

impl From<EngineError> for CustomError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidLayout(violations) => CustomError::InvalidLayout(violations),
            EngineError::PlayerNotFound => CustomError::PlayerNotFound,
            EngineError::Persistence(err) => {
                error!("Storage failure: {:?}", err);
                CustomError::InternalServerError
            }
            other => CustomError::Engine(other),
        }
    }
}

/// Groups layout problems by ship name. Problems that belong to no single ship
/// are listed under "layout".
fn ships_map(violations: &[ShipViolation]) -> BTreeMap<String, Vec<String>> {
    let mut ships: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for violation in violations {
        let key = match violation.ship() {
            Some(ship) => ship.name().to_string(),
            None => "layout".to_string(),
        };
        ships.entry(key).or_default().push(violation.to_string());
    }
    ships
}

fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

//implementation of custom errors that are used in handlers
impl IntoResponse for CustomError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Self::InternalServerError => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string()),
            Self::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request".to_string()),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Token is not valid".to_string()),
            Self::WrongPassword => (StatusCode::UNAUTHORIZED, "Wrong Password".to_string()),
            Self::PlayerNotFound => (StatusCode::NOT_FOUND, "Player not Found".to_string()),
            Self::InvalidLayout(violations) => {
                let body = json!({
                    "error": "Invalid layout",
                    "ships": ships_map(&violations),
                });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            Self::Engine(err) => (status_of(err.kind()), err.to_string()),
        };
        (status, Json(json!({"error": error_message}))).into_response()
    }
}
