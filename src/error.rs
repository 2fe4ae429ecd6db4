//! Errors returned by every core operation, and their HTTP mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Coarse failure classes shared by all operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotAuthorized,
    NotFound,
    InvalidTransition,
    OutOfBounds,
    AlreadyExists,
    ValidationError,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("only the GM of game {0} may do this")]
    NotGm(Uuid),

    #[error("game not found")]
    GameNotFound,

    #[error("player {0} not found")]
    PlayerNotFound(Uuid),

    #[error("move request {0} not found")]
    RequestNotFound(Uuid),

    #[error("player is already bound to game {0}")]
    AlreadyInAnotherGame(Uuid),

    #[error("game {0} is already active")]
    AlreadyActive(Uuid),

    #[error("player is not in game {0}")]
    NotInGame(Uuid),

    #[error("the GM moves players directly, not through requests")]
    GmCannotRequest,

    #[error("player {0} is dead")]
    PlayerDead(Uuid),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: i32, col: i32 },

    #[error("name is already set")]
    NameLocked,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("board has no room for {requested} more pieces")]
    BoardFull { requested: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotAuthorized(_) | CoreError::NotGm(_) | CoreError::GmCannotRequest => {
                ErrorKind::NotAuthorized
            }
            CoreError::GameNotFound
            | CoreError::PlayerNotFound(_)
            | CoreError::RequestNotFound(_)
            | CoreError::NotInGame(_) => ErrorKind::NotFound,
            CoreError::AlreadyInAnotherGame(_)
            | CoreError::AlreadyActive(_)
            | CoreError::PlayerDead(_)
            | CoreError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            CoreError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            CoreError::NameLocked => ErrorKind::AlreadyExists,
            CoreError::Validation(_) | CoreError::BoardFull { .. } => ErrorKind::ValidationError,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code, one per variant.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotAuthorized(_) => "NOT_AUTHORIZED",
            CoreError::NotGm(_) => "NOT_GM",
            CoreError::GameNotFound => "GAME_NOT_FOUND",
            CoreError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            CoreError::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            CoreError::AlreadyInAnotherGame(_) => "ALREADY_IN_ANOTHER_GAME",
            CoreError::AlreadyActive(_) => "ALREADY_ACTIVE",
            CoreError::NotInGame(_) => "NOT_IN_GAME",
            CoreError::GmCannotRequest => "GM_CANNOT_REQUEST",
            CoreError::PlayerDead(_) => "PLAYER_DEAD",
            CoreError::InvalidTransition(_) => "INVALID_TRANSITION",
            CoreError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            CoreError::NameLocked => "NAME_LOCKED",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::BoardFull { .. } => "BOARD_FULL",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: ErrorKind,
    code: &'a str,
    message: String,
}

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotAuthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition | ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::OutOfBounds | ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                code: self.code(),
                message: self.to_string(),
            },
        })
    }
}
