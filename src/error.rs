//! Error types for the challenge engine

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
  #[error("challenge")]
  Challenge,
  #[error("participant")]
  Participant,
  #[error("team")]
  Team,
  #[error("team member")]
  TeamMember,
  #[error("invitation")]
  Invitation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
  #[error("user already joined this challenge")]
  AlreadyJoined,
  #[error("club already has a team in this challenge")]
  TeamPerClub,
  #[error("user is already a member of this team")]
  TeamMembership,
  #[error("club was already invited to this challenge")]
  Invitation,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("{0} not found")]
  NotFound(NotFound),

  #[error("conflict: {0}")]
  Conflict(Conflict),

  #[error("invalid state: {0}")]
  InvalidState(&'static str),

  #[error("permission denied")]
  PermissionDenied,

  #[error("capacity exceeded: {0}")]
  CapacityExceeded(&'static str),

  #[error("validation failed: {0}")]
  Validation(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::InvalidState(_) => StatusCode::CONFLICT,
      Error::PermissionDenied => StatusCode::FORBIDDEN,
      Error::CapacityExceeded(_) => StatusCode::CONFLICT,
      Error::Validation(_) => StatusCode::BAD_REQUEST,
    };

    let message = match &self {
      // never leak driver errors to clients
      Error::Database(_) => "Database error".to_string(),
      other => other.to_string(),
    };

    let body = json::json!({
      "success": false,
      "error": message
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
