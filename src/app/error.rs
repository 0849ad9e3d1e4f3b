use actix_web::{
  error::ResponseError,
  http::StatusCode,
  HttpResponse
};
use derive_more::Display;
use log::error;
use super::dtos::{JsonStatus, JsonStatusType};

// Every error leaves as {"status": "error", "message": ...}.
// The details of internal errors only go to the logs,
// not to random internet people.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Forbidden: {}", _0)]
  Forbidden(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Bad Request: {}", _0)]
  BadRequest(String),
  #[display(fmt = "Too many requests, try again later")]
  TooManyRequests
}

impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        StatusCode::INTERNAL_SERVER_ERROR,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::TooManyRequests => StatusCode::TOO_MANY_REQUESTS
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code())
      .json(JsonStatus::new(JsonStatusType::Error, &self.to_string()))
  }
}

// The database layer returns eyre reports, which have
// to be logged here since the message isn't sent.
pub fn map_db_error(e: eyre::Report) -> Error {
  error!("Database error: {:?}", e);
  Error::DatabaseError(e.to_string())
}

pub fn map_internal_error(e: eyre::Report) -> Error {
  error!("Internal error: {:?}", e);
  Error::InternalServerError(e.to_string())
}
