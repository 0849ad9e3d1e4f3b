use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use log::warn;
use crate::db::entities::User;
use crate::utils::time_utils::current_timestamp;
use super::error::{map_db_error, Error};
use super::session::current_session;
use super::AppState;

// Extractor for the staff-only endpoints. Handlers that
// take a StaffUser parameter answer 403 to anyone who
// isn't a logged in staff member.
pub struct StaffUser(pub User);

impl FromRequest for StaffUser {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(staff_user(req))
  }
}

fn staff_user(req: &HttpRequest) -> Result<StaffUser, Error> {
  let app_state = req.app_data::<web::Data<AppState>>()
    .ok_or_else(|| Error::InternalServerError("Application state is missing".to_string()))?;
  let current = current_session(
    &app_state.pool,
    &app_state.config,
    req,
    current_timestamp()
  ).map_err(map_db_error)?;
  match current.and_then(|c| c.user) {
    Some(user) if user.is_staff => Ok(StaffUser(user)),
    _ => {
      warn!("Anonymous or non-staff access attempt to {}", req.path());
      Err(Error::Forbidden("Staff access required".to_string()))
    }
  }
}
