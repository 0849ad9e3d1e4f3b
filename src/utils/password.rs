use argon2::{
  Argon2,
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng}
};
use derive_more::Display;

#[derive(Debug, Display)]
pub enum PasswordError {
  #[display(fmt = "Password hash error: {}", _0)]
  HashError(String),
  #[display(fmt = "Password verify error: {}", _0)]
  VerifyError(String)
}

impl std::error::Error for PasswordError {}

// Argon2id with the default parameters. The PHC string
// carries its own salt and parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| PasswordError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
  let parsed_hash = PasswordHash::new(hash)
    .map_err(|e| PasswordError::VerifyError(e.to_string()))?;
  Ok(
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .is_ok()
  )
}
