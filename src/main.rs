mod admin;
mod app;
mod config;
mod db;
mod stats;
mod storage;
mod utils;
mod youtube;
use color_eyre::Result;
use dotenv::dotenv;
use std::env;

#[actix_web::main]
async fn main() -> Result<()> {
  dotenv().ok();
  // Logging defaults to info when RUST_LOG is absent.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();
  color_eyre::install()?;

  app::run().await
}
