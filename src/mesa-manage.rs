#![allow(dead_code)]
mod admin;
mod config;
mod db;
mod storage;
mod utils;
mod youtube;

use std::env;
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use dotenv::dotenv;
use log::{info, warn};
use getopts::{Matches, Options};
use uuid::Uuid;
use crate::admin::export::export_csv_to_file;
use crate::config::Config;
use crate::db::Pool;
use crate::utils::password::hash_password;
use crate::utils::time_utils::current_timestamp;
use crate::youtube::sync::VideoSyncService;

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} -c COMMAND [options]\n\n\
    Commands:\n  \
    setup-database  Create the schema, the staff account and the site configuration\n  \
    sync-youtube    Import the latest videos from the channel feed\n  \
    create-staff    Create a staff account or reset its password\n  \
    export-views    Write all view events to a CSV file\n  \
    purge-sessions  Delete expired sessions", program);
  print!("{}", opts.usage(&brief));
}

fn setup_database(pool: &Pool, config: &Config) -> Result<()> {
  let now = current_timestamp();
  db::create_schema(pool)?;
  info!("Database schema is ready");

  // Existing staff accounts are left alone, create-staff
  // is there to reset a password.
  if db::user_by_username(pool, &config.admin_username)?.is_some() {
    info!("Staff user {} already exists", config.admin_username);
  } else {
    // A password given in the environment is used as is,
    // otherwise we make one up and show it once.
    let password = match &config.admin_password {
      Some(p) if !p.trim().is_empty() => p.clone(),
      _ => {
        let generated = Uuid::new_v4().simple().to_string();
        println!(
          "Generated password for staff user \"{}\": {}",
          config.admin_username,
          generated
        );
        println!("It won't be displayed again.");
        generated
      }
    };
    let hash = hash_password(&password)
      .map_err(|e| eyre!("Could not hash the staff password: {}", e))?;
    let user_id = db::upsert_user(pool, &config.admin_username, &hash, true, now)?;
    info!("Staff user {} created with id {}", config.admin_username, user_id);
  }

  let (_, created) = db::site_config_get_or_create(pool, now)?;
  if created {
    info!("Created the default site configuration");
  }
  println!("SQLite version: {}", db::sqlite_version(pool)?);
  Ok(())
}

fn sync_youtube(pool: &Pool, config: &Config, matches: &Matches) -> Result<()> {
  let (site_config, _) = db::site_config_get_or_create(pool, current_timestamp())?;
  // Command line first, then the site configuration record,
  // then the process configuration.
  let channel_id = matches.opt_str("channel-id")
    .or(site_config.youtube_channel_id)
    .or_else(|| config.youtube_channel_id.clone())
    .filter(|c| !c.trim().is_empty())
    .ok_or_else(|| eyre!("No YouTube channel id configured, use --channel-id"))?;
  let max_results = match matches.opt_str("max-results") {
    Some(value) => value.parse::<usize>()
      .with_context(|| format!("Invalid --max-results value: {}", value))?,
    None => config.youtube_max_results
  };

  let service = VideoSyncService::new(config);
  let report = service.sync_videos_to_database(
    pool,
    &channel_id,
    max_results,
    current_timestamp()
  )?;
  println!(
    "Videos synced - new: {}, updated: {}, total: {}",
    report.created,
    report.updated,
    report.total()
  );
  Ok(())
}

fn create_staff(pool: &Pool, matches: &Matches) -> Result<()> {
  let username = matches.opt_str("username")
    .ok_or_else(|| eyre!("create-staff requires --username"))?;
  let password = matches.opt_str("password")
    .ok_or_else(|| eyre!("create-staff requires --password"))?;
  if password.len() < 8 {
    warn!("That password is really short");
  }
  let hash = hash_password(&password)
    .map_err(|e| eyre!("Could not hash the password: {}", e))?;
  let id = db::upsert_user(pool, &username, &hash, true, current_timestamp())?;
  println!("Staff user {} saved with id {}", username, id);
  Ok(())
}

fn export_views(pool: &Pool, matches: &Matches) -> Result<()> {
  let output = matches.opt_str("output")
    .unwrap_or_else(|| "visualizacoes.csv".to_string());
  let events = db::all_view_events(pool)?;
  export_csv_to_file(&events, &output)?;
  println!("Exported {} view events to {}", events.len(), output);
  Ok(())
}

fn purge_sessions(pool: &Pool) -> Result<()> {
  let deleted = db::delete_expired_sessions(pool, current_timestamp())?;
  println!("Deleted {} expired sessions", deleted);
  Ok(())
}

/**
 * Maintenance binary: database setup, staff accounts,
 * video sync and exports.
 */
fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("c", "command", "Management command to run", "COMMAND");
  opts.optopt("", "channel-id", "YouTube channel id (sync-youtube)", "ID");
  opts.optopt("", "max-results", "Maximum feed entries to import (sync-youtube)", "COUNT");
  opts.optopt("", "username", "Staff username (create-staff)", "NAME");
  opts.optopt("", "password", "Staff password (create-staff)", "PASSWORD");
  opts.optopt("o", "output", "CSV file to write (export-views)", "FILE");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(&args[1..])?;
  if opt_matches.opt_present("h") {
    print_usage(&program, opts);
    return Ok(());
  }

  if let Some(command) = opt_matches.opt_str("c") {
    let config = Config::from_env()
      .context("Configuration (environment or .env file) is missing")?;
    let pool = db::open_pool(&config.db_path)?;
    return match command.as_str() {
      "setup-database" => setup_database(&pool, &config),
      "sync-youtube" => sync_youtube(&pool, &config, &opt_matches),
      "create-staff" => create_staff(&pool, &opt_matches),
      "export-views" => export_views(&pool, &opt_matches),
      "purge-sessions" => purge_sessions(&pool),
      _ => Err(eyre!("Unknown command: {}", command))
    };
  }

  print_usage(&program, opts);

  Ok(())
}
