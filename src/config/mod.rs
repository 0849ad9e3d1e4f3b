// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::convert::From;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  pub template_dir: String,
  // Listing pages:
  pub posts_per_page: usize,
  pub videos_per_page: usize,
  // Session cookie settings:
  pub session_cookie_name: String,
  pub session_lifetime_days: i64,
  pub secure_cookies: bool,
  // Login rate limiter settings:
  pub rl_max_requests: u32,
  pub rl_max_requests_time: u32,
  pub rl_block_duration: u32,
  // YouTube feed and Data API. The channel id and API
  // key can also be set in the site configuration record,
  // which takes precedence.
  pub youtube_channel_id: Option<String>,
  pub youtube_api_key: Option<String>,
  pub youtube_feed_base: String,
  pub youtube_api_base: String,
  pub youtube_api_timeout: u64,
  pub youtube_max_results: usize,
  pub subscriber_cache_ttl: i64,
  // Supabase Storage for cover images. Storage is
  // disabled when the URL or key is missing.
  pub supabase_url: Option<String>,
  pub supabase_key: Option<String>,
  pub supabase_bucket: String,
  // Request body limit for cover uploads, in bytes.
  pub max_upload_size: usize,
  // Staff account created by "mesa-manage -c setup-database":
  pub admin_username: String,
  pub admin_password: Option<String>,
  // Used in templates:
  pub site_title: String,
  pub site_root: String,
  pub site_description: String
}

// Only what the templates need, the rest of the
// config has secrets in it.
#[derive(Serialize, Debug, Clone)]
pub struct SiteInfo {
  pub title: String,
  pub root: String,
  pub description: String
}

impl From<&Config> for SiteInfo {
  fn from(config: &Config) -> Self {
    Self {
      title: config.site_title.clone(),
      root: config.site_root.clone(),
      description: config.site_description.clone()
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // Keys have to be lowercase when compared to
    // what's in the .env file.
    config::Config::builder()
      .set_default("db_path", "./mesa_secreta.db")?
      .set_default("bind_address", "127.0.0.1:8080")?
      .set_default("template_dir", "./templates")?
      .set_default("posts_per_page", 9)?
      .set_default("videos_per_page", 12)?
      .set_default("session_cookie_name", "mesa_session")?
      .set_default("session_lifetime_days", 14)?
      .set_default("secure_cookies", false)?
      .set_default("rl_max_requests", 10)?
      .set_default("rl_max_requests_time", 60)?
      .set_default("rl_block_duration", 300)?
      .set_default("youtube_feed_base", "https://www.youtube.com/feeds/videos.xml")?
      .set_default("youtube_api_base", "https://www.googleapis.com/youtube/v3")?
      .set_default("youtube_api_timeout", 5)?
      .set_default("youtube_max_results", 15)?
      .set_default("subscriber_cache_ttl", 3600)?
      .set_default("supabase_bucket", "media")?
      .set_default("max_upload_size", 10 * 1024 * 1024)?
      .set_default("admin_username", "admin")?
      .set_default("site_title", "Mesa Secreta")?
      // Should never have a trailing slash.
      .set_default("site_root", "http://localhost:8080")?
      .set_default("site_description", "Reviews, dicas e novidades de jogos de tabuleiro")?
      .add_source(config::Environment::default())
      .build()
      .and_then(|c| c.try_deserialize())
      // The error has to be given a context for
      // color_eyre to work here:
      .context("Loading configuration from env")
  }

}

#[cfg(test)]
pub mod tests {
  use super::*;

  // Config with every default but pointing at a
  // database path of our choosing. Shared with the
  // other test modules.
  pub fn test_config(db_path: &str) -> Config {
    Config {
      db_path: db_path.to_string(),
      bind_address: "127.0.0.1:0".to_string(),
      template_dir: "./templates".to_string(),
      posts_per_page: 9,
      videos_per_page: 12,
      session_cookie_name: "mesa_session".to_string(),
      session_lifetime_days: 14,
      secure_cookies: false,
      rl_max_requests: 10,
      rl_max_requests_time: 60,
      rl_block_duration: 300,
      youtube_channel_id: None,
      youtube_api_key: None,
      youtube_feed_base: "https://www.youtube.com/feeds/videos.xml".to_string(),
      youtube_api_base: "https://www.googleapis.com/youtube/v3".to_string(),
      youtube_api_timeout: 1,
      youtube_max_results: 15,
      subscriber_cache_ttl: 3600,
      supabase_url: None,
      supabase_key: None,
      supabase_bucket: "media".to_string(),
      max_upload_size: 1024 * 1024,
      admin_username: "admin".to_string(),
      admin_password: None,
      site_title: "Mesa Secreta".to_string(),
      site_root: "http://localhost:8080".to_string(),
      site_description: "Test".to_string()
    }
  }

  #[test]
  fn site_info_only_keeps_public_fields() {
    let config = test_config("unused.db");
    let info = SiteInfo::from(&config);
    assert_eq!("Mesa Secreta", info.title);
    assert_eq!("http://localhost:8080", info.root);
  }
}
