/*
 * Everything that talks to YouTube: the public RSS
 * (Atom) feed of a channel and the Data API for the
 * subscriber count. Both go through blocking ureq
 * agents, callers in async code use web::block.
 */

use std::time::Duration;
use derive_more::Display;
use log::error;
use ureq::Agent;
pub mod feed;
pub mod sync;
pub mod channel_stats;

#[derive(Debug, Display)]
pub enum YoutubeError {
  #[display(fmt = "HTTP error: {}", _0)]
  Http(String),
  #[display(fmt = "Parse error: {}", _0)]
  Parse(String)
}

impl std::error::Error for YoutubeError {}

impl From<ureq::Error> for YoutubeError {
  fn from(error: ureq::Error) -> Self {
    error!("YouTube HTTP request failed: {}", error);
    YoutubeError::Http(error.to_string())
  }
}

impl From<quick_xml::Error> for YoutubeError {
  fn from(error: quick_xml::Error) -> Self {
    YoutubeError::Parse(error.to_string())
  }
}

impl From<serde_json::Error> for YoutubeError {
  fn from(error: serde_json::Error) -> Self {
    YoutubeError::Parse(error.to_string())
  }
}

pub fn http_agent(timeout_secs: u64) -> Agent {
  Agent::config_builder()
    .timeout_global(Some(Duration::from_secs(timeout_secs)))
    .build()
    .into()
}
