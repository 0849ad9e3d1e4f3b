use log::{error, info, warn};
use color_eyre::Result;
use ureq::Agent;
use serde::Serialize;
use super::feed::{parse_feed, FeedEntry};
use super::{http_agent, YoutubeError};
use crate::config::Config;
use crate::db::{upsert_video_by_youtube_id, Pool};

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct SyncReport {
  pub created: usize,
  pub updated: usize
}

impl SyncReport {
  pub fn total(&self) -> usize {
    self.created + self.updated
  }
}

pub struct VideoSyncService {
  agent: Agent,
  feed_base: String
}

impl VideoSyncService {

  pub fn new(config: &Config) -> Self {
    Self {
      agent: http_agent(config.youtube_api_timeout),
      feed_base: config.youtube_feed_base.clone()
    }
  }

  pub fn feed_url(&self, channel_id: &str) -> String {
    format!("{}?channel_id={}", self.feed_base, channel_id)
  }

  fn fetch_feed(&self, channel_id: &str) -> Result<String, YoutubeError> {
    let body = self.agent.get(&self.feed_url(channel_id))
      .call()?
      .into_body()
      .read_to_string()?;
    Ok(body)
  }

  // Network and parse errors are logged and end up as
  // an empty list, the sync then does nothing.
  pub fn fetch_latest_videos(&self, channel_id: &str, max_results: usize) -> Vec<FeedEntry> {
    let parsed = self.fetch_feed(channel_id)
      .and_then(|xml| parse_feed(&xml, max_results));
    match parsed {
      Ok(entries) => entries,
      Err(e) => {
        error!("Could not get the video feed for channel {}: {}", channel_id, e);
        Vec::new()
      }
    }
  }

  pub fn sync_videos_to_database(
    &self,
    pool: &Pool,
    channel_id: &str,
    max_results: usize,
    now: i64
  ) -> Result<SyncReport> {
    let entries = self.fetch_latest_videos(channel_id, max_results);
    if entries.is_empty() {
      warn!("No videos found in the feed for channel {}", channel_id);
    }
    let report = sync_entries(pool, &entries, now)?;
    info!(
      "Video sync for channel {}: {} created, {} updated",
      channel_id,
      report.created,
      report.updated
    );
    Ok(report)
  }

}

// Upserts every entry on its YouTube id. Entries without
// a publication date get the current time.
pub fn sync_entries(pool: &Pool, entries: &[FeedEntry], now: i64) -> Result<SyncReport> {
  let mut report = SyncReport::default();
  for entry in entries {
    let created = upsert_video_by_youtube_id(
      pool,
      &entry.video_id,
      &entry.title,
      &entry.description,
      entry.published_at.unwrap_or(now),
      now
    )?;
    if created {
      report.created += 1;
    } else {
      report.updated += 1;
    }
  }
  Ok(report)
}
