use std::sync::RwLock;
use log::{debug, error};
use serde::Deserialize;
use ureq::Agent;
use super::{http_agent, YoutubeError};
use crate::config::Config;

// The parts of the Data API "channels" response we use.
// subscriberCount comes as a string.
#[derive(Deserialize)]
struct ChannelListResponse {
  #[serde(default)]
  items: Vec<ChannelItem>
}

#[derive(Deserialize)]
struct ChannelItem {
  statistics: Option<ChannelStatistics>
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
  subscriber_count: Option<String>
}

pub fn parse_subscriber_count(json: &str) -> Result<Option<u64>, YoutubeError> {
  let response: ChannelListResponse = serde_json::from_str(json)?;
  let count = response.items.into_iter()
    .next()
    .and_then(|item| item.statistics)
    .and_then(|stats| stats.subscriber_count)
    .and_then(|count| count.trim().parse::<u64>().ok());
  Ok(count)
}

struct CachedCount {
  channel_id: String,
  count: u64,
  fetched_at: i64
}

pub struct ChannelStatsClient {
  agent: Agent,
  api_base: String,
  cache_ttl: i64,
  cache: RwLock<Option<CachedCount>>
}

impl ChannelStatsClient {

  pub fn new(config: &Config) -> Self {
    Self {
      agent: http_agent(config.youtube_api_timeout),
      api_base: config.youtube_api_base.clone(),
      cache_ttl: config.subscriber_cache_ttl,
      cache: RwLock::new(None)
    }
  }

  fn cached(&self, channel_id: &str, now: i64) -> Option<u64> {
    let cache = self.cache.read().ok()?;
    cache.as_ref()
      .filter(|c| c.channel_id == channel_id && now - c.fetched_at < self.cache_ttl)
      .map(|c| c.count)
  }

  fn fetch(&self, channel_id: &str, api_key: &str) -> Result<Option<u64>, YoutubeError> {
    let body = self.agent.get(&format!("{}/channels", self.api_base))
      .query("part", "statistics")
      .query("id", channel_id)
      .query("key", api_key)
      .call()?
      .into_body()
      .read_to_string()?;
    parse_subscriber_count(&body)
  }

  // Live subscriber count, None when the API can't give
  // one. Successful answers are cached for the TTL.
  pub fn subscriber_count(&self, channel_id: &str, api_key: &str, now: i64) -> Option<u64> {
    if let Some(count) = self.cached(channel_id, now) {
      debug!("Subscriber count for {} served from cache", channel_id);
      return Some(count);
    }
    match self.fetch(channel_id, api_key) {
      Ok(Some(count)) => {
        if let Ok(mut cache) = self.cache.write() {
          *cache = Some(CachedCount {
            channel_id: channel_id.to_string(),
            count,
            fetched_at: now
          });
        }
        Some(count)
      },
      Ok(None) => {
        error!("No subscriber count in the API response for channel {}", channel_id);
        None
      },
      Err(e) => {
        error!("Could not get the subscriber count for channel {}: {}", channel_id, e);
        None
      }
    }
  }

}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::tests::test_config;

  #[test]
  fn parses_subscriber_count() {
    let json = r#"{
      "kind": "youtube#channelListResponse",
      "items": [{
        "id": "UC123",
        "statistics": {"viewCount": "999", "subscriberCount": "12345", "hiddenSubscriberCount": false}
      }]
    }"#;
    assert_eq!(Some(12345), parse_subscriber_count(json).unwrap());
  }

  #[test]
  fn no_items_means_no_count() {
    assert_eq!(None, parse_subscriber_count(r#"{"items": []}"#).unwrap());
    assert_eq!(None, parse_subscriber_count("{}").unwrap());
    assert!(parse_subscriber_count("not json").is_err());
  }

  #[test]
  fn cache_is_used_within_ttl() {
    let client = ChannelStatsClient::new(&test_config("unused.db"));
    *client.cache.write().unwrap() = Some(CachedCount {
      channel_id: "UC123".to_string(),
      count: 42,
      fetched_at: 1000
    });
    assert_eq!(Some(42), client.cached("UC123", 1000 + 3599));
    assert_eq!(None, client.cached("UC123", 1000 + 3600));
    assert_eq!(None, client.cached("UC999", 1001));
  }

  #[test]
  fn unreachable_api_gives_none() {
    let mut config = test_config("unused.db");
    config.youtube_api_base = "http://127.0.0.1:9/youtube/v3".to_string();
    let client = ChannelStatsClient::new(&config);
    assert_eq!(None, client.subscriber_count("UC123", "key", 0));
  }
}
