use color_eyre::Result;
use derive_more::Display;
use serde::Serialize;
use crate::db::{Pool, view_aggregates};
use crate::utils::time_utils::days_before;

// Trailing window for the "recent views" count.
pub const RECENT_WINDOW_DAYS: i64 = 30;

const HIGH_MIN_SECONDS: f64 = 30.0;
const HIGH_MIN_SCROLL: f64 = 50.0;
const MEDIUM_MIN_SECONDS: f64 = 15.0;
const MEDIUM_MIN_SCROLL: f64 = 25.0;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngagementTier {
  #[display(fmt = "High")]
  High,
  #[display(fmt = "Medium")]
  Medium,
  #[display(fmt = "Low")]
  Low
}

impl EngagementTier {
  // Both thresholds of a tier have to be met.
  pub fn classify(avg_seconds: f64, avg_scroll: f64) -> Self {
    if avg_seconds >= HIGH_MIN_SECONDS && avg_scroll >= HIGH_MIN_SCROLL {
      EngagementTier::High
    } else if avg_seconds >= MEDIUM_MIN_SECONDS && avg_scroll >= MEDIUM_MIN_SCROLL {
      EngagementTier::Medium
    } else {
      EngagementTier::Low
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngagementStats {
  pub total_views: i64,
  pub recent_views: i64,
  pub avg_time_on_page: f64,
  pub avg_scroll_depth: f64,
  pub tier: EngagementTier
}

// Everything is computed on read from the view events.
pub fn engagement_for(
  pool: &Pool,
  content_type: &str,
  content_id: Option<i64>,
  now: i64
) -> Result<EngagementStats> {
  let agg = view_aggregates(
    pool,
    content_type,
    content_id,
    days_before(now, RECENT_WINDOW_DAYS)
  )?;
  let avg_time_on_page = agg.avg_time_on_page.unwrap_or(0.0);
  let avg_scroll_depth = agg.avg_scroll_depth.unwrap_or(0.0);
  Ok(EngagementStats {
    total_views: agg.distinct_sessions,
    recent_views: agg.distinct_sessions_since,
    avg_time_on_page,
    avg_scroll_depth,
    tier: EngagementTier::classify(avg_time_on_page, avg_scroll_depth)
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{test_pool, upsert_view_event, ViewEventUpsert};
  use crate::utils::time_utils::SECONDS_PER_DAY;

  #[test]
  fn tier_boundaries() {
    assert_eq!(EngagementTier::Medium, EngagementTier::classify(29.0, 50.0));
    assert_eq!(EngagementTier::High, EngagementTier::classify(30.0, 50.0));
    assert_eq!(EngagementTier::Low, EngagementTier::classify(0.0, 0.0));
    assert_eq!(EngagementTier::Medium, EngagementTier::classify(30.0, 49.9));
    assert_eq!(EngagementTier::Medium, EngagementTier::classify(15.0, 25.0));
    assert_eq!(EngagementTier::Low, EngagementTier::classify(14.9, 100.0));
    assert_eq!(EngagementTier::Low, EngagementTier::classify(100.0, 24.9));
  }

  #[test]
  fn tier_labels() {
    assert_eq!("High", EngagementTier::High.to_string());
    assert_eq!("Low", EngagementTier::Low.to_string());
  }

  fn upsert(pool: &Pool, session: &str, time: i64, scroll: i64, at: i64) {
    let hit = ViewEventUpsert {
      session_key: session,
      content_type: "postagem",
      content_id: Some(1),
      content_title: "",
      time_on_page: time,
      scroll_depth: scroll,
      ip_address: None,
      user_agent: ""
    };
    upsert_view_event(pool, &hit, at).unwrap();
  }

  #[test]
  fn no_events_means_low_and_zeroes() {
    let (_dir, pool) = test_pool();
    let stats = engagement_for(&pool, "postagem", Some(1), 1_000_000).unwrap();
    assert_eq!(0, stats.total_views);
    assert_eq!(0.0, stats.avg_time_on_page);
    assert_eq!(EngagementTier::Low, stats.tier);
  }

  #[test]
  fn distinct_sessions_not_rows() {
    let (_dir, pool) = test_pool();
    let now = 100 * SECONDS_PER_DAY;
    // Same session reporting many times:
    for i in 0..5 {
      upsert(&pool, "s1", 40 + i, 60, now - 40 * SECONDS_PER_DAY);
    }
    upsert(&pool, "s2", 30, 50, now - SECONDS_PER_DAY);
    let stats = engagement_for(&pool, "postagem", Some(1), now).unwrap();
    assert_eq!(2, stats.total_views);
    // s1's first_seen is 40 days old:
    assert_eq!(1, stats.recent_views);
    assert_eq!(37.0, stats.avg_time_on_page);
    assert_eq!(55.0, stats.avg_scroll_depth);
    assert_eq!(EngagementTier::High, stats.tier);
  }
}
