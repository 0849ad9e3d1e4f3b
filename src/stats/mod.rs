/*
 * The stats module groups the view tracking
 * and the engagement metrics computed from it.
 */

use color_eyre::Result;
use eyre::eyre;
use std::net::IpAddr;
use log::debug;
use crate::db::{Pool, upsert_view_event, ViewEventUpsert};
use crate::utils::text_utils::truncate_utf8;
pub mod engagement;

// Content type tag the post pages report with, and the
// one the stats endpoint aggregates on.
pub const CONTENT_TYPE_POST: &str = "postagem";
pub const MAX_CONTENT_TYPE_LENGTH: usize = 20;
pub const MAX_CONTENT_TITLE_LENGTH: usize = 200;
pub const MAX_USER_AGENT_LENGTH: usize = 300;

// One report from the tracking script, before any
// normalization.
#[derive(Debug)]
pub struct BaseViewStat {
  pub session_key: String,
  pub content_type: String,
  pub content_id: Option<i64>,
  pub content_title: String,
  pub time_on_page: f64,
  pub scroll_depth: f64,
  pub client_ua: String,
  pub client_ip: Option<IpAddr>
}

// Seconds on page: rounded, never negative.
pub fn normalize_seconds(value: f64) -> i64 {
  if value.is_finite() && value > 0.0 {
    value.round() as i64
  } else {
    0
  }
}

// Scroll depth percentage: rounded, within 0..=100.
pub fn normalize_percent(value: f64) -> i64 {
  if value.is_finite() {
    value.round().max(0.0).min(100.0) as i64
  } else {
    0
  }
}

// Normalizes the report then upserts the view event for
// (session, type, id). Returns true when the row is new.
pub fn record_view(pool: &Pool, stat: BaseViewStat, now: i64) -> Result<bool> {
  let mut content_type = stat.content_type.trim().to_string();
  if content_type.is_empty() {
    return Err(eyre!("Content type (tipo_conteudo) is required"));
  }
  truncate_utf8(&mut content_type, MAX_CONTENT_TYPE_LENGTH);
  let mut content_title = stat.content_title.trim().to_string();
  truncate_utf8(&mut content_title, MAX_CONTENT_TITLE_LENGTH);
  let mut user_agent = stat.client_ua;
  truncate_utf8(&mut user_agent, MAX_USER_AGENT_LENGTH);
  let ip_address = stat.client_ip.map(|ip| ip.to_string());

  let upsert = ViewEventUpsert {
    session_key: &stat.session_key,
    content_type: &content_type,
    content_id: stat.content_id,
    content_title: &content_title,
    time_on_page: normalize_seconds(stat.time_on_page),
    scroll_depth: normalize_percent(stat.scroll_depth),
    ip_address: ip_address.as_deref(),
    user_agent: &user_agent
  };
  debug!("Recording view event: {:?}", upsert);
  upsert_view_event(pool, &upsert, now)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{test_pool, view_events_for};

  fn stat(content_type: &str, time: f64, scroll: f64) -> BaseViewStat {
    BaseViewStat {
      session_key: "s1".to_string(),
      content_type: content_type.to_string(),
      content_id: Some(1),
      content_title: "  Brass: Birmingham  ".to_string(),
      time_on_page: time,
      scroll_depth: scroll,
      client_ua: "Mozilla".to_string(),
      client_ip: "192.168.0.10".parse().ok()
    }
  }

  #[test]
  fn seconds_and_percent_normalization() {
    assert_eq!(13, normalize_seconds(12.6));
    assert_eq!(0, normalize_seconds(-4.0));
    assert_eq!(0, normalize_seconds(f64::NAN));
    assert_eq!(100, normalize_percent(140.2));
    assert_eq!(0, normalize_percent(-1.0));
    assert_eq!(50, normalize_percent(49.5));
  }

  #[test]
  fn record_view_normalizes_before_saving() {
    let (_dir, pool) = test_pool();
    assert!(record_view(&pool, stat("postagem", 31.4, 120.0), 10).unwrap());
    let events = view_events_for(&pool, "postagem", Some(1)).unwrap();
    assert_eq!(1, events.len());
    assert_eq!(31, events[0].time_on_page);
    assert_eq!(100, events[0].scroll_depth);
    assert_eq!("Brass: Birmingham", events[0].content_title);
    assert_eq!(Some("192.168.0.10".to_string()), events[0].ip_address);
  }

  #[test]
  fn blank_content_type_is_rejected() {
    let (_dir, pool) = test_pool();
    assert!(record_view(&pool, stat("   ", 1.0, 1.0), 10).is_err());
  }
}
