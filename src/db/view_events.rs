use rusqlite::{params, OptionalExtension, TransactionBehavior};
use eyre::WrapErr;
use color_eyre::Result;
use super::entities::ViewEvent;
use super::mappers::{map_view_event, VIEW_EVENT_FIELDS};
use super::{Pool, select_many};

// What the tracking endpoint knows about a hit. The
// mutable fields get overwritten on every call.
#[derive(Debug, Clone)]
pub struct ViewEventUpsert<'a> {
  pub session_key: &'a str,
  pub content_type: &'a str,
  pub content_id: Option<i64>,
  pub content_title: &'a str,
  pub time_on_page: i64,
  pub scroll_depth: i64,
  pub ip_address: Option<&'a str>,
  pub user_agent: &'a str
}

// Raw aggregates for one content item, computed on read.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewAggregates {
  pub distinct_sessions: i64,
  pub distinct_sessions_since: i64,
  pub avg_time_on_page: Option<f64>,
  pub avg_scroll_depth: Option<f64>
}

// Get or create the row for (session, type, id), then
// overwrite duration, scroll, title and last_seen. The
// immediate transaction serializes concurrent upserts for
// the same key, last write wins.
// Returns true when a new row was created.
pub fn upsert_view_event(
  pool: &Pool,
  hit: &ViewEventUpsert,
  now: i64
) -> Result<bool> {
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let existing: Option<i64> = tx.query_row(
    "SELECT id FROM view_events WHERE session_key = ? \
    AND content_type = ? AND content_id IS ?",
    params![hit.session_key, hit.content_type, hit.content_id],
    |row| row.get(0)
  ).optional()?;
  let created = match existing {
    Some(id) => {
      tx.execute(
        "UPDATE view_events SET time_on_page = ?, scroll_depth = ?, \
        content_title = ?, last_seen = ? WHERE id = ?",
        params![hit.time_on_page, hit.scroll_depth, hit.content_title, now, id]
      )?;
      false
    },
    None => {
      tx.execute(
        "INSERT INTO view_events (session_key, content_type, content_id, \
        content_title, time_on_page, scroll_depth, ip_address, user_agent, \
        first_seen, last_seen) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
          hit.session_key,
          hit.content_type,
          hit.content_id,
          hit.content_title,
          hit.time_on_page,
          hit.scroll_depth,
          hit.ip_address,
          hit.user_agent,
          now,
          now
        ]
      )?;
      true
    }
  };
  tx.commit().context("Upserting view event")?;
  Ok(created)
}

// Distinct sessions (all time and since the given
// timestamp), mean time over events with a positive
// duration, mean scroll over all events.
pub fn view_aggregates(
  pool: &Pool,
  content_type: &str,
  content_id: Option<i64>,
  since: i64
) -> Result<ViewAggregates> {
  let conn = pool.get()?;
  conn.query_row(
    "SELECT count(DISTINCT session_key), \
    count(DISTINCT CASE WHEN first_seen >= ?3 THEN session_key END), \
    avg(CASE WHEN time_on_page > 0 THEN time_on_page END), \
    avg(scroll_depth) \
    FROM view_events WHERE content_type = ?1 AND content_id IS ?2",
    params![content_type, content_id, since],
    |row| Ok(ViewAggregates {
      distinct_sessions: row.get(0)?,
      distinct_sessions_since: row.get(1)?,
      avg_time_on_page: row.get(2)?,
      avg_scroll_depth: row.get(3)?
    })
  ).context("Computing view aggregates")
}

pub fn view_events_for(
  pool: &Pool,
  content_type: &str,
  content_id: Option<i64>
) -> Result<Vec<ViewEvent>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM view_events WHERE content_type = ? AND content_id IS ? \
      ORDER BY first_seen ASC",
      VIEW_EVENT_FIELDS
    ),
    params![content_type, content_id],
    map_view_event
  )
}

pub fn all_view_events(pool: &Pool) -> Result<Vec<ViewEvent>> {
  select_many(
    pool,
    &format!("SELECT {} FROM view_events ORDER BY last_seen DESC", VIEW_EVENT_FIELDS),
    [],
    map_view_event
  )
}
