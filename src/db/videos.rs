use rusqlite::{params, OptionalExtension, TransactionBehavior};
use eyre::WrapErr;
use color_eyre::Result;
use super::entities::*;
use super::mappers::{map_video, VIDEO_FIELDS};
use super::queries::{select_query_builder, Order, OrderBy};
use super::{Pool, select_many, select_one, count};

pub fn video_count(pool: &Pool) -> Result<i64> {
  count(pool, "SELECT count(*) FROM videos", [])
}

pub fn videos_from_to(
  pool: &Pool,
  start: usize,
  max: usize
) -> Result<Vec<Video>> {
  let query = select_query_builder(
    VIDEO_FIELDS,
    "videos",
    &[],
    Some(OrderBy::new(Order::Desc, "published_at")),
    Some(max),
    Some(start)
  );
  select_many(pool, &query, [], map_video)
}

pub fn all_videos(pool: &Pool) -> Result<Vec<Video>> {
  let query = select_query_builder(
    VIDEO_FIELDS,
    "videos",
    &[],
    Some(OrderBy::new(Order::Desc, "published_at")),
    None,
    None
  );
  select_many(pool, &query, [], map_video)
}

pub fn video_by_youtube_id(pool: &Pool, youtube_id: &str) -> Result<Option<Video>> {
  select_one(
    pool,
    &format!("SELECT {} FROM videos WHERE youtube_id = ?", VIDEO_FIELDS),
    params![youtube_id],
    map_video
  )
}

pub fn insert_video(pool: &Pool, video: &mut Video) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO videos (title, youtube_id, description, published_at, created_at) \
    VALUES (?, ?, ?, ?, ?)",
    params![
      video.title,
      video.youtube_id,
      video.description,
      video.published_at,
      video.created_at
    ]
  ).context("Inserting video")?;
  video.id = conn.last_insert_rowid();
  Ok(())
}

pub fn delete_video(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute("DELETE FROM videos WHERE id = ?", params![id])
    .context("Deleting video")?;
  Ok(changed > 0)
}

// Update or create keyed on the YouTube id, overwriting
// title, description and publication date.
// Returns true when a new row was created.
pub fn upsert_video_by_youtube_id(
  pool: &Pool,
  youtube_id: &str,
  title: &str,
  description: &str,
  published_at: i64,
  now: i64
) -> Result<bool> {
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let existing: Option<i64> = tx.query_row(
    "SELECT id FROM videos WHERE youtube_id = ?",
    params![youtube_id],
    |row| row.get(0)
  ).optional()?;
  let created = match existing {
    Some(id) => {
      tx.execute(
        "UPDATE videos SET title = ?, description = ?, published_at = ? WHERE id = ?",
        params![title, description, published_at, id]
      )?;
      false
    },
    None => {
      tx.execute(
        "INSERT INTO videos (title, youtube_id, description, published_at, created_at) \
        VALUES (?, ?, ?, ?, ?)",
        params![title, youtube_id, description, published_at, now]
      )?;
      true
    }
  };
  tx.commit().context("Upserting video")?;
  Ok(created)
}
