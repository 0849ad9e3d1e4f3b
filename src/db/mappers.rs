use super::entities::*;
use rusqlite::{Row, Error};
use rusqlite::types::Type;
use std::str::FromStr;

// Column lists have to match the order the mappers
// read them in.
pub const POST_FIELDS: &str = "id, title, subtitle, content, category, cover_image, \
  status, published_at, created_at, updated_at";
pub const VIDEO_FIELDS: &str = "id, title, youtube_id, description, published_at, created_at";
pub const SITE_CONFIG_FIELDS: &str = "id, hero_title, hero_description, about_text, \
  games_reviewed, videos_per_month, channel_subscribers, youtube_url, instagram_url, \
  developer_name, youtube_channel_id, youtube_api_key, updated_at";
pub const VIEW_EVENT_FIELDS: &str = "id, session_key, content_type, content_id, \
  content_title, time_on_page, scroll_depth, ip_address, user_agent, first_seen, last_seen";
pub const USER_FIELDS: &str = "id, username, password_hash, is_staff, created_at, last_login";
pub const SESSION_FIELDS: &str = "session_key, user_id, created_at, expires_at";

// The enums live as TEXT in SQLite, a bad value in there
// becomes a conversion error for that column.
fn parse_column<T: FromStr<Err = String>>(row: &Row, idx: usize) -> Result<T, Error> {
  let raw: String = row.get(idx)?;
  raw.parse::<T>()
    .map_err(|e| Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

pub fn map_post(row: &Row) -> Result<Post, Error> {
  Ok(Post {
    id: row.get(0)?,
    title: row.get(1)?,
    subtitle: row.get(2)?,
    content: row.get(3)?,
    category: parse_column(row, 4)?,
    cover_image: row.get(5)?,
    status: parse_column(row, 6)?,
    published_at: row.get(7)?,
    created_at: row.get(8)?,
    updated_at: row.get(9)?
  })
}

pub fn map_video(row: &Row) -> Result<Video, Error> {
  Ok(Video {
    id: row.get(0)?,
    title: row.get(1)?,
    youtube_id: row.get(2)?,
    description: row.get(3)?,
    published_at: row.get(4)?,
    created_at: row.get(5)?
  })
}

pub fn map_site_config(row: &Row) -> Result<SiteConfig, Error> {
  Ok(SiteConfig {
    id: row.get(0)?,
    hero_title: row.get(1)?,
    hero_description: row.get(2)?,
    about_text: row.get(3)?,
    games_reviewed: row.get(4)?,
    videos_per_month: row.get(5)?,
    channel_subscribers: row.get(6)?,
    youtube_url: row.get(7)?,
    instagram_url: row.get(8)?,
    developer_name: row.get(9)?,
    youtube_channel_id: row.get(10)?,
    youtube_api_key: row.get(11)?,
    updated_at: row.get(12)?
  })
}

pub fn map_view_event(row: &Row) -> Result<ViewEvent, Error> {
  Ok(ViewEvent {
    id: row.get(0)?,
    session_key: row.get(1)?,
    content_type: row.get(2)?,
    content_id: row.get(3)?,
    content_title: row.get(4)?,
    time_on_page: row.get(5)?,
    scroll_depth: row.get(6)?,
    ip_address: row.get(7)?,
    user_agent: row.get(8)?,
    first_seen: row.get(9)?,
    last_seen: row.get(10)?
  })
}

pub fn map_user(row: &Row) -> Result<User, Error> {
  let is_staff: i32 = row.get(3)?;
  Ok(User {
    id: row.get(0)?,
    username: row.get(1)?,
    password_hash: row.get(2)?,
    is_staff: is_staff == 1,
    created_at: row.get(4)?,
    last_login: row.get(5)?
  })
}

pub fn map_session(row: &Row) -> Result<Session, Error> {
  Ok(Session {
    session_key: row.get(0)?,
    user_id: row.get(1)?,
    created_at: row.get(2)?,
    expires_at: row.get(3)?
  })
}
