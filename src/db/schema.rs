use color_eyre::Result;
use eyre::WrapErr;
use super::Pool;

// Idempotent schema bootstrap, safe to run at every
// startup. There's no versioned migration system, new
// tables and indexes just get added here.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS posts (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  subtitle TEXT NOT NULL DEFAULT '',
  content TEXT NOT NULL DEFAULT '',
  category TEXT NOT NULL DEFAULT 'novidades',
  cover_image TEXT,
  status TEXT NOT NULL DEFAULT 'rascunho',
  published_at INTEGER NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS posts_status_published
  ON posts (status, published_at DESC);

CREATE TABLE IF NOT EXISTS videos (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  youtube_id TEXT NOT NULL UNIQUE,
  description TEXT NOT NULL DEFAULT '',
  published_at INTEGER NOT NULL,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS site_config (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  hero_title TEXT NOT NULL,
  hero_description TEXT NOT NULL,
  about_text TEXT NOT NULL,
  games_reviewed INTEGER NOT NULL,
  videos_per_month INTEGER NOT NULL,
  channel_subscribers INTEGER NOT NULL,
  youtube_url TEXT NOT NULL,
  instagram_url TEXT NOT NULL DEFAULT '',
  developer_name TEXT NOT NULL,
  youtube_channel_id TEXT,
  youtube_api_key TEXT,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS view_events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  session_key TEXT NOT NULL,
  content_type TEXT NOT NULL,
  content_id INTEGER,
  content_title TEXT NOT NULL DEFAULT '',
  time_on_page INTEGER NOT NULL DEFAULT 0,
  scroll_depth INTEGER NOT NULL DEFAULT 0,
  ip_address TEXT,
  user_agent TEXT NOT NULL DEFAULT '',
  first_seen INTEGER NOT NULL,
  last_seen INTEGER NOT NULL
);
-- One row per session and content item. A missing
-- content id counts as its own item.
CREATE UNIQUE INDEX IF NOT EXISTS view_events_session_item
  ON view_events (session_key, content_type, IFNULL(content_id, -1));
CREATE INDEX IF NOT EXISTS view_events_item
  ON view_events (content_type, content_id);

CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  username TEXT NOT NULL UNIQUE,
  password_hash TEXT NOT NULL,
  is_staff INTEGER NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL,
  last_login INTEGER
);

CREATE TABLE IF NOT EXISTS sessions (
  session_key TEXT PRIMARY KEY,
  user_id INTEGER REFERENCES users (id) ON DELETE SET NULL,
  created_at INTEGER NOT NULL,
  expires_at INTEGER NOT NULL
);
";

pub fn create_schema(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(SCHEMA)
    .context("Creating database schema")
}

pub fn sqlite_version(pool: &Pool) -> Result<String> {
  let conn = pool.get()?;
  conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))
    .context("Reading SQLite version")
}
