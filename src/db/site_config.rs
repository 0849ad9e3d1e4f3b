use rusqlite::params;
use eyre::{WrapErr, eyre};
use color_eyre::Result;
use super::entities::SiteConfig;
use super::mappers::{map_site_config, SITE_CONFIG_FIELDS};
use super::{Pool, select_one};

// The row id is forced to 1 by a CHECK constraint, there
// can't be a second configuration row.
pub const SITE_CONFIG_ID: i64 = 1;

// Get or create. Returns the config and whether it was
// created by this call.
pub fn site_config_get_or_create(pool: &Pool, now: i64) -> Result<(SiteConfig, bool)> {
  let defaults = SiteConfig::defaults();
  let created = {
    let conn = pool.get()?;
    conn.execute(
      "INSERT OR IGNORE INTO site_config (id, hero_title, hero_description, about_text, \
      games_reviewed, videos_per_month, channel_subscribers, youtube_url, instagram_url, \
      developer_name, youtube_channel_id, youtube_api_key, updated_at) \
      VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
      params![
        SITE_CONFIG_ID,
        defaults.hero_title,
        defaults.hero_description,
        defaults.about_text,
        defaults.games_reviewed,
        defaults.videos_per_month,
        defaults.channel_subscribers,
        defaults.youtube_url,
        defaults.instagram_url,
        defaults.developer_name,
        defaults.youtube_channel_id,
        defaults.youtube_api_key,
        now
      ]
    ).context("Creating site configuration")? > 0
  };
  let config = select_one(
    pool,
    &format!("SELECT {} FROM site_config WHERE id = ?", SITE_CONFIG_FIELDS),
    params![SITE_CONFIG_ID],
    map_site_config
  )?.ok_or_else(|| eyre!("Site configuration row vanished right after creation"))?;
  Ok((config, created))
}

pub fn save_site_config(pool: &Pool, config: &SiteConfig, now: i64) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "UPDATE site_config SET hero_title = ?, hero_description = ?, about_text = ?, \
    games_reviewed = ?, videos_per_month = ?, channel_subscribers = ?, youtube_url = ?, \
    instagram_url = ?, developer_name = ?, youtube_channel_id = ?, youtube_api_key = ?, \
    updated_at = ? WHERE id = ?",
    params![
      config.hero_title,
      config.hero_description,
      config.about_text,
      config.games_reviewed,
      config.videos_per_month,
      config.channel_subscribers,
      config.youtube_url,
      config.instagram_url,
      config.developer_name,
      config.youtube_channel_id,
      config.youtube_api_key,
      now,
      SITE_CONFIG_ID
    ]
  ).context("Saving site configuration")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{test_pool, count};

  #[test]
  fn get_or_create_is_a_singleton() {
    let (_dir, pool) = test_pool();
    let (first, created) = site_config_get_or_create(&pool, 10).unwrap();
    assert!(created);
    for _ in 0..3 {
      let (again, created) = site_config_get_or_create(&pool, 20).unwrap();
      assert!(!created);
      assert_eq!(first.id, again.id);
    }
    assert_eq!(1, count(&pool, "SELECT count(*) FROM site_config", []).unwrap());
    assert_eq!(SITE_CONFIG_ID, first.id);
    assert_eq!("Bem-vindo ao Mesa Secreta", first.hero_title);
  }

  #[test]
  fn second_row_is_rejected_by_the_database() {
    let (_dir, pool) = test_pool();
    site_config_get_or_create(&pool, 10).unwrap();
    let conn = pool.get().unwrap();
    let result = conn.execute(
      "INSERT INTO site_config (id, hero_title, hero_description, about_text, \
      games_reviewed, videos_per_month, channel_subscribers, youtube_url, \
      developer_name, updated_at) VALUES (2, '', '', '', 0, 0, 0, '', '', 0)",
      []
    );
    assert!(result.is_err());
  }

  #[test]
  fn save_then_reload() {
    let (_dir, pool) = test_pool();
    let (mut config, _) = site_config_get_or_create(&pool, 10).unwrap();
    config.channel_subscribers = 12345;
    config.youtube_api_key = Some("key".to_string());
    save_site_config(&pool, &config, 30).unwrap();
    let (reloaded, created) = site_config_get_or_create(&pool, 40).unwrap();
    assert!(!created);
    assert_eq!(12345, reloaded.channel_subscribers);
    assert_eq!(Some("key".to_string()), reloaded.youtube_api_key);
    assert_eq!(30, reloaded.updated_at);
  }
}
