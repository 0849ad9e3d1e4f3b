use std::sync::RwLock;
use color_eyre::Result;
use log::{error, info};
use crate::config::Config;
use crate::db::{self, entities::SiteConfig, Pool};

// Process-wide copy of the site configuration record,
// loaded at startup and replaced when staff save it.
pub struct SiteSettings {
  current: RwLock<SiteConfig>
}

impl SiteSettings {

  pub fn load(pool: &Pool, now: i64) -> Result<Self> {
    let (config, created) = db::site_config_get_or_create(pool, now)?;
    if created {
      info!("Created the site configuration record with default values");
    }
    Ok(Self {
      current: RwLock::new(config)
    })
  }

  pub fn current(&self) -> SiteConfig {
    match self.current.read() {
      Ok(config) => config.clone(),
      Err(e) => {
        error!("Could not get a read handle on the site configuration - {}", e);
        SiteConfig::defaults()
      }
    }
  }

  pub fn replace(&self, config: SiteConfig) {
    match self.current.write() {
      Ok(mut current) => *current = config,
      Err(e) => error!("Could not get a write handle on the site configuration - {}", e)
    }
  }

}

// Channel id and Data API key: the site configuration
// record wins over the process configuration.
pub fn youtube_credentials(
  site_config: &SiteConfig,
  config: &Config
) -> (Option<String>, Option<String>) {
  let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
  let pick = |record: &Option<String>, fallback: &Option<String>| {
    non_empty(record).or_else(|| non_empty(fallback))
  };
  (
    pick(&site_config.youtube_channel_id, &config.youtube_channel_id),
    pick(&site_config.youtube_api_key, &config.youtube_api_key)
  )
}
