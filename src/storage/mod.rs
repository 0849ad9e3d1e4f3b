/*
 * Blob storage for post cover images.
 * Only the Supabase Storage backend exists, the
 * disabled backend is used when it's not configured.
 */

use std::path::Path;
use color_eyre::Result;
use eyre::eyre;
use log::warn;
use uuid::Uuid;
use crate::config::Config;
pub mod supabase;

pub trait BlobStorage: Send + Sync {
  // Stores the bytes under a fresh name derived from
  // the given one and returns the stored name.
  fn save(&self, name: &str, content: &[u8]) -> Result<String>;
  fn open(&self, name: &str) -> Result<Vec<u8>>;
  // Never fails, missing files are fine.
  fn delete(&self, name: &str);
  fn exists(&self, name: &str) -> bool;
  fn url(&self, name: &str) -> Option<String>;
  fn size(&self, name: &str) -> u64;
  fn backend_name(&self) -> &'static str;
}

// Random name keeping the original extension:
// "photo.JPG" -> "0f8f...c1.JPG".
pub fn available_name(name: &str) -> String {
  let unique = Uuid::new_v4().simple().to_string();
  match Path::new(name).extension().and_then(|e| e.to_str()) {
    Some(ext) if !ext.is_empty() => format!("{}.{}", unique, ext),
    _ => unique
  }
}

pub fn guess_content_type(name: &str) -> &'static str {
  let ext = Path::new(name)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "avif" => "image/avif",
    "svg" => "image/svg+xml",
    "ico" => "image/vnd.microsoft.icon",
    "pdf" => "application/pdf",
    "json" => "application/json",
    "txt" => "text/plain",
    "mp4" => "video/mp4",
    _ => "application/octet-stream"
  }
}

pub struct DisabledStorage;

impl BlobStorage for DisabledStorage {
  fn save(&self, name: &str, _content: &[u8]) -> Result<String> {
    Err(eyre!("Blob storage is not configured, cannot save {}", name))
  }

  fn open(&self, name: &str) -> Result<Vec<u8>> {
    Err(eyre!("Blob storage is not configured, cannot open {}", name))
  }

  fn delete(&self, _name: &str) {}

  fn exists(&self, _name: &str) -> bool {
    false
  }

  fn url(&self, _name: &str) -> Option<String> {
    None
  }

  fn size(&self, _name: &str) -> u64 {
    0
  }

  fn backend_name(&self) -> &'static str {
    "disabled"
  }
}

pub fn storage_from_config(config: &Config) -> Box<dyn BlobStorage> {
  match (&config.supabase_url, &config.supabase_key) {
    (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Box::new(
      supabase::SupabaseStorage::new(url, key, &config.supabase_bucket, config.youtube_api_timeout)
    ),
    _ => {
      warn!("SUPABASE_URL or SUPABASE_KEY missing, cover uploads are disabled");
      Box::new(DisabledStorage)
    }
  }
}

#[cfg(test)]
pub mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::sync::{Arc, Mutex};
  use crate::config::tests::test_config;

  // Keeps blobs in memory and remembers what got deleted.
  // Clones share the same content.
  #[derive(Clone, Default)]
  pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    deleted: Arc<Mutex<Vec<String>>>
  }

  impl MemoryStorage {
    pub fn insert(&self, name: &str, content: &[u8]) {
      self.blobs.lock().unwrap().insert(name.to_string(), content.to_vec());
    }

    pub fn deleted(&self) -> Vec<String> {
      self.deleted.lock().unwrap().clone()
    }
  }

  impl BlobStorage for MemoryStorage {
    fn save(&self, name: &str, content: &[u8]) -> Result<String> {
      let stored = available_name(name);
      self.insert(&stored, content);
      Ok(stored)
    }

    fn open(&self, name: &str) -> Result<Vec<u8>> {
      self.blobs.lock().unwrap()
        .get(name)
        .cloned()
        .ok_or_else(|| eyre!("No blob named {}", name))
    }

    fn delete(&self, name: &str) {
      self.blobs.lock().unwrap().remove(name);
      self.deleted.lock().unwrap().push(name.to_string());
    }

    fn exists(&self, name: &str) -> bool {
      self.blobs.lock().unwrap().contains_key(name)
    }

    fn url(&self, name: &str) -> Option<String> {
      Some(format!("memory://{}", name))
    }

    fn size(&self, name: &str) -> u64 {
      self.blobs.lock().unwrap().get(name).map(|b| b.len() as u64).unwrap_or(0)
    }

    fn backend_name(&self) -> &'static str {
      "memory"
    }
  }

  #[test]
  fn available_name_keeps_extension() {
    let name = available_name("capa do jogo.png");
    assert!(name.ends_with(".png"));
    assert_eq!(32 + 4, name.len());
    assert_ne!(name, available_name("capa do jogo.png"));
  }

  #[test]
  fn available_name_without_extension() {
    let name = available_name("README");
    assert_eq!(32, name.len());
    assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn content_types() {
    assert_eq!("image/jpeg", guess_content_type("a.JPG"));
    assert_eq!("image/webp", guess_content_type("dir/b.webp"));
    assert_eq!("application/octet-stream", guess_content_type("noext"));
    assert_eq!("application/octet-stream", guess_content_type("a.xyz"));
  }

  #[test]
  fn missing_credentials_disable_storage() {
    let storage = storage_from_config(&test_config("unused.db"));
    assert_eq!("disabled", storage.backend_name());
    assert!(storage.save("a.png", b"data").is_err());
    assert_eq!(None, storage.url("a.png"));
    assert!(!storage.exists("a.png"));
  }

  #[test]
  fn credentials_enable_supabase() {
    let mut config = test_config("unused.db");
    config.supabase_url = Some("https://abc.supabase.co".to_string());
    config.supabase_key = Some("secret".to_string());
    let storage = storage_from_config(&config);
    assert_eq!("supabase", storage.backend_name());
    assert_eq!(
      Some("https://abc.supabase.co/storage/v1/object/public/media/x.png".to_string()),
      storage.url("x.png")
    );
  }
}
