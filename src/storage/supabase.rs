use color_eyre::Result;
use eyre::WrapErr;
use log::{error, info};
use ureq::Agent;
use super::{available_name, guess_content_type, BlobStorage};
use crate::youtube::http_agent;

// Supabase Storage through its REST API. Objects are
// written and read with the service key, served to the
// public through the public object URL.
pub struct SupabaseStorage {
  agent: Agent,
  base_url: String,
  key: String,
  bucket: String
}

impl SupabaseStorage {

  pub fn new(url: &str, key: &str, bucket: &str, timeout_secs: u64) -> Self {
    Self {
      agent: http_agent(timeout_secs),
      base_url: url.trim_end_matches('/').to_string(),
      key: key.to_string(),
      bucket: bucket.to_string()
    }
  }

  fn object_url(&self, name: &str) -> String {
    format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, name)
  }

  fn bearer(&self) -> String {
    format!("Bearer {}", self.key)
  }

  fn head(&self, name: &str) -> Result<Option<u64>> {
    match self.agent.head(&self.object_url(name))
      .header("Authorization", &self.bearer())
      .call() {
      Ok(resp) => {
        let size = resp.headers()
          .get("content-length")
          .and_then(|v| v.to_str().ok())
          .and_then(|v| v.parse::<u64>().ok())
          .unwrap_or(0);
        Ok(Some(size))
      },
      Err(ureq::Error::StatusCode(404)) | Err(ureq::Error::StatusCode(400)) => Ok(None),
      Err(e) => Err(e).context("Supabase HEAD request")
    }
  }

}

impl BlobStorage for SupabaseStorage {

  fn save(&self, name: &str, content: &[u8]) -> Result<String> {
    let stored_name = available_name(name);
    self.agent.post(&self.object_url(&stored_name))
      .header("Authorization", &self.bearer())
      .header("Content-Type", guess_content_type(&stored_name))
      .header("x-upsert", "false")
      .send(content)
      .context("Uploading to Supabase Storage")?;
    info!("Uploaded {} to bucket {} as {}", name, self.bucket, stored_name);
    Ok(stored_name)
  }

  fn open(&self, name: &str) -> Result<Vec<u8>> {
    let content = self.agent.get(&self.object_url(name))
      .header("Authorization", &self.bearer())
      .call()
      .context("Downloading from Supabase Storage")?
      .into_body()
      .read_to_vec()?;
    Ok(content)
  }

  fn delete(&self, name: &str) {
    let result = self.agent.delete(&self.object_url(name))
      .header("Authorization", &self.bearer())
      .call();
    if let Err(e) = result {
      error!("Could not delete {} from Supabase Storage: {}", name, e);
    }
  }

  fn exists(&self, name: &str) -> bool {
    match self.head(name) {
      Ok(found) => found.is_some(),
      Err(e) => {
        error!("Checking {} in Supabase Storage: {}", name, e);
        false
      }
    }
  }

  fn url(&self, name: &str) -> Option<String> {
    Some(format!(
      "{}/storage/v1/object/public/{}/{}",
      self.base_url,
      self.bucket,
      name
    ))
  }

  fn size(&self, name: &str) -> u64 {
    match self.head(name) {
      Ok(size) => size.unwrap_or(0),
      Err(e) => {
        error!("Getting the size of {} in Supabase Storage: {}", name, e);
        0
      }
    }
  }

  fn backend_name(&self) -> &'static str {
    "supabase"
  }

}
