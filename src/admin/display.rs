use crate::db::entities::{Category, Post, PostStatus};
use crate::storage::BlobStorage;
use crate::utils::text_utils::truncated;

pub const SHORT_TITLE_LENGTH: usize = 50;

// Computed columns for the staff post list.
pub trait DisplayColumns {
  fn status_icon(&self) -> &'static str;
  fn status_color(&self) -> &'static str;
  fn category_badge(&self) -> String;
  fn category_color(&self) -> &'static str;
  fn short_title(&self) -> String;
}

impl Category {
  pub fn color(&self) -> &'static str {
    match self {
      Category::Novidades => "#2196F3",
      Category::Dicas => "#4CAF50",
      Category::Reviews => "#FF5722"
    }
  }
}

impl DisplayColumns for Post {
  fn status_icon(&self) -> &'static str {
    match self.status {
      PostStatus::Publicado => "✅",
      PostStatus::Rascunho => "📝"
    }
  }

  fn status_color(&self) -> &'static str {
    match self.status {
      PostStatus::Publicado => "#00ff88",
      PostStatus::Rascunho => "#ff9800"
    }
  }

  fn category_badge(&self) -> String {
    self.category.label().to_uppercase()
  }

  fn category_color(&self) -> &'static str {
    self.category.color()
  }

  fn short_title(&self) -> String {
    truncated(&self.title, SHORT_TITLE_LENGTH)
  }
}

pub fn cover_url(post: &Post, storage: &dyn BlobStorage) -> Option<String> {
  post.cover_image.as_deref()
    .filter(|name| !name.is_empty())
    .and_then(|name| storage.url(name))
}
