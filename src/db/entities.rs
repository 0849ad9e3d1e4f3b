use serde::{Deserialize, Serialize};
use derive_more::Display;
use std::str::FromStr;

// The enums are stored as their slug in SQLite, the
// slugs are also what the frontend sends around.

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  #[display(fmt = "novidades")]
  Novidades,
  #[display(fmt = "dicas")]
  Dicas,
  #[display(fmt = "reviews")]
  Reviews
}

impl Category {
  pub const ALL: [Category; 3] = [Category::Novidades, Category::Dicas, Category::Reviews];

  pub fn label(&self) -> &'static str {
    match self {
      Category::Novidades => "Novidades",
      Category::Dicas => "Dicas e Tutoriais",
      Category::Reviews => "Review de Jogos"
    }
  }
}

impl FromStr for Category {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "novidades" => Ok(Category::Novidades),
      "dicas" => Ok(Category::Dicas),
      "reviews" => Ok(Category::Reviews),
      other => Err(format!("Unknown category: {}", other))
    }
  }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
  #[display(fmt = "rascunho")]
  Rascunho,
  #[display(fmt = "publicado")]
  Publicado
}

impl PostStatus {
  pub fn label(&self) -> &'static str {
    match self {
      PostStatus::Rascunho => "Rascunho",
      PostStatus::Publicado => "Publicado"
    }
  }
}

impl FromStr for PostStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "rascunho" => Ok(PostStatus::Rascunho),
      "publicado" => Ok(PostStatus::Publicado),
      other => Err(format!("Unknown status: {}", other))
    }
  }
}

#[derive(Debug, Clone)]
pub struct Post {
  pub id: i64,
  pub title: String,
  pub subtitle: String,
  pub content: String,
  pub category: Category,
  pub cover_image: Option<String>,
  pub status: PostStatus,
  pub published_at: i64,
  pub created_at: i64,
  pub updated_at: i64
}

// "Update only what's in the request body" object.
#[derive(Debug, Default)]
pub struct PostUpdate {
  pub title: Option<String>,
  pub subtitle: Option<String>,
  pub content: Option<String>,
  pub category: Option<Category>,
  pub status: Option<PostStatus>,
  pub published_at: Option<i64>
}

#[derive(Debug, Clone)]
pub struct Video {
  pub id: i64,
  pub title: String,
  pub youtube_id: String,
  pub description: String,
  pub published_at: i64,
  pub created_at: i64
}

impl Video {
  pub fn youtube_url(&self) -> String {
    format!("https://www.youtube.com/watch?v={}", self.youtube_id)
  }

  pub fn embed_url(&self) -> String {
    format!("https://www.youtube.com/embed/{}", self.youtube_id)
  }

  pub fn thumbnail_url(&self) -> String {
    format!("https://img.youtube.com/vi/{}/mqdefault.jpg", self.youtube_id)
  }
}

// The single row of the site_config table. Serialize is
// used to hand it to the templates directly, minus the
// API key.
#[derive(Debug, Clone, Serialize)]
pub struct SiteConfig {
  pub id: i64,
  pub hero_title: String,
  pub hero_description: String,
  pub about_text: String,
  pub games_reviewed: i64,
  pub videos_per_month: i64,
  pub channel_subscribers: i64,
  pub youtube_url: String,
  pub instagram_url: String,
  pub developer_name: String,
  pub youtube_channel_id: Option<String>,
  #[serde(skip_serializing)]
  pub youtube_api_key: Option<String>,
  pub updated_at: i64
}

impl SiteConfig {
  // Same values the original setup command was seeding.
  pub fn defaults() -> Self {
    Self {
      id: 1,
      hero_title: String::from("Bem-vindo ao Mesa Secreta"),
      hero_description: String::from("Análises completas de jogos de tabuleiro"),
      about_text: String::from("Somos apaixonados por jogos de tabuleiro!"),
      games_reviewed: 150,
      videos_per_month: 12,
      channel_subscribers: 10000,
      youtube_url: String::from("https://youtube.com/@mesasecreta"),
      instagram_url: String::new(),
      developer_name: String::from("Omega Sistem"),
      youtube_channel_id: None,
      youtube_api_key: None,
      updated_at: 0
    }
  }
}

#[derive(Debug, Clone)]
pub struct ViewEvent {
  pub id: i64,
  pub session_key: String,
  pub content_type: String,
  pub content_id: Option<i64>,
  pub content_title: String,
  pub time_on_page: i64,
  pub scroll_depth: i64,
  pub ip_address: Option<String>,
  pub user_agent: String,
  pub first_seen: i64,
  pub last_seen: i64
}

#[derive(Debug, Clone)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub password_hash: String,
  pub is_staff: bool,
  pub created_at: i64,
  pub last_login: Option<i64>
}

#[derive(Debug, Clone)]
pub struct Session {
  pub session_key: String,
  pub user_id: Option<i64>,
  pub created_at: i64,
  pub expires_at: i64
}
