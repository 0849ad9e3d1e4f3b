use serde::{Deserialize, Serialize};
use derive_more::Display;
use crate::admin::display::{cover_url, DisplayColumns};
use crate::db::entities::*;
use crate::stats::engagement::EngagementStats;
use crate::storage::BlobStorage;
use crate::utils::{
  serde_utils,
  text_utils,
  time_utils::{self, DateFormat}
};
use crate::youtube::sync::SyncReport;

// Post cards and listings show this many characters of
// text when there's no subtitle.
const EXCERPT_LENGTH: usize = 160;

// Field names are in Portuguese since that's what the
// templates and the frontend script use.
#[derive(Debug, Serialize)]
pub struct PostDto {
  pub id: i64,
  pub titulo: String,
  pub subtitulo: String,
  pub resumo: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conteudo: Option<String>,
  pub categoria: String,
  pub categoria_rotulo: &'static str,
  pub status: String,
  pub capa_url: Option<String>,
  pub data_publicacao: String,
  pub data_publicacao_iso: String
}

impl PostDto {
  // The content is only sent for the detail page and
  // the staff API.
  pub fn new(post: Post, storage: &dyn BlobStorage, with_content: bool) -> Self {
    let capa_url = cover_url(&post, storage);
    let resumo = if post.subtitle.trim().is_empty() {
      text_utils::excerpt(&post.content, EXCERPT_LENGTH)
    } else {
      post.subtitle.clone()
    };
    Self {
      id: post.id,
      titulo: post.title,
      subtitulo: post.subtitle,
      resumo,
      conteudo: if with_content { Some(post.content) } else { None },
      categoria: post.category.to_string(),
      categoria_rotulo: post.category.label(),
      status: post.status.to_string(),
      capa_url,
      data_publicacao: time_utils::timestamp_to_date_string(post.published_at, DateFormat::Standard),
      data_publicacao_iso: time_utils::timestamp_to_date_string(post.published_at, DateFormat::Iso)
    }
  }
}

// Staff listing: the post plus its display columns.
#[derive(Debug, Serialize)]
pub struct AdminPostDto {
  #[serde(flatten)]
  pub post: PostDto,
  pub status_icone: &'static str,
  pub status_cor: &'static str,
  pub categoria_badge: String,
  pub categoria_cor: &'static str,
  pub titulo_curto: String
}

impl AdminPostDto {
  pub fn new(post: Post, storage: &dyn BlobStorage) -> Self {
    Self {
      status_icone: post.status_icon(),
      status_cor: post.status_color(),
      categoria_badge: post.category_badge(),
      categoria_cor: post.category_color(),
      titulo_curto: post.short_title(),
      post: PostDto::new(post, storage, true)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct VideoDto {
  pub id: i64,
  pub titulo: String,
  pub youtube_id: String,
  pub descricao: String,
  pub url: String,
  pub embed_url: String,
  pub thumbnail_url: String,
  pub data_publicacao: String
}

impl From<Video> for VideoDto {
  fn from(video: Video) -> Self {
    Self {
      url: video.youtube_url(),
      embed_url: video.embed_url(),
      thumbnail_url: video.thumbnail_url(),
      id: video.id,
      titulo: video.title,
      youtube_id: video.youtube_id,
      descricao: video.description,
      data_publicacao: time_utils::timestamp_to_date_string(video.published_at, DateFormat::Short)
    }
  }
}

// Pagination numbers for the listing templates.
// Pages are 1-based.
#[derive(Debug, Serialize, PartialEq)]
pub struct Paging {
  pub pagina: usize,
  pub total_paginas: usize,
  pub total: usize,
  pub pagina_anterior: Option<usize>,
  pub pagina_proxima: Option<usize>,
  #[serde(skip)]
  pub offset: usize,
  #[serde(skip)]
  pub per_page: usize
}

impl Paging {
  // None when the page doesn't exist. The first page
  // always exists, even with nothing in it.
  pub fn new(page: usize, per_page: usize, total: usize) -> Option<Self> {
    let per_page = per_page.max(1);
    let total_paginas = ((total + per_page - 1) / per_page).max(1);
    if page == 0 || page > total_paginas {
      return None;
    }
    Some(Self {
      pagina: page,
      total_paginas,
      total,
      pagina_anterior: if page > 1 { Some(page - 1) } else { None },
      pagina_proxima: if page < total_paginas { Some(page + 1) } else { None },
      offset: (page - 1) * per_page,
      per_page
    })
  }
}

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
  // Kept as a string, "abc" has to give a 404 and not
  // a 400 from the extractor.
  pub page: Option<String>,
  pub categoria: Option<String>
}

#[derive(Debug, Serialize)]
pub struct CategoryOption {
  pub slug: String,
  pub rotulo: &'static str,
  pub selecionada: bool
}

pub fn category_options(selected: &str) -> Vec<CategoryOption> {
  Category::ALL.iter()
    .map(|c| CategoryOption {
      slug: c.to_string(),
      rotulo: c.label(),
      selecionada: c.to_string() == selected
    })
    .collect()
}

// Body sent by the tracking script. Everything is
// optional at this level, the handler checks the type.
#[derive(Debug, Deserialize)]
pub struct TrackViewBody {
  pub tipo_conteudo: Option<String>,
  #[serde(default, deserialize_with = "serde_utils::lenient_optional_id")]
  pub conteudo_id: Option<i64>,
  #[serde(default)]
  pub conteudo_titulo: Option<String>,
  #[serde(default, deserialize_with = "serde_utils::lenient_number")]
  pub tempo_visualizacao: f64,
  #[serde(default, deserialize_with = "serde_utils::lenient_number")]
  pub scroll_profundidade: f64
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EngagementDto {
  pub postagem_id: i64,
  pub titulo: String,
  pub total_visualizacoes: i64,
  pub visualizacoes_30_dias: i64,
  pub tempo_medio: f64,
  pub scroll_medio: f64,
  pub engajamento: String
}

fn one_decimal(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}

impl EngagementDto {
  pub fn new(post: &Post, stats: EngagementStats) -> Self {
    Self {
      postagem_id: post.id,
      titulo: post.title.clone(),
      total_visualizacoes: stats.total_views,
      visualizacoes_30_dias: stats.recent_views,
      tempo_medio: one_decimal(stats.avg_time_on_page),
      scroll_medio: one_decimal(stats.avg_scroll_depth),
      engajamento: stats.tier.to_string()
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
  pub next: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
  pub next: Option<String>
}

// Create and partial update of a post. Creating needs
// at least a title.
#[derive(Debug, Deserialize, Default)]
pub struct PostBody {
  pub titulo: Option<String>,
  pub subtitulo: Option<String>,
  pub conteudo: Option<String>,
  pub categoria: Option<Category>,
  pub status: Option<PostStatus>,
  // RFC 3339
  pub data_publicacao: Option<String>
}

impl PostBody {
  pub fn published_at(&self) -> Result<Option<i64>, String> {
    match serde_utils::empty_string_to_none(self.data_publicacao.clone()) {
      Some(date) => time_utils::parse_rfc3339(&date)
        .map(Some)
        .ok_or_else(|| format!("Invalid date: {}", date)),
      None => Ok(None)
    }
  }

  pub fn into_post(self, now: i64) -> Result<Post, String> {
    let published_at = self.published_at()?.unwrap_or(now);
    let title = serde_utils::empty_string_to_none(self.titulo)
      .ok_or_else(|| String::from("The title (titulo) is required"))?;
    Ok(Post {
      id: -1,
      title: title.trim().to_string(),
      subtitle: self.subtitulo.unwrap_or_default(),
      content: self.conteudo.unwrap_or_default(),
      category: self.categoria.unwrap_or(Category::Novidades),
      cover_image: None,
      status: self.status.unwrap_or(PostStatus::Rascunho),
      published_at,
      created_at: now,
      updated_at: now
    })
  }

  pub fn into_update(self) -> Result<PostUpdate, String> {
    let published_at = self.published_at()?;
    if let Some(title) = &self.titulo {
      if title.trim().is_empty() {
        return Err(String::from("The title (titulo) cannot be empty"));
      }
    }
    Ok(PostUpdate {
      title: self.titulo.map(|t| t.trim().to_string()),
      subtitle: self.subtitulo,
      content: self.conteudo,
      category: self.categoria,
      status: self.status,
      published_at
    })
  }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
  #[display(fmt = "publicar")]
  Publicar,
  #[display(fmt = "rascunho")]
  Rascunho,
  #[display(fmt = "duplicar")]
  Duplicar
}

#[derive(Debug, Deserialize)]
pub struct BulkActionBody {
  pub acao: BulkAction,
  pub ids: Vec<i64>
}

#[derive(Debug, Serialize)]
pub struct BulkActionResult {
  pub acao: String,
  pub quantidade: usize,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub novos_ids: Vec<i64>
}

#[derive(Debug, Deserialize)]
pub struct VideoBody {
  pub titulo: String,
  pub youtube_id: String,
  #[serde(default)]
  pub descricao: String,
  pub data_publicacao: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct CoverQuery {
  pub filename: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncReportDto {
  pub novos: usize,
  pub atualizados: usize,
  pub total: usize
}

impl From<SyncReport> for SyncReportDto {
  fn from(report: SyncReport) -> Self {
    Self {
      novos: report.created,
      atualizados: report.updated,
      total: report.total()
    }
  }
}

// Partial update of the site configuration. The two
// YouTube fields can be set back to null.
#[derive(Debug, Deserialize, Default)]
pub struct SiteConfigUpdate {
  pub hero_title: Option<String>,
  pub hero_description: Option<String>,
  pub about_text: Option<String>,
  pub games_reviewed: Option<i64>,
  pub videos_per_month: Option<i64>,
  pub channel_subscribers: Option<i64>,
  pub youtube_url: Option<String>,
  pub instagram_url: Option<String>,
  pub developer_name: Option<String>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  pub youtube_channel_id: Option<Option<String>>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  pub youtube_api_key: Option<Option<String>>
}

impl SiteConfigUpdate {
  pub fn apply(self, config: &mut SiteConfig) -> Result<(), String> {
    let counters = [self.games_reviewed, self.videos_per_month, self.channel_subscribers];
    if counters.iter().flatten().any(|v| *v < 0) {
      return Err(String::from("Counters cannot be negative"));
    }
    if let Some(v) = self.hero_title { config.hero_title = v; }
    if let Some(v) = self.hero_description { config.hero_description = v; }
    if let Some(v) = self.about_text { config.about_text = v; }
    if let Some(v) = self.games_reviewed { config.games_reviewed = v; }
    if let Some(v) = self.videos_per_month { config.videos_per_month = v; }
    if let Some(v) = self.channel_subscribers { config.channel_subscribers = v; }
    if let Some(v) = self.youtube_url { config.youtube_url = v; }
    if let Some(v) = self.instagram_url { config.instagram_url = v; }
    if let Some(v) = self.developer_name { config.developer_name = v; }
    // Empty strings from the forms mean NULL too.
    if let Some(v) = self.youtube_channel_id {
      config.youtube_channel_id = v.and_then(|s| serde_utils::empty_string_to_none(Some(s)));
    }
    if let Some(v) = self.youtube_api_key {
      config.youtube_api_key = v.and_then(|s| serde_utils::empty_string_to_none(Some(s)));
    }
    Ok(())
  }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct JsonStatus {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>
}

#[derive(Debug, Display)]
pub enum JsonStatusType {
  #[display(fmt = "success")]
  Success,
  #[display(fmt = "error")]
  Error
}

impl JsonStatus {
  pub fn new(status: JsonStatusType, message: &str) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: None
    }
  }

  pub fn new_with_id(
    status: JsonStatusType,
    message: &str,
    id: i64
  ) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: Some(id)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::sample_post;
  use crate::stats::engagement::EngagementTier;
  use crate::storage::DisabledStorage;

  #[test]
  fn paging_math() {
    let p = Paging::new(2, 9, 20).unwrap();
    assert_eq!(3, p.total_paginas);
    assert_eq!(9, p.offset);
    assert_eq!(Some(1), p.pagina_anterior);
    assert_eq!(Some(3), p.pagina_proxima);
    assert!(Paging::new(4, 9, 20).is_none());
    assert!(Paging::new(0, 9, 20).is_none());
  }

  #[test]
  fn empty_first_page_exists() {
    let p = Paging::new(1, 9, 0).unwrap();
    assert_eq!(1, p.total_paginas);
    assert_eq!(None, p.pagina_proxima);
    assert!(Paging::new(2, 9, 0).is_none());
  }

  #[test]
  fn post_dto_uses_excerpt_without_subtitle() {
    let post = sample_post("Azul", Category::Reviews, PostStatus::Publicado, 0);
    let dto = PostDto::new(post, &DisabledStorage, false);
    assert_eq!("Conteúdo", dto.resumo);
    assert_eq!(None, dto.conteudo);
    assert_eq!("Review de Jogos", dto.categoria_rotulo);
  }

  #[test]
  fn admin_dto_flattens_post() {
    let post = sample_post("Azul", Category::Dicas, PostStatus::Rascunho, 0);
    let json = serde_json::to_value(AdminPostDto::new(post, &DisabledStorage)).unwrap();
    assert_eq!("Azul", json["titulo"]);
    assert_eq!("📝", json["status_icone"]);
    assert_eq!("#4CAF50", json["categoria_cor"]);
  }

  #[test]
  fn engagement_dto_rounds_to_one_decimal() {
    let post = sample_post("Azul", Category::Reviews, PostStatus::Publicado, 0);
    let stats = EngagementStats {
      total_views: 3,
      recent_views: 1,
      avg_time_on_page: 36.666,
      avg_scroll_depth: 50.04,
      tier: EngagementTier::High
    };
    let dto = EngagementDto::new(&post, stats);
    assert_eq!(36.7, dto.tempo_medio);
    assert_eq!(50.0, dto.scroll_medio);
    assert_eq!("High", dto.engajamento);
  }

  #[test]
  fn post_body_requires_title() {
    assert!(PostBody::default().into_post(0).is_err());
    let body = PostBody {
      titulo: Some(" Ark Nova ".to_string()),
      data_publicacao: Some("2024-03-01T18:00:06+00:00".to_string()),
      ..Default::default()
    };
    let post = body.into_post(5).unwrap();
    assert_eq!("Ark Nova", post.title);
    assert_eq!(1709316006, post.published_at);
    assert_eq!(PostStatus::Rascunho, post.status);
  }

  #[test]
  fn post_body_rejects_bad_dates() {
    let body = PostBody {
      data_publicacao: Some("ontem".to_string()),
      ..Default::default()
    };
    assert!(body.into_update().is_err());
  }

  #[test]
  fn site_config_update_can_clear_channel() {
    let mut config = SiteConfig::defaults();
    config.youtube_channel_id = Some("UC123".to_string());
    let update: SiteConfigUpdate = serde_json::from_str(
      r#"{"hero_title": "Olá", "youtube_channel_id": null}"#
    ).unwrap();
    update.apply(&mut config).unwrap();
    assert_eq!("Olá", config.hero_title);
    assert_eq!(None, config.youtube_channel_id);
    assert_eq!(10000, config.channel_subscribers);
  }

  #[test]
  fn site_config_update_rejects_negative_counters() {
    let mut config = SiteConfig::defaults();
    let update: SiteConfigUpdate = serde_json::from_str(r#"{"games_reviewed": -1}"#).unwrap();
    assert!(update.apply(&mut config).is_err());
  }

  #[test]
  fn track_view_body_defaults() {
    let body: TrackViewBody = serde_json::from_str(r#"{"tipo_conteudo": "home"}"#).unwrap();
    assert_eq!(None, body.conteudo_id);
    assert_eq!(0.0, body.tempo_visualizacao);
    assert_eq!(0.0, body.scroll_profundidade);
  }
}
