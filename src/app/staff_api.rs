use actix_web::{
  http::header,
  web,
  HttpResponse
};
use log::{error, info, warn};
use serde_json::json;
use crate::admin::export::{csv_bytes, CsvExportable};
use crate::db::{self, entities::*};
use crate::storage::guess_content_type;
use crate::utils::time_utils::{self, current_timestamp};
use super::dtos::*;
use super::error::{map_db_error, map_internal_error, Error};
use super::guards::StaffUser;
use super::site_settings::youtube_credentials;
use super::AppState;

// Staff-only JSON API under /admin/api. Every handler
// takes the StaffUser extractor, which answers 403 for
// anyone else.

pub async fn list_posts(
  app_state: web::Data<AppState>,
  _staff: StaffUser
) -> Result<HttpResponse, Error> {
  let posts: Vec<AdminPostDto> = db::all_posts(&app_state.pool)
    .map_err(map_db_error)?
    .into_iter()
    .map(|p| AdminPostDto::new(p, app_state.storage.as_ref()))
    .collect();
  Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  body: web::Json<PostBody>
) -> Result<HttpResponse, Error> {
  let mut post = body.into_inner()
    .into_post(current_timestamp())
    .map_err(Error::BadRequest)?;
  db::insert_post(&app_state.pool, &mut post).map_err(map_db_error)?;
  info!("Post {} created by {}", post.id, staff.0.username);
  Ok(
    HttpResponse::Created().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Post created", post.id)
    )
  )
}

pub async fn update_post(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>,
  body: web::Json<PostBody>
) -> Result<HttpResponse, Error> {
  let post_id = path.into_inner().0;
  let update = body.into_inner()
    .into_update()
    .map_err(Error::BadRequest)?;
  let found = db::update_post(&app_state.pool, post_id, &update, current_timestamp())
    .map_err(map_db_error)?;
  if !found {
    return Err(Error::NotFound("Post does not exist".to_string()));
  }
  Ok(
    HttpResponse::Ok().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Post updated", post_id)
    )
  )
}

// Storage calls are blocking HTTP requests.
async fn delete_blob(app_state: &web::Data<AppState>, name: String) {
  let state = app_state.clone();
  let deleted = web::block(move || {
    if state.storage.exists(&name) {
      state.storage.delete(&name);
    } else {
      warn!("Blob {} was already gone from storage", name);
    }
  }).await;
  if let Err(e) = deleted {
    error!("Blocking storage delete failed: {}", e);
  }
}

pub async fn delete_post(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let post_id = path.into_inner().0;
  let post = db::post_by_id(&app_state.pool, post_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Post does not exist".to_string()))?;
  db::delete_post(&app_state.pool, post_id).map_err(map_db_error)?;
  if let Some(cover) = post.cover_image {
    delete_blob(&app_state, cover).await;
  }
  info!("Post {} deleted by {}", post_id, staff.0.username);
  Ok(
    HttpResponse::Ok().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Post deleted", post_id)
    )
  )
}

pub async fn bulk_action(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  body: web::Json<BulkActionBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let now = current_timestamp();
  let (quantidade, novos_ids) = match body.acao {
    BulkAction::Publicar => (
      db::set_posts_status(&app_state.pool, &body.ids, PostStatus::Publicado, now)
        .map_err(map_db_error)?,
      Vec::new()
    ),
    BulkAction::Rascunho => (
      db::set_posts_status(&app_state.pool, &body.ids, PostStatus::Rascunho, now)
        .map_err(map_db_error)?,
      Vec::new()
    ),
    BulkAction::Duplicar => {
      let new_ids = db::duplicate_posts(&app_state.pool, &body.ids, now)
        .map_err(map_db_error)?;
      (new_ids.len(), new_ids)
    }
  };
  info!("Bulk action {} on {} post(s) by {}", body.acao, quantidade, staff.0.username);
  Ok(HttpResponse::Ok().json(BulkActionResult {
    acao: body.acao.to_string(),
    quantidade,
    novos_ids
  }))
}

// Raw image body, the original file name comes in the
// query string for its extension.
pub async fn upload_cover(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>,
  query: web::Query<CoverQuery>,
  body: web::Bytes
) -> Result<HttpResponse, Error> {
  let post_id = path.into_inner().0;
  if body.is_empty() {
    return Err(Error::BadRequest("Empty upload".to_string()));
  }
  let post = db::post_by_id(&app_state.pool, post_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Post does not exist".to_string()))?;

  let state = app_state.clone();
  let filename = query.into_inner().filename;
  let (stored_name, stored_size) = web::block(move || {
    state.storage.save(&filename, &body)
      .map(|name| {
        let size = state.storage.size(&name);
        (name, size)
      })
  })
    .await
    .map_err(|e| Error::InternalServerError(e.to_string()))?
    .map_err(map_internal_error)?;

  db::set_post_cover(&app_state.pool, post_id, Some(&stored_name), current_timestamp())
    .map_err(map_db_error)?;
  if let Some(previous) = post.cover_image {
    delete_blob(&app_state, previous).await;
  }
  Ok(HttpResponse::Ok().json(json!({
    "status": "success",
    "capa_url": app_state.storage.url(&stored_name),
    "capa": stored_name,
    "tamanho": stored_size
  })))
}

// Streams the cover back from storage, for buckets that
// aren't public.
pub async fn cover_image(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let post_id = path.into_inner().0;
  let cover = db::post_by_id(&app_state.pool, post_id)
    .map_err(map_db_error)?
    .and_then(|p| p.cover_image)
    .ok_or_else(|| Error::NotFound("Post has no cover".to_string()))?;
  let state = app_state.clone();
  let name = cover.clone();
  let content = web::block(move || state.storage.open(&name))
    .await
    .map_err(|e| Error::InternalServerError(e.to_string()))?
    .map_err(|e| {
      error!("Could not open cover {}: {:?}", cover, e);
      Error::NotFound("Cover is not available".to_string())
    })?;
  Ok(
    HttpResponse::Ok()
      .content_type(guess_content_type(&cover))
      .body(content)
  )
}

pub async fn list_videos(
  app_state: web::Data<AppState>,
  _staff: StaffUser
) -> Result<HttpResponse, Error> {
  let videos: Vec<VideoDto> = db::all_videos(&app_state.pool)
    .map_err(map_db_error)?
    .into_iter()
    .map(VideoDto::from)
    .collect();
  Ok(HttpResponse::Ok().json(videos))
}

pub async fn create_video(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  body: web::Json<VideoBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let youtube_id = body.youtube_id.trim().to_string();
  if youtube_id.is_empty() || body.titulo.trim().is_empty() {
    return Err(Error::BadRequest("titulo and youtube_id are required".to_string()));
  }
  if db::video_by_youtube_id(&app_state.pool, &youtube_id).map_err(map_db_error)?.is_some() {
    return Err(Error::BadRequest(format!("Video {} already exists", youtube_id)));
  }
  let now = current_timestamp();
  let published_at = match body.data_publicacao.as_deref().map(str::trim) {
    None | Some("") => now,
    Some(date) => time_utils::parse_rfc3339(date)
      .ok_or_else(|| Error::BadRequest(format!("Invalid date: {}", date)))?
  };
  let mut video = Video {
    id: -1,
    title: body.titulo.trim().to_string(),
    youtube_id,
    description: body.descricao,
    published_at,
    created_at: now
  };
  db::insert_video(&app_state.pool, &mut video).map_err(map_db_error)?;
  Ok(
    HttpResponse::Created().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Video created", video.id)
    )
  )
}

pub async fn delete_video(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let video_id = path.into_inner().0;
  if !db::delete_video(&app_state.pool, video_id).map_err(map_db_error)? {
    return Err(Error::NotFound("Video does not exist".to_string()));
  }
  Ok(
    HttpResponse::Ok().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Video deleted", video_id)
    )
  )
}

pub async fn sync_videos(
  app_state: web::Data<AppState>,
  staff: StaffUser
) -> Result<HttpResponse, Error> {
  let site_config = app_state.site_settings.current();
  let channel_id = youtube_credentials(&site_config, &app_state.config).0
    .ok_or_else(|| {
      warn!("Video sync requested by {} without a channel id", staff.0.username);
      Error::BadRequest("No YouTube channel id configured".to_string())
    })?;
  let state = app_state.clone();
  let report = web::block(move || {
    state.video_sync.sync_videos_to_database(
      &state.pool,
      &channel_id,
      state.config.youtube_max_results,
      current_timestamp()
    )
  })
    .await
    .map_err(|e| Error::InternalServerError(e.to_string()))?
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(SyncReportDto::from(report)))
}

pub async fn get_site_config(
  app_state: web::Data<AppState>,
  _staff: StaffUser
) -> Result<HttpResponse, Error> {
  let site_config = app_state.site_settings.current();
  // The API key isn't serialized, staff only get to
  // know if there's one.
  let has_key = site_config.youtube_api_key.is_some();
  let mut value = serde_json::to_value(site_config)
    .map_err(|e| Error::InternalServerError(e.to_string()))?;
  value["youtube_api_key_definida"] = json!(has_key);
  Ok(HttpResponse::Ok().json(value))
}

pub async fn update_site_config(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  body: web::Json<SiteConfigUpdate>
) -> Result<HttpResponse, Error> {
  let mut site_config = app_state.site_settings.current();
  body.into_inner()
    .apply(&mut site_config)
    .map_err(Error::BadRequest)?;
  let now = current_timestamp();
  db::save_site_config(&app_state.pool, &site_config, now).map_err(map_db_error)?;
  site_config.updated_at = now;
  app_state.site_settings.replace(site_config.clone());
  info!("Site configuration updated by {}", staff.0.username);
  Ok(HttpResponse::Ok().json(site_config))
}

fn csv_response<T: CsvExportable>(items: &[T], filename: &str) -> Result<HttpResponse, Error> {
  let bytes = csv_bytes(items).map_err(map_internal_error)?;
  Ok(
    HttpResponse::Ok()
      .content_type("text/csv; charset=utf-8")
      .insert_header((
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", filename)
      ))
      .body(bytes)
  )
}

pub async fn export_posts(
  app_state: web::Data<AppState>,
  _staff: StaffUser
) -> Result<HttpResponse, Error> {
  let posts = db::all_posts(&app_state.pool).map_err(map_db_error)?;
  csv_response(&posts, "postagens.csv")
}

pub async fn export_videos(
  app_state: web::Data<AppState>,
  _staff: StaffUser
) -> Result<HttpResponse, Error> {
  let videos = db::all_videos(&app_state.pool).map_err(map_db_error)?;
  csv_response(&videos, "videos.csv")
}

pub async fn export_views(
  app_state: web::Data<AppState>,
  _staff: StaffUser
) -> Result<HttpResponse, Error> {
  let events = db::all_view_events(&app_state.pool).map_err(map_db_error)?;
  csv_response(&events, "visualizacoes.csv")
}
