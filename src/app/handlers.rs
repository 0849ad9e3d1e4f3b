use actix_web::{
  http::header,
  web,
  HttpResponse,
  HttpRequest,
  Result
};
use std::convert::TryInto;
use log::{error, info, warn};
use handlebars::Handlebars;
use serde_json::json;
use crate::db::{self, entities::*};
use crate::utils::{password, time_utils::current_timestamp};
use super::dtos::*;
use super::error::{Error, map_db_error};
use super::helpers::{page_context, render};
use super::session::{
  current_session,
  new_session,
  session_cookie,
  session_key_from,
  CurrentSession
};
use super::site_settings::youtube_credentials;
use super::AppState;

// The home page shows this many of each.
const HOME_POSTS: usize = 6;
const HOME_VIDEOS: usize = 3;
const LOGIN_ERROR: &str = "Usuário ou senha inválidos.";

fn to_usize(count: i64) -> Result<usize, Error> {
  count.try_into()
    .map_err(|_| {
      error!("Count {} could not be converted to usize", count);
      Error::InternalServerError(
        String::from("Count cannot be converted to usize - Should never happen")
      )
    })
}

// Missing page means page 1, anything that isn't a
// page number is a 404.
fn requested_page(page: &Option<String>) -> Result<usize, Error> {
  match page.as_deref().map(str::trim) {
    None | Some("") => Ok(1),
    Some(p) => p.parse::<usize>()
      .map_err(|_| Error::NotFound(format!("Invalid page: {}", p)))
  }
}

fn session_user(
  app_state: &AppState,
  req: &HttpRequest
) -> Result<Option<CurrentSession>, Error> {
  current_session(&app_state.pool, &app_state.config, req, current_timestamp())
    .map_err(map_db_error)
}

// Live count from the Data API when credentials exist,
// the number from the site configuration otherwise.
async fn channel_subscribers(
  app_state: web::Data<AppState>,
  site_config: &SiteConfig
) -> i64 {
  let (channel_id, api_key) = youtube_credentials(site_config, &app_state.config);
  let (channel_id, api_key) = match (channel_id, api_key) {
    (Some(c), Some(k)) => (c, k),
    _ => return site_config.channel_subscribers
  };
  let now = current_timestamp();
  let state = app_state.clone();
  let count = web::block(move || {
    state.channel_stats.subscriber_count(&channel_id, &api_key, now)
  }).await;
  match count {
    Ok(Some(count)) => count.try_into().unwrap_or(site_config.channel_subscribers),
    Ok(None) => site_config.channel_subscribers,
    Err(e) => {
      error!("Blocking subscriber count call failed: {}", e);
      site_config.channel_subscribers
    }
  }
}

pub async fn home(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let current = session_user(&app_state, &req)?;
  let posts: Vec<PostDto> = db::published_posts(&app_state.pool, None, 0, HOME_POSTS)
    .map_err(map_db_error)?
    .into_iter()
    .map(|p| PostDto::new(p, app_state.storage.as_ref(), false))
    .collect();
  let videos: Vec<VideoDto> = db::videos_from_to(&app_state.pool, 0, HOME_VIDEOS)
    .map_err(map_db_error)?
    .into_iter()
    .map(VideoDto::from)
    .collect();
  let site_config = app_state.site_settings.current();
  let subscribers = channel_subscribers(app_state.clone(), &site_config).await;

  let data = page_context(
    &app_state,
    current.as_ref().and_then(|c| c.user.as_ref()),
    json!({
      "postagens_destaque": posts,
      "videos_recentes": videos,
      "inscritos": subscribers
    })
  );
  render(&hb, "home", &data)
}

pub async fn post_list(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  query: web::Query<ListingQuery>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let page = requested_page(&query.page)?;
  // Unknown categories aren't an error, they just
  // match nothing.
  let category = query.categoria.as_deref()
    .map(str::trim)
    .filter(|c| !c.is_empty());
  let count = to_usize(
    db::published_post_count(&app_state.pool, category).map_err(map_db_error)?
  )?;
  let paging = Paging::new(page, app_state.config.posts_per_page, count)
    .ok_or_else(|| Error::NotFound(format!("Page {} does not exist", page)))?;
  let posts: Vec<PostDto> = db::published_posts(
    &app_state.pool,
    category,
    paging.offset,
    paging.per_page
  )
    .map_err(map_db_error)?
    .into_iter()
    .map(|p| PostDto::new(p, app_state.storage.as_ref(), false))
    .collect();

  let current = session_user(&app_state, &req)?;
  let selected = category.unwrap_or("");
  let data = page_context(
    &app_state,
    current.as_ref().and_then(|c| c.user.as_ref()),
    json!({
      "postagens": posts,
      "paginacao": paging,
      "categoria_selecionada": selected,
      "categorias": category_options(selected)
    })
  );
  render(&hb, "post_list", &data)
}

pub async fn post_detail(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  path: web::Path<(i64,)>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let post_id = path.into_inner().0;
  let post = db::published_post_by_id(&app_state.pool, post_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Post does not exist".to_string()))?;
  let current = session_user(&app_state, &req)?;
  let data = page_context(
    &app_state,
    current.as_ref().and_then(|c| c.user.as_ref()),
    json!({
      "postagem": PostDto::new(post, app_state.storage.as_ref(), true),
      "tipo_conteudo": crate::stats::CONTENT_TYPE_POST
    })
  );
  render(&hb, "post_detail", &data)
}

pub async fn video_list(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  query: web::Query<ListingQuery>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let page = requested_page(&query.page)?;
  let count = to_usize(db::video_count(&app_state.pool).map_err(map_db_error)?)?;
  let paging = Paging::new(page, app_state.config.videos_per_page, count)
    .ok_or_else(|| Error::NotFound(format!("Page {} does not exist", page)))?;
  let videos: Vec<VideoDto> = db::videos_from_to(&app_state.pool, paging.offset, paging.per_page)
    .map_err(map_db_error)?
    .into_iter()
    .map(VideoDto::from)
    .collect();
  let current = session_user(&app_state, &req)?;
  let data = page_context(
    &app_state,
    current.as_ref().and_then(|c| c.user.as_ref()),
    json!({
      "videos": videos,
      "paginacao": paging
    })
  );
  render(&hb, "video_list", &data)
}

// Only local paths are allowed as redirect targets.
fn safe_next(next: Option<&str>) -> String {
  match next.map(str::trim) {
    Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') =>
      n.to_string(),
    _ => String::from("/")
  }
}

fn login_page(
  app_state: &AppState,
  hb: &Handlebars<'_>,
  next: &str,
  error_message: Option<&str>
) -> Result<HttpResponse, Error> {
  let data = page_context(
    app_state,
    None,
    json!({
      "next": next,
      "erro": error_message
    })
  );
  render(hb, "login", &data)
}

pub async fn login_form(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  query: web::Query<NextQuery>
) -> Result<HttpResponse, Error> {
  login_page(&app_state, &hb, &safe_next(query.next.as_deref()), None)
}

pub async fn login(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Form<LoginForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  if app_state.check_rate_limit() {
    warn!("Login rate limit reached");
    return Err(Error::TooManyRequests);
  }
  let next = safe_next(form.next.as_deref());
  let user = db::user_by_username(&app_state.pool, form.username.trim())
    .map_err(map_db_error)?;
  let user = match user {
    Some(user) => user,
    None => return login_page(&app_state, &hb, &next, Some(LOGIN_ERROR))
  };
  match password::verify_password(&form.password, &user.password_hash) {
    Ok(true) => {},
    Ok(false) => {
      info!("Failed login for {}", user.username);
      return login_page(&app_state, &hb, &next, Some(LOGIN_ERROR));
    },
    Err(e) => {
      error!("Could not verify the password of {}: {}", user.username, e);
      return login_page(&app_state, &hb, &next, Some(LOGIN_ERROR));
    }
  }

  // Logging in always issues a new key, a key handed
  // out before the login never becomes a staff session.
  let now = current_timestamp();
  let session = new_session(&app_state.config, Some(user.id), now);
  let previous_key = session_key_from(&req, &app_state.config);
  db::replace_session(&app_state.pool, previous_key.as_deref(), &session)
    .map_err(map_db_error)?;
  db::touch_last_login(&app_state.pool, user.id, now)
    .map_err(map_db_error)?;
  info!("User {} logged in", user.username);

  Ok(
    HttpResponse::Found()
      .cookie(session_cookie(&app_state.config, &session.session_key))
      .insert_header((header::LOCATION, next))
      .finish()
  )
}

// The session stays, it just loses its user. View
// events keep being counted on the same key.
pub async fn logout(
  app_state: web::Data<AppState>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  if let Some(current) = session_user(&app_state, &req)? {
    db::set_session_user(&app_state.pool, &current.session.session_key, None)
      .map_err(map_db_error)?;
    if let Some(user) = current.user {
      info!("User {} logged out", user.username);
    }
  }
  Ok(
    HttpResponse::Found()
      .insert_header((header::LOCATION, "/"))
      .finish()
  )
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}
