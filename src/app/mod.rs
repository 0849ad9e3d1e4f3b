use actix_web::{
  dev::{ServiceFactory, ServiceRequest, ServiceResponse},
  error::JsonPayloadError,
  middleware, web, App, HttpRequest, HttpServer
};
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, error, info};
use handlebars::Handlebars;
use rate_limiter::BasicRateLimiter;
use std::sync::RwLock;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::{Config, SiteInfo};
use crate::db::{self, Pool};
use crate::storage::{storage_from_config, BlobStorage};
use crate::utils::time_utils::current_timestamp;
use crate::youtube::{channel_stats::ChannelStatsClient, sync::VideoSyncService};
use site_settings::SiteSettings;
mod handlers;
mod tracking;
mod staff_api;
mod dtos;
mod error;
mod helpers;
mod rate_limiter;
mod guards;
mod session;
mod site_settings;

// Declare app state struct:
pub struct AppState {
  pub pool: Pool,
  pub config: Config,
  pub site_info: SiteInfo,
  pub site_settings: SiteSettings,
  pub channel_stats: ChannelStatsClient,
  pub video_sync: VideoSyncService,
  pub storage: Box<dyn BlobStorage>,
  pub rate_limiter: RwLock<BasicRateLimiter>
}

impl AppState {

  pub fn new(pool: Pool, config: Config) -> Result<Self> {
    let storage = storage_from_config(&config);
    Self::with_storage(pool, config, storage)
  }

  pub fn with_storage(
    pool: Pool,
    config: Config,
    storage: Box<dyn BlobStorage>
  ) -> Result<Self> {
    let site_settings = SiteSettings::load(&pool, current_timestamp())?;
    Ok(Self {
      site_info: SiteInfo::from(&config),
      channel_stats: ChannelStatsClient::new(&config),
      video_sync: VideoSyncService::new(&config),
      storage,
      rate_limiter: RwLock::new(
        BasicRateLimiter::new(
          config.rl_max_requests,
          config.rl_max_requests_time,
          config.rl_block_duration
        )
      ),
      site_settings,
      pool,
      config
    })
  }

  // Returns true when the request has to be refused.
  pub fn check_rate_limit(&self) -> bool {
    match self.rate_limiter.write() {
      Ok(mut rl) => rl.update(current_timestamp()),
      Err(e) => {
        // I decided to ignore possible weird rate limiter lock
        // errors which should never happen.
        error!("Could not get a write handle on the \
          rate limiter, SHOULD NEVER HAPPEN - {}", e);
        false
      }
    }
  }

}

pub fn templates(template_dir: &str) -> Result<Handlebars<'static>> {
  let mut handlebars = Handlebars::new();
  handlebars
    .register_templates_directory(".hbs", template_dir)
    .with_context(|| format!("Templates directory {} might be missing or \
      not accessible", template_dir))?;
  Ok(handlebars)
}

// Extractor errors end up as our JSON BadRequest instead
// of actix's plain text responses.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  debug!("Rejected JSON body: {}", err);
  error::Error::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

fn extractor_error<E: std::fmt::Display>(err: E, what: &str) -> actix_web::Error {
  error::Error::BadRequest(format!("Invalid {}: {}", what, err)).into()
}

pub fn build_app(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'static>>
) -> App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse,
    Error = actix_web::Error,
    InitError = ()
  >
> {
  // Cover uploads are raw bodies, way over the default
  // 256 KiB payload limit.
  let upload_limit = app_state.config.max_upload_size;
  App::new()
    .app_data(app_state)
    .app_data(hb)
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::PathConfig::default().error_handler(|err, _| {
      extractor_error(err, "path arguments")
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
      extractor_error(err, "query string arguments")
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _| {
      extractor_error(err, "form data")
    }))
    .configure(public_endpoints_config)
    .service(
      web::scope("/admin/api")
        .app_data(web::PayloadConfig::new(upload_limit))
        .configure(staff_endpoints_config)
    )
    .default_service(web::route().to(handlers::not_found))
}

// Function to start the server.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  debug!("Current config: {:?}", config);
  let pool = db::open_pool(&config.db_path)?;
  // Creating the schema is idempotent, the server can
  // start on a fresh database.
  db::create_schema(&pool)?;

  let handlebars_ref = web::Data::new(templates(&config.template_dir)?);

  // Got to save the bind_address for later because
  // config gets moved into the app state.
  let bind_address = config.bind_address.clone();
  let app_state = web::Data::new(AppState::new(pool, config)?);
  info!(
    "Starting server on {} with {} blob storage",
    bind_address,
    app_state.storage.backend_name()
  );

  HttpServer::new(move|| {
    build_app(app_state.clone(), handlebars_ref.clone())
      .wrap(middleware::Logger::default())
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration:
fn public_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.route("/", web::get().to(handlers::home))
    .route("/postagens/", web::get().to(handlers::post_list))
    .route("/postagens/{id}/", web::get().to(handlers::post_detail))
    .route("/videos/", web::get().to(handlers::video_list))
    .route("/login/", web::get().to(handlers::login_form))
    .route("/login/", web::post().to(handlers::login))
    .route("/logout/", web::get().to(handlers::logout))
    .route("/api/track-view/", web::post().to(tracking::track_view))
    .route("/api/postagem/{id}/stats/", web::get().to(tracking::post_stats));
}

// Everything in there is relative to /admin/api. Exports
// come first so "export.csv" is never taken for an id.
fn staff_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.route("/postagens/export.csv", web::get().to(staff_api::export_posts))
    .route("/videos/export.csv", web::get().to(staff_api::export_videos))
    .route("/visualizacoes/export.csv", web::get().to(staff_api::export_views))
    .route("/postagens", web::get().to(staff_api::list_posts))
    .route("/postagens", web::post().to(staff_api::create_post))
    .route("/postagens/acoes", web::post().to(staff_api::bulk_action))
    .route("/postagens/{id}", web::put().to(staff_api::update_post))
    .route("/postagens/{id}", web::delete().to(staff_api::delete_post))
    .route("/postagens/{id}/capa", web::get().to(staff_api::cover_image))
    .route("/postagens/{id}/capa", web::post().to(staff_api::upload_cover))
    .route("/videos", web::get().to(staff_api::list_videos))
    .route("/videos", web::post().to(staff_api::create_video))
    .route("/videos/sync", web::post().to(staff_api::sync_videos))
    .route("/videos/{id}", web::delete().to(staff_api::delete_video))
    .route("/configuracao", web::get().to(staff_api::get_site_config))
    .route("/configuracao", web::put().to(staff_api::update_site_config));
}

#[cfg(test)]
pub mod tests {
  use super::*;
  use actix_web::cookie::Cookie;
  use tempfile::TempDir;
  use uuid::Uuid;
  use crate::config::tests::test_config;
  use crate::db::entities::Session;
  use crate::storage::tests::MemoryStorage;
  use crate::utils::password::hash_password;

  pub const STAFF_USERNAME: &str = "staff";
  pub const STAFF_PASSWORD: &str = "senha-muito-secreta";

  // Throwaway database that already has a staff user.
  fn staff_database() -> (TempDir, Pool, Config) {
    let (dir, pool) = db::test_pool();
    let db_path = dir.path().join("test.db");
    let config = test_config(db_path.to_str().unwrap());
    let hash = hash_password(STAFF_PASSWORD).unwrap();
    db::upsert_user(&pool, STAFF_USERNAME, &hash, true, 0).unwrap();
    (dir, pool, config)
  }

  // Storage is disabled, like a server without
  // Supabase credentials.
  pub fn test_app_state() -> (TempDir, web::Data<AppState>) {
    let (dir, pool, config) = staff_database();
    let state = AppState::new(pool, config).unwrap();
    (dir, web::Data::new(state))
  }

  // In-memory blob storage the test keeps a handle on.
  pub fn test_app_state_with_storage() -> (TempDir, web::Data<AppState>, MemoryStorage) {
    let (dir, pool, config) = staff_database();
    let storage = MemoryStorage::default();
    let state = AppState::with_storage(pool, config, Box::new(storage.clone())).unwrap();
    (dir, web::Data::new(state), storage)
  }

  // Session cookie of a logged in staff user, made
  // directly in the database.
  pub fn staff_cookie(pool: &Pool) -> Cookie<'static> {
    let user = db::user_by_username(pool, STAFF_USERNAME).unwrap().unwrap();
    let now = current_timestamp();
    let session = Session {
      session_key: Uuid::new_v4().to_string(),
      user_id: Some(user.id),
      created_at: now,
      expires_at: now + 3600
    };
    db::insert_session(pool, &session).unwrap();
    Cookie::new("mesa_session", session.session_key)
  }

  pub fn test_app(app_state: web::Data<AppState>) -> App<
    impl ServiceFactory<
      ServiceRequest,
      Config = (),
      Response = ServiceResponse,
      Error = actix_web::Error,
      InitError = ()
    >
  > {
    let hb = templates("./templates").unwrap();
    build_app(app_state, web::Data::new(hb))
  }

  #[test]
  fn rate_limiter_through_state() {
    let (_dir, state) = test_app_state();
    for _ in 0..state.config.rl_max_requests {
      assert!(!state.check_rate_limit());
    }
    assert!(state.check_rate_limit());
  }
}
