use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error};
use crate::db;
use crate::stats::{self, engagement, BaseViewStat, CONTENT_TYPE_POST};
use crate::utils::time_utils::current_timestamp;
use super::dtos::{EngagementDto, JsonStatus, JsonStatusType, TrackViewBody};
use super::error::{map_db_error, Error};
use super::guards::StaffUser;
use super::helpers;
use super::session::{ensure_session, session_cookie};
use super::AppState;

// Every failure of the tracking endpoint is a 400 with
// the JSON error body, including database errors.
fn track_error(message: &str) -> Error {
  Error::BadRequest(message.to_string())
}

pub async fn track_view(
  app_state: web::Data<AppState>,
  body: web::Json<TrackViewBody>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let content_type = body.tipo_conteudo
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| track_error("tipo_conteudo is required"))?;

  let now = current_timestamp();
  let (current, is_new) = ensure_session(&app_state.pool, &app_state.config, &req, now)
    .map_err(|e| {
      error!("Could not establish a session for tracking: {:?}", e);
      track_error("Could not establish a session")
    })?;

  let stat = BaseViewStat {
    session_key: current.session.session_key.clone(),
    content_type,
    content_id: body.conteudo_id,
    content_title: body.conteudo_titulo.unwrap_or_default(),
    time_on_page: body.tempo_visualizacao,
    scroll_depth: body.scroll_profundidade,
    client_ua: helpers::user_agent(&req),
    client_ip: helpers::real_ip_addr(&req)
  };
  let created = stats::record_view(&app_state.pool, stat, now)
    .map_err(|e| {
      error!("Could not record view event: {:?}", e);
      track_error("Could not record the view")
    })?;
  debug!("View event {} for session {}", if created { "created" } else { "updated" }, current.session.session_key);

  let mut response = HttpResponse::Ok();
  if is_new {
    response.cookie(session_cookie(&app_state.config, &current.session.session_key));
  }
  Ok(response.json(JsonStatus::new(JsonStatusType::Success, "View recorded")))
}

pub async fn post_stats(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let post_id = path.into_inner().0;
  let post = db::post_by_id(&app_state.pool, post_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Post does not exist".to_string()))?;
  let stats = engagement::engagement_for(
    &app_state.pool,
    CONTENT_TYPE_POST,
    Some(post.id),
    current_timestamp()
  ).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(EngagementDto::new(&post, stats)))
}

#[cfg(test)]
mod tests {
  use actix_web::{http::StatusCode, test};
  use crate::app::dtos::{EngagementDto, JsonStatus};
  use crate::app::tests::{staff_cookie, test_app, test_app_state};
  use crate::db::{self, entities::*, sample_post};

  #[actix_web::test]
  async fn malformed_json_is_a_json_400() {
    let (_dir, state) = test_app_state();
    let app = test::init_service(test_app(state)).await;
    let req = test::TestRequest::post()
      .uri("/api/track-view/")
      .insert_header(("content-type", "application/json"))
      .set_payload("{not json")
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(StatusCode::BAD_REQUEST, resp.status());
    let status: JsonStatus = test::read_body_json(resp).await;
    assert_eq!("error", status.status);
  }

  #[actix_web::test]
  async fn missing_content_type_is_a_400() {
    let (_dir, state) = test_app_state();
    let app = test::init_service(test_app(state)).await;
    let req = test::TestRequest::post()
      .uri("/api/track-view/")
      .set_json(serde_json::json!({"conteudo_id": 1, "tempo_visualizacao": 5}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(StatusCode::BAD_REQUEST, resp.status());
  }

  #[actix_web::test]
  async fn repeated_reports_keep_one_row() {
    let (_dir, state) = test_app_state();
    let pool = state.pool.clone();
    let app = test::init_service(test_app(state)).await;

    let first = test::TestRequest::post()
      .uri("/api/track-view/")
      .set_json(serde_json::json!({
        "tipo_conteudo": "postagem",
        "conteudo_id": 4,
        "conteudo_titulo": "Azul",
        "tempo_visualizacao": 3.4,
        "scroll_profundidade": 20
      }))
      .to_request();
    let resp = test::call_service(&app, first).await;
    assert_eq!(StatusCode::OK, resp.status());
    let cookie = resp.response()
      .cookies()
      .find(|c| c.name() == "mesa_session")
      .unwrap()
      .into_owned();

    for (time, scroll) in [(10.0, 40.0), (61.6, 140.0)] {
      let req = test::TestRequest::post()
        .uri("/api/track-view/")
        .cookie(cookie.clone())
        .set_json(serde_json::json!({
          "tipo_conteudo": "postagem",
          "conteudo_id": 4,
          "tempo_visualizacao": time,
          "scroll_profundidade": scroll
        }))
        .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(StatusCode::OK, resp.status());
      // The session already exists, no new cookie:
      assert!(resp.response().cookies().next().is_none());
    }

    let events = db::view_events_for(&pool, "postagem", Some(4)).unwrap();
    assert_eq!(1, events.len());
    assert_eq!(62, events[0].time_on_page);
    assert_eq!(100, events[0].scroll_depth);
  }

  #[actix_web::test]
  async fn stats_are_staff_only() {
    let (_dir, state) = test_app_state();
    let mut post = sample_post("Azul", Category::Reviews, PostStatus::Publicado, 1);
    db::insert_post(&state.pool, &mut post).unwrap();
    let app = test::init_service(test_app(state)).await;
    let req = test::TestRequest::get()
      .uri(&format!("/api/postagem/{}/stats/", post.id))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(StatusCode::FORBIDDEN, resp.status());
    let status: JsonStatus = test::read_body_json(resp).await;
    assert_eq!("error", status.status);
  }

  #[actix_web::test]
  async fn stats_for_staff() {
    let (_dir, state) = test_app_state();
    let cookie = staff_cookie(&state.pool);
    let mut post = sample_post("Azul", Category::Reviews, PostStatus::Publicado, 1);
    db::insert_post(&state.pool, &mut post).unwrap();
    let app = test::init_service(test_app(state)).await;

    let track = test::TestRequest::post()
      .uri("/api/track-view/")
      .set_json(serde_json::json!({
        "tipo_conteudo": "postagem",
        "conteudo_id": post.id,
        "tempo_visualizacao": 45,
        "scroll_profundidade": 80
      }))
      .to_request();
    assert_eq!(StatusCode::OK, test::call_service(&app, track).await.status());

    let req = test::TestRequest::get()
      .uri(&format!("/api/postagem/{}/stats/", post.id))
      .cookie(cookie.clone())
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(StatusCode::OK, resp.status());
    let stats: EngagementDto = test::read_body_json(resp).await;
    assert_eq!(post.id, stats.postagem_id);
    assert_eq!(1, stats.total_visualizacoes);
    assert_eq!(1, stats.visualizacoes_30_dias);
    assert_eq!(45.0, stats.tempo_medio);
    assert_eq!("High", stats.engajamento);

    let missing = test::TestRequest::get()
      .uri("/api/postagem/9999/stats/")
      .cookie(cookie)
      .to_request();
    assert_eq!(StatusCode::NOT_FOUND, test::call_service(&app, missing).await.status());
  }
}
