use actix_web::{
  HttpRequest,
  HttpResponse
};
use std::net::IpAddr;
use std::str::FromStr;
use regex::Regex;
use lazy_static::lazy_static;
use log::error;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{json, Value};
use crate::db::entities::User;
use super::error::Error;
use super::AppState;

// Extracting Actix header values is kinda convoluted,
// a header with invalid characters gives an empty string.
pub fn header_value(req: &HttpRequest, name: &str) -> String {
  req.headers().get(name)
    .map(|h| String::from(h.to_str().unwrap_or("")))
    .unwrap_or_default()
}

pub fn user_agent(req: &HttpRequest) -> String {
  header_value(req, "user-agent")
}

// Actix gives us the "IP address" with or without a port
// part, the regex removes it.
pub fn real_ip_addr(req: &HttpRequest) -> Option<IpAddr> {
  lazy_static! {
    static ref PORT_REGEX: Regex = Regex::new(
      r"(.+):\d+$"
    ).unwrap();
  }

  req.connection_info().realip_remote_addr()
    .and_then(|ip| {
      // Bare IPv6 addresses would lose their last group
      // to the regex, so try the value as-is first.
      IpAddr::from_str(ip)
        .or_else(|_| IpAddr::from_str(&PORT_REGEX.replace(ip, "$1")))
        .ok()
    })
}

// Page context every template gets, whatever the page:
// site info from the config, the site configuration
// record and the logged in user. The page data goes in
// "page".
pub fn page_context<T: Serialize>(
  app_state: &AppState,
  user: Option<&User>,
  page: T
) -> Value {
  json!({
    "site": &app_state.site_info,
    "site_config": app_state.site_settings.current(),
    "user": user.map(|u| json!({
      "username": u.username,
      "is_staff": u.is_staff
    })),
    "page": page
  })
}

pub fn render<T: Serialize>(
  hb: &Handlebars<'_>,
  template: &str,
  data: &T
) -> Result<HttpResponse, Error> {
  let body = hb.render(template, data)
    .map_err(|e| {
      error!("Template engine error when rendering {}: {}", template, e);
      Error::InternalServerError("Template engine error".to_string())
    })?;
  Ok(
    HttpResponse::Ok()
      .content_type("text/html; charset=utf-8")
      .body(body)
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn ip_without_port() {
    let req = TestRequest::default()
      .insert_header(("x-forwarded-for", "203.0.113.9:5555"))
      .to_http_request();
    assert_eq!(Some("203.0.113.9".parse().unwrap()), real_ip_addr(&req));
  }

  #[test]
  fn bare_ipv6_is_kept() {
    let req = TestRequest::default()
      .insert_header(("x-forwarded-for", "2001:db8::1"))
      .to_http_request();
    assert_eq!(Some("2001:db8::1".parse().unwrap()), real_ip_addr(&req));
  }

  #[test]
  fn missing_header_is_empty() {
    let req = TestRequest::default().to_http_request();
    assert_eq!("", user_agent(&req));
  }
}
