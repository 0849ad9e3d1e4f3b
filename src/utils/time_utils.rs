use chrono::{DateTime, Local, TimeZone};

// Brazilian style date format for the templates: dd/MM/yyyy HH:mm
// chrono formatting reference:
// https://docs.rs/chrono/latest/chrono/format/strftime/index.html
const DATE_FORMAT_STANDARD: &str = "%d/%m/%Y %H:%M";
const DATE_FORMAT_SHORT: &str = "%d/%m/%Y";
const DATE_FORMAT_ISO: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub const SECONDS_PER_DAY: i64 = 86_400;

pub enum DateFormat {
  Standard,
  Short,
  Iso
}

pub fn timestamp_to_date_string(timestamp: i64, format: DateFormat) -> String {
  let format_str = match format {
    DateFormat::Standard => DATE_FORMAT_STANDARD,
    DateFormat::Short => DATE_FORMAT_SHORT,
    DateFormat::Iso => DATE_FORMAT_ISO
  };
  // Out of range timestamps can't happen with what we store
  // but I'd rather print nothing than panic.
  match Local.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.format(format_str).to_string(),
    None => String::new()
  }
}

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

// The YouTube feed dates look like 2024-03-01T18:00:06+00:00
pub fn parse_rfc3339(value: &str) -> Option<i64> {
  DateTime::parse_from_rfc3339(value.trim())
    .ok()
    .map(|d| d.timestamp())
}

pub fn days_before(timestamp: i64, days: i64) -> i64 {
  timestamp - days * SECONDS_PER_DAY
}
