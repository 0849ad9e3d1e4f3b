use serde::{Deserialize, Deserializer};

// My editors' frontend sends empty strings for fields
// that should become NULL in database.
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}

// To be used with annotation:
// #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
// Gives Some(None) when the key is present and null, None
// when the key is absent. Mostly useful for partial updates.
pub fn deserialize_null_value<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>
{
  Option::<T>::deserialize(deserializer).map(Some)
}

// The tracking script sends numbers that can be either
// integers or floats (performance.now() math). Anything
// else, including null, becomes 0.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(match value {
    serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
    serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
    _ => 0.0
  })
}

// Content ids may come as numbers or numeric strings,
// anything else means "no id".
pub fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::Number(n)) => n.as_i64(),
    Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
    _ => None
  })
}
