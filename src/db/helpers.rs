/**
 * Generate a certain amount of query placeholders
 * for an IN clause: "?, ?, ?"
 */
pub fn generate_in_placeholders(count: usize) -> String {
  let mut all_qmarks: Vec<&str> = Vec::with_capacity(count);
  for _ in 0..count {
    all_qmarks.push("?");
  }
  all_qmarks.join(", ")
}

pub fn generate_field_equal_qmark(name: &str) -> String {
  format!("{} = ?", name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generate_4_query_placeholders() {
    let expected = String::from("?, ?, ?, ?");
    assert_eq!(generate_in_placeholders(4), expected);
  }

  #[test]
  fn field_equal_qmark() {
    assert_eq!("category = ?", generate_field_equal_qmark("category"));
  }
}
