use html2text::from_read;

// String::truncate panics when cutting a multibyte char
// in half, and titles here are full of accents.
// Counts chars, not bytes.
pub fn truncate_utf8(value: &mut String, max_chars: usize) {
  if let Some((idx, _)) = value.char_indices().nth(max_chars) {
    value.truncate(idx);
  }
}

pub fn truncated(value: &str, max_chars: usize) -> String {
  let mut s = value.to_string();
  truncate_utf8(&mut s, max_chars);
  s
}

pub fn strip_html(html: &str) -> String {
  from_read(html.as_bytes(), 1000)
}

// Plain text excerpt used when a post has no subtitle.
pub fn excerpt(html: &str, max_chars: usize) -> String {
  let text = strip_html(html)
    .split_whitespace()
    .collect::<Vec<&str>>()
    .join(" ");
  if text.chars().count() > max_chars {
    let mut cut = truncated(&text, max_chars);
    cut.push_str("...");
    cut
  } else {
    text
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_does_not_split_accents() {
    let mut sut = String::from("Análise");
    truncate_utf8(&mut sut, 3);
    assert_eq!("Aná", sut);
  }

  #[test]
  fn truncate_shorter_string_is_noop() {
    let mut sut = String::from("Dixit");
    truncate_utf8(&mut sut, 50);
    assert_eq!("Dixit", sut);
  }

  #[test]
  fn excerpt_strips_tags_and_cuts() {
    let html = "<p>Catan é um <b>clássico</b> absoluto.</p>";
    let result = excerpt(html, 12);
    assert!(!result.contains('<'));
    assert!(result.ends_with("..."));
    assert_eq!(15, result.chars().count());
  }
}
