use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use super::YoutubeError;
use crate::utils::time_utils::parse_rfc3339;

// One <entry> of a channel feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
  pub video_id: String,
  pub title: String,
  pub description: String,
  pub published_at: Option<i64>
}

// Fields as they get collected while walking an <entry>.
#[derive(Default)]
struct PartialEntry {
  yt_video_id: String,
  id: String,
  title: String,
  description: String,
  summary: String,
  published: String,
  link: Option<String>
}

impl PartialEntry {
  // The yt:videoId element wins, then the last segment
  // of "yt:video:ID", then the v parameter of the watch
  // link. No id at all means the entry is skipped.
  fn finish(self) -> Option<FeedEntry> {
    let video_id = if !self.yt_video_id.trim().is_empty() {
      self.yt_video_id.trim().to_string()
    } else if !self.id.trim().is_empty() {
      self.id.trim().rsplit(':').next().unwrap_or("").to_string()
    } else {
      self.link.as_deref().and_then(video_id_from_link).unwrap_or_default()
    };
    if video_id.is_empty() {
      return None;
    }
    let description = if self.description.is_empty() { self.summary } else { self.description };
    Some(FeedEntry {
      video_id,
      title: self.title.trim().to_string(),
      description: description.trim().to_string(),
      published_at: parse_rfc3339(&self.published)
    })
  }

  fn push_text(&mut self, element: &[u8], text: &str) {
    let target = match element {
      b"yt:videoId" => &mut self.yt_video_id,
      b"id" => &mut self.id,
      b"title" => &mut self.title,
      b"media:description" => &mut self.description,
      b"summary" => &mut self.summary,
      b"published" => &mut self.published,
      _ => return
    };
    target.push_str(text);
  }
}

// "https://www.youtube.com/watch?v=ID&t=1" -> "ID"
fn video_id_from_link(link: &str) -> Option<String> {
  let (_, query) = link.split_once('?')?;
  query.split('&')
    .find_map(|pair| pair.strip_prefix("v="))
    .map(str::trim)
    .filter(|id| !id.is_empty())
    .map(String::from)
}

// <link rel="alternate" href="..."/>, a link without rel
// counts as alternate too.
fn alternate_href(e: &BytesStart) -> Result<Option<String>, YoutubeError> {
  let mut rel: Option<String> = None;
  let mut href: Option<String> = None;
  for attr in e.attributes() {
    let attr = attr.map_err(|e| YoutubeError::Parse(e.to_string()))?;
    match attr.key.as_ref() {
      b"rel" => rel = Some(attr.unescape_value()?.into_owned()),
      b"href" => href = Some(attr.unescape_value()?.into_owned()),
      _ => {}
    }
  }
  match rel.as_deref() {
    None | Some("alternate") => Ok(href),
    _ => Ok(None)
  }
}

// Parses at most max_results entries, in feed order
// (newest first for YouTube).
pub fn parse_feed(xml: &str, max_results: usize) -> Result<Vec<FeedEntry>, YoutubeError> {
  let mut reader = Reader::from_str(xml);
  reader.trim_text(true);

  let mut entries: Vec<FeedEntry> = Vec::new();
  // Element names from the root down to the current one.
  let mut path: Vec<Vec<u8>> = Vec::new();
  let mut current: Option<PartialEntry> = None;

  loop {
    if entries.len() >= max_results {
      break;
    }
    match reader.read_event()? {
      Event::Start(e) => {
        let name = e.name().as_ref().to_vec();
        if name == b"entry" {
          current = Some(PartialEntry::default());
        } else if name == b"link" {
          if let Some(entry) = current.as_mut() {
            if let Some(href) = alternate_href(&e)? {
              entry.link = Some(href);
            }
          }
        }
        path.push(name);
      },
      Event::Empty(e) => {
        if e.name().as_ref() == b"link" {
          if let Some(entry) = current.as_mut() {
            if let Some(href) = alternate_href(&e)? {
              entry.link = Some(href);
            }
          }
        }
      },
      Event::Text(t) => {
        if let (Some(entry), Some(element)) = (current.as_mut(), path.last()) {
          // Only direct children of <entry> and the
          // media:group description are of interest, the
          // feed has its own <title> and <id>.
          let parent = path.len().checked_sub(2).and_then(|i| path.get(i));
          let in_entry = parent.map(|p| p.as_slice() == b"entry").unwrap_or(false);
          if in_entry || element.as_slice() == b"media:description" {
            entry.push_text(element, &t.unescape()?);
          }
        }
      },
      Event::CData(t) => {
        if let (Some(entry), Some(element)) = (current.as_mut(), path.last()) {
          let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
          entry.push_text(element, &text);
        }
      },
      Event::End(e) => {
        path.pop();
        if e.name().as_ref() == b"entry" {
          if let Some(entry) = current.take().and_then(PartialEntry::finish) {
            entries.push(entry);
          }
        }
      },
      Event::Eof => break,
      _ => {}
    }
  }
  Ok(entries)
}

#[cfg(test)]
pub mod tests {
  use super::*;

  pub const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UC123"/>
 <id>yt:channel:UC123</id>
 <yt:channelId>UC123</yt:channelId>
 <title>Mesa Secreta</title>
 <entry>
  <id>yt:video:AAAAAAAAAAA</id>
  <yt:videoId>AAAAAAAAAAA</yt:videoId>
  <title>Review: Cascadia &amp; expansões</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=AAAAAAAAAAA"/>
  <published>2024-03-01T18:00:06+00:00</published>
  <updated>2024-03-02T10:00:00+00:00</updated>
  <media:group>
   <media:title>Review: Cascadia &amp; expansões</media:title>
   <media:description>Tudo sobre Cascadia.</media:description>
  </media:group>
 </entry>
 <entry>
  <id>yt:video:BBBBBBBBBBB</id>
  <title>Top 10 jogos para dois</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=BBBBBBBBBBB"/>
  <published>not a date</published>
 </entry>
 <entry>
  <id>yt:video:CCCCCCCCCCC</id>
  <yt:videoId>CCCCCCCCCCC</yt:videoId>
  <title>Como jogar Azul</title>
  <published>2024-02-01T12:00:00+00:00</published>
 </entry>
</feed>"#;

  #[test]
  fn parses_entries_in_order() {
    let entries = parse_feed(SAMPLE_FEED, 15).unwrap();
    assert_eq!(3, entries.len());
    let first = &entries[0];
    assert_eq!("AAAAAAAAAAA", first.video_id);
    assert_eq!("Review: Cascadia & expansões", first.title);
    assert_eq!("Tudo sobre Cascadia.", first.description);
    assert_eq!(Some(1709316006), first.published_at);
  }

  #[test]
  fn falls_back_on_entry_id_and_missing_fields() {
    let entries = parse_feed(SAMPLE_FEED, 15).unwrap();
    let second = &entries[1];
    assert_eq!("BBBBBBBBBBB", second.video_id);
    assert_eq!("", second.description);
    assert_eq!(None, second.published_at);
  }

  #[test]
  fn watch_link_is_the_last_id_fallback() {
    let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom">
 <entry>
  <title>Unboxing de Wingspan</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=DDDDDDDDDDD&amp;t=3"/>
 </entry>
 <entry>
  <title>Sem id nenhum</title>
  <link rel="alternate" href="https://www.youtube.com/channel/UC123"/>
 </entry>
</feed>"#;
    let entries = parse_feed(feed, 15).unwrap();
    assert_eq!(1, entries.len());
    assert_eq!("DDDDDDDDDDD", entries[0].video_id);
  }

  #[test]
  fn video_id_from_watch_links() {
    assert_eq!(Some("abc".to_string()), video_id_from_link("https://youtu.be/watch?feature=x&v=abc"));
    assert_eq!(None, video_id_from_link("https://www.youtube.com/watch"));
    assert_eq!(None, video_id_from_link("https://www.youtube.com/watch?v="));
  }

  #[test]
  fn max_results_limits_entries() {
    let entries = parse_feed(SAMPLE_FEED, 2).unwrap();
    assert_eq!(2, entries.len());
    assert!(parse_feed(SAMPLE_FEED, 0).unwrap().is_empty());
  }

  #[test]
  fn feed_level_title_is_ignored() {
    let entries = parse_feed(SAMPLE_FEED, 15).unwrap();
    assert!(entries.iter().all(|e| e.title != "Mesa Secreta"));
  }

  #[test]
  fn broken_xml_is_an_error() {
    assert!(parse_feed("<feed><entry><title>x</entry></feed>", 15).is_err());
  }
}
