use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use color_eyre::Result;
use csv::WriterBuilder;
use eyre::WrapErr;
use serde::Serialize;
use crate::db::entities::{Post, Video, ViewEvent};
use crate::utils::time_utils::{timestamp_to_date_string, DateFormat};

// Anything that can be a line in a CSV export. The
// header comes from the field names of the row struct.
pub trait CsvExportable {
  type Row: Serialize;
  fn csv_row(&self) -> Self::Row;
}

#[derive(Serialize)]
pub struct PostCsvRow {
  pub id: i64,
  pub titulo: String,
  pub subtitulo: String,
  pub categoria: String,
  pub status: String,
  pub imagem_capa: String,
  pub data_publicacao: String,
  pub data_criacao: String,
  pub data_atualizacao: String
}

impl CsvExportable for Post {
  type Row = PostCsvRow;

  fn csv_row(&self) -> PostCsvRow {
    PostCsvRow {
      id: self.id,
      titulo: self.title.clone(),
      subtitulo: self.subtitle.clone(),
      categoria: self.category.to_string(),
      status: self.status.to_string(),
      imagem_capa: self.cover_image.clone().unwrap_or_default(),
      data_publicacao: timestamp_to_date_string(self.published_at, DateFormat::Iso),
      data_criacao: timestamp_to_date_string(self.created_at, DateFormat::Iso),
      data_atualizacao: timestamp_to_date_string(self.updated_at, DateFormat::Iso)
    }
  }
}

#[derive(Serialize)]
pub struct VideoCsvRow {
  pub id: i64,
  pub titulo: String,
  pub youtube_id: String,
  pub url: String,
  pub data_publicacao: String
}

impl CsvExportable for Video {
  type Row = VideoCsvRow;

  fn csv_row(&self) -> VideoCsvRow {
    VideoCsvRow {
      id: self.id,
      titulo: self.title.clone(),
      youtube_id: self.youtube_id.clone(),
      url: self.youtube_url(),
      data_publicacao: timestamp_to_date_string(self.published_at, DateFormat::Iso)
    }
  }
}

#[derive(Serialize)]
pub struct ViewEventCsvRow {
  pub id: i64,
  pub sessao: String,
  pub tipo_conteudo: String,
  pub conteudo_id: Option<i64>,
  pub conteudo_titulo: String,
  pub tempo_visualizacao: i64,
  pub scroll_profundidade: i64,
  pub ip: String,
  pub user_agent: String,
  pub primeira_visita: String,
  pub ultima_visita: String
}

impl CsvExportable for ViewEvent {
  type Row = ViewEventCsvRow;

  fn csv_row(&self) -> ViewEventCsvRow {
    ViewEventCsvRow {
      id: self.id,
      sessao: self.session_key.clone(),
      tipo_conteudo: self.content_type.clone(),
      conteudo_id: self.content_id,
      conteudo_titulo: self.content_title.clone(),
      tempo_visualizacao: self.time_on_page,
      scroll_profundidade: self.scroll_depth,
      ip: self.ip_address.clone().unwrap_or_default(),
      user_agent: self.user_agent.clone(),
      primeira_visita: timestamp_to_date_string(self.first_seen, DateFormat::Iso),
      ultima_visita: timestamp_to_date_string(self.last_seen, DateFormat::Iso)
    }
  }
}

pub fn write_csv<T: CsvExportable, W: Write>(items: &[T], writer: W) -> Result<W> {
  let mut csv_writer = WriterBuilder::new().from_writer(writer);
  for item in items {
    csv_writer.serialize(item.csv_row())
      .context("Writing CSV row")?;
  }
  csv_writer.flush()?;
  csv_writer.into_inner()
    .map_err(|e| eyre::eyre!("Flushing CSV: {}", e.error()))
}

// In-memory export for the HTTP endpoints.
pub fn csv_bytes<T: CsvExportable>(items: &[T]) -> Result<Vec<u8>> {
  write_csv(items, Vec::new())
}

pub fn export_csv_to_file<T: CsvExportable, P: AsRef<Path>>(items: &[T], path: P) -> Result<()> {
  let file = File::create(path.as_ref())
    .with_context(|| format!("Creating {}", path.as_ref().display()))?;
  let mut writer = write_csv(items, BufWriter::new(file))?;
  writer.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::entities::{Category, PostStatus};
  use crate::db::sample_post;

  fn view_event(id: i64, content_id: Option<i64>) -> ViewEvent {
    ViewEvent {
      id,
      session_key: format!("s{}", id),
      content_type: "postagem".to_string(),
      content_id,
      content_title: "Título, com vírgula".to_string(),
      time_on_page: 30,
      scroll_depth: 80,
      ip_address: None,
      user_agent: "Mozilla/5.0".to_string(),
      first_seen: 0,
      last_seen: 10
    }
  }

  #[test]
  fn post_export_has_header_and_rows() {
    let posts = vec![
      sample_post("Azul", Category::Reviews, PostStatus::Publicado, 0),
      sample_post("Wingspan", Category::Dicas, PostStatus::Rascunho, 0)
    ];
    let text = String::from_utf8(csv_bytes(&posts).unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(3, lines.len());
    assert!(lines[0].starts_with("id,titulo,subtitulo,categoria,status"));
    assert!(lines[1].contains(",reviews,publicado,"));
  }

  #[test]
  fn view_export_quotes_commas() {
    let events = vec![view_event(1, Some(3)), view_event(2, None)];
    let bytes = csv_bytes(&events).unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(Some("conteudo_titulo"), headers.get(4));
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(2, records.len());
    assert_eq!(Some("Título, com vírgula"), records[0].get(4));
    assert_eq!(Some(""), records[1].get(3));
  }

  #[test]
  fn empty_export_writes_nothing() {
    let videos: Vec<Video> = Vec::new();
    assert!(csv_bytes(&videos).unwrap().is_empty());
  }

  #[test]
  fn export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("views.csv");
    export_csv_to_file(&[view_event(1, Some(1))], &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(2, text.lines().count());
  }
}
