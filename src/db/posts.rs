use rusqlite::{params, params_from_iter, ToSql};
use eyre::WrapErr;
use color_eyre::Result;
use super::entities::*;
use super::mappers::{map_post, POST_FIELDS};
use super::queries::{select_query_builder, Order, OrderBy};
use super::helpers::{generate_in_placeholders, generate_field_equal_qmark};
use super::{Pool, select_many, select_one, count};

// Suffix added to the title of duplicated posts.
pub const COPY_SUFFIX: &str = " (Cópia)";

// Listing filters for the public pages. Category is kept
// as the raw query string value, an unknown category just
// matches nothing.
fn published_where(category: Option<&str>) -> (Vec<String>, Vec<String>) {
  let mut clauses = vec![generate_field_equal_qmark("status")];
  let mut values = vec![PostStatus::Publicado.to_string()];
  if let Some(cat) = category {
    clauses.push(generate_field_equal_qmark("category"));
    values.push(cat.to_string());
  }
  (clauses, values)
}

pub fn published_post_count(
  pool: &Pool,
  category: Option<&str>
) -> Result<i64> {
  let (clauses, values) = published_where(category);
  let query = select_query_builder("count(*)", "posts", &clauses, None, None, None);
  count(pool, &query, params_from_iter(values.iter()))
}

pub fn published_posts(
  pool: &Pool,
  category: Option<&str>,
  start: usize,
  max: usize
) -> Result<Vec<Post>> {
  let (clauses, values) = published_where(category);
  let query = select_query_builder(
    POST_FIELDS,
    "posts",
    &clauses,
    Some(OrderBy::new(Order::Desc, "published_at")),
    Some(max),
    Some(start)
  );
  select_many(pool, &query, params_from_iter(values.iter()), map_post)
}

pub fn all_posts(pool: &Pool) -> Result<Vec<Post>> {
  let query = select_query_builder(
    POST_FIELDS,
    "posts",
    &[],
    Some(OrderBy::new(Order::Desc, "published_at")),
    None,
    None
  );
  select_many(pool, &query, [], map_post)
}

pub fn post_by_id(pool: &Pool, id: i64) -> Result<Option<Post>> {
  select_one(
    pool,
    &format!("SELECT {} FROM posts WHERE id = ?", POST_FIELDS),
    params![id],
    map_post
  )
}

// The public detail page only shows published posts.
pub fn published_post_by_id(pool: &Pool, id: i64) -> Result<Option<Post>> {
  select_one(
    pool,
    &format!("SELECT {} FROM posts WHERE id = ? AND status = ?", POST_FIELDS),
    params![id, PostStatus::Publicado.to_string()],
    map_post
  )
}

// Sets the id on the post that was passed.
pub fn insert_post(pool: &Pool, post: &mut Post) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO posts (title, subtitle, content, category, cover_image, \
    status, published_at, created_at, updated_at) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      post.title,
      post.subtitle,
      post.content,
      post.category.to_string(),
      post.cover_image,
      post.status.to_string(),
      post.published_at,
      post.created_at,
      post.updated_at
    ]
  ).context("Inserting post")?;
  post.id = conn.last_insert_rowid();
  Ok(())
}

// Only updates what's present in the update object.
// Returns false when the post doesn't exist.
pub fn update_post(
  pool: &Pool,
  id: i64,
  update: &PostUpdate,
  now: i64
) -> Result<bool> {
  let mut fields: Vec<String> = Vec::new();
  let mut values: Vec<Box<dyn ToSql>> = Vec::new();
  if let Some(title) = &update.title {
    fields.push(generate_field_equal_qmark("title"));
    values.push(Box::new(title.clone()));
  }
  if let Some(subtitle) = &update.subtitle {
    fields.push(generate_field_equal_qmark("subtitle"));
    values.push(Box::new(subtitle.clone()));
  }
  if let Some(content) = &update.content {
    fields.push(generate_field_equal_qmark("content"));
    values.push(Box::new(content.clone()));
  }
  if let Some(category) = update.category {
    fields.push(generate_field_equal_qmark("category"));
    values.push(Box::new(category.to_string()));
  }
  if let Some(status) = update.status {
    fields.push(generate_field_equal_qmark("status"));
    values.push(Box::new(status.to_string()));
  }
  if let Some(published_at) = update.published_at {
    fields.push(generate_field_equal_qmark("published_at"));
    values.push(Box::new(published_at));
  }
  fields.push(generate_field_equal_qmark("updated_at"));
  values.push(Box::new(now));
  values.push(Box::new(id));

  let conn = pool.get()?;
  let changed = conn.execute(
    &format!("UPDATE posts SET {} WHERE id = ?", fields.join(", ")),
    params_from_iter(values.iter())
  ).context("Updating post")?;
  Ok(changed > 0)
}

pub fn set_post_cover(
  pool: &Pool,
  id: i64,
  cover_image: Option<&str>,
  now: i64
) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute(
    "UPDATE posts SET cover_image = ?, updated_at = ? WHERE id = ?",
    params![cover_image, now, id]
  ).context("Updating post cover image")?;
  Ok(changed > 0)
}

pub fn delete_post(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute("DELETE FROM posts WHERE id = ?", params![id])
    .context("Deleting post")?;
  Ok(changed > 0)
}

// Bulk "publish" and "mark as draft" actions. Returns
// the amount of rows that were changed.
pub fn set_posts_status(
  pool: &Pool,
  ids: &[i64],
  status: PostStatus,
  now: i64
) -> Result<usize> {
  if ids.is_empty() {
    return Ok(0);
  }
  let mut values: Vec<Box<dyn ToSql>> = vec![
    Box::new(status.to_string()),
    Box::new(now)
  ];
  for id in ids {
    values.push(Box::new(*id));
  }
  let conn = pool.get()?;
  conn.execute(
    &format!(
      "UPDATE posts SET status = ?, updated_at = ? WHERE id IN ({})",
      generate_in_placeholders(ids.len())
    ),
    params_from_iter(values.iter())
  ).context("Bulk updating post status")
}

// Copies are always drafts, with the copy suffix in
// the title and no cover, a cover blob has a single
// owning post. Returns the new ids.
pub fn duplicate_posts(
  pool: &Pool,
  ids: &[i64],
  now: i64
) -> Result<Vec<i64>> {
  let mut new_ids = Vec::with_capacity(ids.len());
  for id in ids {
    if let Some(mut post) = post_by_id(pool, *id)? {
      post.title = format!("{}{}", post.title, COPY_SUFFIX);
      post.status = PostStatus::Rascunho;
      post.cover_image = None;
      post.created_at = now;
      post.updated_at = now;
      insert_post(pool, &mut post)?;
      new_ids.push(post.id);
    }
  }
  Ok(new_ids)
}
