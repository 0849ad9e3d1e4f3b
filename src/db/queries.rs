// Small SELECT builder for the listing queries, the
// ones where the WHERE clause depends on the request.
// Everything else is plain SQL strings.

pub enum Order {
  Asc,
  Desc
}

pub struct OrderBy {
  pub order: Order,
  pub field: String
}

impl OrderBy {
  pub fn new(order: Order, field: &str) -> Self {
    OrderBy {
      order,
      field: field.to_string()
    }
  }
}

// The "q_" in front of argument names is just because
// "where" is a reserved keyword in Rust.
// WHERE clauses are always glued with AND.
pub fn select_query_builder(
  q_fields: &str,
  q_from: &str,
  q_where: &[String],
  q_order: Option<OrderBy>,
  limit: Option<usize>,
  offset: Option<usize>
) -> String {
  let mut query = format!(
    "SELECT {} FROM {} ",
    q_fields,
    q_from
  );
  if !q_where.is_empty() {
    query.push_str(
      &format!(
        "WHERE {} ",
        q_where.join(" AND ")
      )
    );
  }
  if let Some(order) = q_order {
    query.push_str(&format!("ORDER BY {} ", order.field));
    query.push_str(
      match order.order {
        Order::Asc => "ASC ",
        Order::Desc => "DESC "
      }
    );
  }
  if let Some(lim) = limit {
    query.push_str(&format!("LIMIT {} ", lim));
    if let Some(off) = offset {
      query.push_str(&format!("OFFSET {} ", off));
    }
  }
  query
}
