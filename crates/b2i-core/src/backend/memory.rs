use std::cmp::Ordering;
use std::collections::BTreeMap;

use b2i_shared::model::USER_SETTINGS_TABLE;
use b2i_shared::postgrest::{
  ApiError,
  Method,
  NO_ROWS_CODE,
  Request,
  Response
};
use chrono::{
  SecondsFormat,
  Utc
};
use parking_lot::Mutex;
use serde_json::{
  Map,
  Value,
  json
};
use tracing::{
  debug,
  trace
};
use uuid::Uuid;

use super::Backend;

pub type Row = Map<String, Value>;

/// Tables that carry an `updated_at`
/// stamp on insert.
const STAMPED_TABLES: [&str; 1] =
  [USER_SETTINGS_TABLE];

const RESERVED_PARAMS: [&str; 4] =
  ["select", "order", "limit", "on_conflict"];

/// In-memory interpreter for data
/// requests. Understands `eq` filters,
/// ordering, limits, single-object
/// responses, inserts, upserts, patches
/// and deletes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
  tables: Mutex<BTreeMap<String, Vec<Row>>>
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_tables(
    tables: BTreeMap<String, Vec<Row>>
  ) -> Self {
    Self {
      tables: Mutex::new(tables)
    }
  }

  /// Copy of a table's rows in storage
  /// order.
  pub fn rows(
    &self,
    table: &str
  ) -> Vec<Row> {
    self
      .tables
      .lock()
      .get(table)
      .cloned()
      .unwrap_or_default()
  }

  pub fn table_names(&self) -> Vec<String> {
    self.tables.lock().keys().cloned().collect()
  }

  fn select(
    &self,
    table: &str,
    request: &Request
  ) -> Result<Response, ApiError> {
    let filters = eq_filters(request)?;
    let mut rows: Vec<Row> = self
      .tables
      .lock()
      .get(table)
      .map(|rows| {
        rows
          .iter()
          .filter(|row| {
            matches_all(row, &filters)
          })
          .cloned()
          .collect()
      })
      .unwrap_or_default();

    if let Some(order) =
      request.query_value("order")
    {
      sort_rows(&mut rows, order);
    }
    if let Some(limit) =
      request.query_value("limit")
    {
      let limit: usize =
        limit.parse().map_err(|_| {
          ApiError::InvalidRequest(format!(
            "bad limit: {limit}"
          ))
        })?;
      rows.truncate(limit);
    }

    trace!(table, count = rows.len(), "selected rows");
    respond(request, 200, rows)
  }

  fn insert(
    &self,
    table: &str,
    request: &Request
  ) -> Result<Response, ApiError> {
    let incoming = body_rows(request)?;
    let conflict: Option<Vec<String>> =
      request.query_value("on_conflict").map(
        |cols| {
          cols
            .split(',')
            .map(|col| col.trim().to_string())
            .filter(|col| !col.is_empty())
            .collect()
        }
      );
    let merge = request
      .prefers("resolution=merge-duplicates");

    let mut tables = self.tables.lock();
    let stored =
      tables.entry(table.to_string()).or_default();
    let mut returned = Vec::with_capacity(
      incoming.len()
    );

    for mut row in incoming {
      if let Some(cols) = &conflict {
        let existing =
          stored.iter_mut().find(|candidate| {
            cols.iter().all(|col| {
              candidate.get(col) == row.get(col)
            })
          });
        if let Some(existing) = existing {
          if !merge {
            return Err(conflict_error(table));
          }
          for (key, value) in row {
            if key != "id" {
              existing.insert(key, value);
            }
          }
          returned.push(existing.clone());
          continue;
        }
      }

      fill_defaults(table, &mut row);
      returned.push(row.clone());
      stored.push(row);
    }

    debug!(
      table,
      count = returned.len(),
      upsert = conflict.is_some(),
      "inserted rows"
    );
    drop(tables);
    respond(request, 201, returned)
  }

  fn update(
    &self,
    table: &str,
    request: &Request
  ) -> Result<Response, ApiError> {
    let filters = eq_filters(request)?;
    let patch = match &request.body {
      | Some(Value::Object(patch)) => patch.clone(),
      | _ => {
        return Err(ApiError::InvalidRequest(
          "update body must be an object"
            .to_string()
        ));
      }
    };

    let mut tables = self.tables.lock();
    let mut returned = Vec::new();
    if let Some(rows) = tables.get_mut(table) {
      for row in rows.iter_mut() {
        if matches_all(row, &filters) {
          for (key, value) in &patch {
            row.insert(key.clone(), value.clone());
          }
          returned.push(row.clone());
        }
      }
    }
    debug!(table, count = returned.len(), "updated rows");
    drop(tables);
    respond(request, 200, returned)
  }

  fn delete(
    &self,
    table: &str,
    request: &Request
  ) -> Result<Response, ApiError> {
    let filters = eq_filters(request)?;
    let mut tables = self.tables.lock();
    let removed = tables
      .get_mut(table)
      .map(|rows| {
        let before = rows.len();
        rows.retain(|row| {
          !matches_all(row, &filters)
        });
        before - rows.len()
      })
      .unwrap_or(0);
    debug!(table, removed, "deleted rows");
    Ok(Response::new(204, ""))
  }
}

impl Backend for MemoryBackend {
  fn execute(
    &self,
    request: &Request
  ) -> Result<Response, ApiError> {
    let Some(table) = request.table() else {
      return Ok(Response::json_body(
        501,
        &json!({
          "msg": "authentication is not \
                  available without a \
                  remote store"
        })
      ));
    };
    let table = table.to_string();

    match request.method {
      | Method::Get => {
        self.select(&table, request)
      }
      | Method::Post => {
        self.insert(&table, request)
      }
      | Method::Patch => {
        self.update(&table, request)
      }
      | Method::Delete => {
        self.delete(&table, request)
      }
    }
  }
}

fn eq_filters(
  request: &Request
) -> Result<Vec<(String, String)>, ApiError>
{
  request
    .query
    .iter()
    .filter(|(key, _)| {
      !RESERVED_PARAMS.contains(&key.as_str())
    })
    .map(|(key, raw)| {
      raw
        .strip_prefix("eq.")
        .map(|value| {
          (key.clone(), value.to_string())
        })
        .ok_or_else(|| {
          ApiError::InvalidRequest(format!(
            "unsupported filter \
             {key}={raw}"
          ))
        })
    })
    .collect()
}

fn matches_all(
  row: &Row,
  filters: &[(String, String)]
) -> bool {
  filters.iter().all(|(col, expected)| {
    match row.get(col) {
      | Some(Value::String(text)) => {
        text == expected
      }
      | Some(Value::Null) | None => {
        expected == "null"
      }
      | Some(other) => {
        other.to_string() == *expected
      }
    }
  })
}

fn sort_rows(rows: &mut [Row], order: &str) {
  let keys: Vec<(&str, bool)> = order
    .split(',')
    .filter_map(|part| {
      let part = part.trim();
      if part.is_empty() {
        return None;
      }
      Some(match part.rsplit_once('.') {
        | Some((col, "desc")) => (col, false),
        | Some((col, "asc")) => (col, true),
        | _ => (part, true)
      })
    })
    .collect();

  rows.sort_by(|a, b| {
    for (col, ascending) in &keys {
      let ord = compare_values(
        a.get(*col),
        b.get(*col)
      );
      let ord =
        if *ascending { ord } else { ord.reverse() };
      if ord != Ordering::Equal {
        return ord;
      }
    }
    Ordering::Equal
  });
}

fn compare_values(
  a: Option<&Value>,
  b: Option<&Value>
) -> Ordering {
  match (a, b) {
    | (
      Some(Value::Number(x)),
      Some(Value::Number(y))
    ) => {
      let x = x.as_f64().unwrap_or_default();
      let y = y.as_f64().unwrap_or_default();
      x.partial_cmp(&y)
        .unwrap_or(Ordering::Equal)
    }
    | (
      Some(Value::String(x)),
      Some(Value::String(y))
    ) => x.cmp(y),
    | (Some(Value::Bool(x)), Some(Value::Bool(y))) => {
      x.cmp(y)
    }
    | (None | Some(Value::Null), None | Some(Value::Null)) => {
      Ordering::Equal
    }
    | (None | Some(Value::Null), _) => {
      Ordering::Greater
    }
    | (_, None | Some(Value::Null)) => {
      Ordering::Less
    }
    | (Some(x), Some(y)) => {
      x.to_string().cmp(&y.to_string())
    }
  }
}

fn body_rows(
  request: &Request
) -> Result<Vec<Row>, ApiError> {
  match &request.body {
    | Some(Value::Object(row)) => {
      Ok(vec![row.clone()])
    }
    | Some(Value::Array(rows)) => rows
      .iter()
      .map(|row| {
        row.as_object().cloned().ok_or_else(
          || {
            ApiError::InvalidRequest(
              "insert rows must be objects"
                .to_string()
            )
          }
        )
      })
      .collect(),
    | _ => Err(ApiError::InvalidRequest(
      "insert body must be an object or \
       array"
        .to_string()
    ))
  }
}

fn fill_defaults(table: &str, row: &mut Row) {
  let now = Utc::now().to_rfc3339_opts(
    SecondsFormat::Micros,
    true
  );
  row
    .entry("id")
    .or_insert_with(|| {
      Value::String(Uuid::new_v4().to_string())
    });
  row
    .entry("created_at")
    .or_insert_with(|| Value::String(now.clone()));
  if STAMPED_TABLES.contains(&table) {
    row
      .entry("updated_at")
      .or_insert_with(|| Value::String(now));
  }
}

fn conflict_error(table: &str) -> ApiError {
  ApiError::Postgrest {
    status:  409,
    code:    "23505".to_string(),
    message: format!(
      "duplicate key value violates \
       unique constraint on {table}"
    ),
    details: None,
    hint:    None
  }
}

/// Encodes rows the way the request
/// asked: a list, or one object for
/// single-object requests.
fn respond(
  request: &Request,
  status: u16,
  rows: Vec<Row>
) -> Result<Response, ApiError> {
  if request.wants_object() {
    let mut rows = rows.into_iter();
    return match (rows.next(), rows.next()) {
      | (Some(row), None) => Ok(
        Response::json_body(
          status,
          &Value::Object(row)
        )
      ),
      | _ => Ok(Response::json_body(
        406,
        &json!({
          "code": NO_ROWS_CODE,
          "message": "JSON object requested, \
                      multiple (or no) rows \
                      returned",
          "details": null,
          "hint": null
        })
      ))
    };
  }
  let rows: Vec<Value> =
    rows.into_iter().map(Value::Object).collect();
  Ok(Response::json_body(
    status,
    &Value::Array(rows)
  ))
}

#[cfg(test)]
mod tests {
  use b2i_shared::postgrest::{
    ClientConfig,
    from
  };
  use pretty_assertions::assert_eq;

  use super::*;

  fn config() -> ClientConfig {
    ClientConfig::new("http://memory", "anon")
  }

  fn run(
    backend: &MemoryBackend,
    request: Request
  ) -> Response {
    backend
      .execute(&request)
      .expect("execute")
      .check(&request)
      .expect("success")
  }

  #[test]
  fn insert_select_order_and_limit() {
    let backend = MemoryBackend::new();
    let rows = json!([
      { "user_id": "u1", "label": "b", "position": 1 },
      { "user_id": "u1", "label": "a", "position": 0 },
      { "user_id": "u2", "label": "z", "position": 0 },
    ]);
    let inserted: Vec<Row> = run(
      &backend,
      from("checklist_items")
        .insert(&rows)
        .expect("body")
        .into_request(&config(), None)
    )
    .json()
    .expect("rows");
    assert_eq!(inserted.len(), 3);
    assert!(inserted.iter().all(|row| {
      row.contains_key("id")
        && row.contains_key("created_at")
    }));

    let selected: Vec<Row> = run(
      &backend,
      from("checklist_items")
        .select("*")
        .eq("user_id", "u1")
        .order("position", true)
        .limit(5)
        .into_request(&config(), None)
    )
    .json()
    .expect("rows");
    let labels: Vec<&str> = selected
      .iter()
      .filter_map(|row| row.get("label")?.as_str())
      .collect();
    assert_eq!(labels, vec!["a", "b"]);
  }

  #[test]
  fn single_without_rows_reports_no_rows() {
    let backend = MemoryBackend::new();
    let request = from("user_settings")
      .select("*")
      .eq("user_id", "nobody")
      .single()
      .into_request(&config(), None);
    let response =
      backend.execute(&request).expect("execute");
    let err = response
      .check(&request)
      .expect_err("no rows");
    assert!(err.is_no_rows());
  }

  #[test]
  fn upsert_merges_matching_row() {
    let backend = MemoryBackend::new();
    for note in ["first", "second"] {
      run(
        &backend,
        from("weekly_checkins")
          .upsert(
            &json!({
              "user_id": "u1",
              "week_of": "2026-02-23",
              "flag_note": note
            }),
            "user_id,week_of"
          )
          .expect("body")
          .single()
          .into_request(&config(), None)
      );
    }
    let rows = backend.rows("weekly_checkins");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["flag_note"], json!("second"));
  }

  #[test]
  fn update_and_delete_follow_filters() {
    let backend = MemoryBackend::new();
    run(
      &backend,
      from("goals")
        .insert(&json!([
          { "user_id": "u1", "title": "a", "is_completed": false },
          { "user_id": "u1", "title": "b", "is_completed": false },
        ]))
        .expect("body")
        .into_request(&config(), None)
    );

    run(
      &backend,
      from("goals")
        .update(&json!({ "is_completed": true }))
        .expect("body")
        .eq("title", "a")
        .into_request(&config(), None)
    );
    let done: Vec<Row> = run(
      &backend,
      from("goals")
        .select("*")
        .eq("is_completed", true)
        .into_request(&config(), None)
    )
    .json()
    .expect("rows");
    assert_eq!(done.len(), 1);

    run(
      &backend,
      from("goals")
        .delete()
        .eq("user_id", "u1")
        .eq("title", "b")
        .into_request(&config(), None)
    );
    assert_eq!(backend.rows("goals").len(), 1);
  }

  #[test]
  fn auth_requests_are_refused() {
    let backend = MemoryBackend::new();
    let request =
      Request::new(Method::Post, "/auth/v1/otp");
    let response =
      backend.execute(&request).expect("execute");
    assert_eq!(response.status, 501);
  }
}
