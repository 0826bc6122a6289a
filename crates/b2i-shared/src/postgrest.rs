//! Transport-agnostic request builder for
//! the hosted data API (PostgREST
//! dialect).
//!
//! A builder produces a [`Request`];
//! whoever owns an HTTP client executes
//! it and hands back a [`Response`].
//! Native code runs requests through a
//! blocking client or an in-memory
//! interpreter, the web front-end through
//! the browser's fetch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Error code returned when a
/// single-object request matches no row.
pub const NO_ROWS_CODE: &str = "PGRST116";

pub const REST_PREFIX: &str = "/rest/v1/";
pub const OBJECT_ACCEPT: &str =
  "application/vnd.pgrst.object+json";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
pub enum Method {
  Get,
  Post,
  Patch,
  Delete
}

impl Method {
  pub fn as_str(self) -> &'static str {
    match self {
      | Method::Get => "GET",
      | Method::Post => "POST",
      | Method::Patch => "PATCH",
      | Method::Delete => "DELETE"
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
)]
pub struct ClientConfig {
  pub url:      String,
  pub anon_key: String
}

impl ClientConfig {
  pub fn new(
    url: impl Into<String>,
    anon_key: impl Into<String>
  ) -> Self {
    Self {
      url:      url
        .into()
        .trim_end_matches('/')
        .to_string(),
      anon_key: anon_key.into()
    }
  }

  pub fn is_configured(&self) -> bool {
    !self.url.trim().is_empty()
      && !self.anon_key.trim().is_empty()
  }

  /// Headers every request carries. The
  /// bearer is the user's access token,
  /// or the anon key when signed out.
  pub fn base_headers(
    &self,
    access_token: Option<&str>
  ) -> Vec<(String, String)> {
    let bearer = access_token
      .unwrap_or(&self.anon_key);
    vec![
      (
        "apikey".to_string(),
        self.anon_key.clone()
      ),
      (
        "Authorization".to_string(),
        format!("Bearer {bearer}")
      ),
    ]
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method:  Method,
  pub path:    String,
  pub query:   Vec<(String, String)>,
  pub headers: Vec<(String, String)>,
  pub body:    Option<Value>
}

impl Request {
  pub fn new(
    method: Method,
    path: impl Into<String>
  ) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      headers: Vec::new(),
      body: None
    }
  }

  pub fn header(
    &self,
    name: &str
  ) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(key, _)| {
        key.eq_ignore_ascii_case(name)
      })
      .map(|(_, value)| value.as_str())
  }

  pub fn query_value(
    &self,
    name: &str
  ) -> Option<&str> {
    self
      .query
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  /// Table name for data requests.
  pub fn table(&self) -> Option<&str> {
    self.path.strip_prefix(REST_PREFIX)
  }

  pub fn wants_object(&self) -> bool {
    self.header("Accept")
      == Some(OBJECT_ACCEPT)
  }

  /// `true` when the `Prefer` header
  /// contains `token`.
  pub fn prefers(
    &self,
    token: &str
  ) -> bool {
    self.header("Prefer").is_some_and(
      |prefer| {
        prefer
          .split(',')
          .any(|part| part.trim() == token)
      }
    )
  }

  /// Absolute URL against `base`, with
  /// the query string encoded.
  pub fn url(
    &self,
    base: &str
  ) -> Result<Url, ApiError> {
    let mut url = Url::parse(base)
      .and_then(|root| {
        root.join(&self.path)
      })
      .map_err(|err| {
        ApiError::InvalidRequest(format!(
          "bad url {base}{}: {err}",
          self.path
        ))
      })?;
    if !self.query.is_empty() {
      let mut pairs =
        url.query_pairs_mut();
      for (key, value) in &self.query {
        pairs.append_pair(key, value);
      }
    }
    Ok(url)
  }

  pub fn body_text(
    &self
  ) -> Option<String> {
    self
      .body
      .as_ref()
      .map(Value::to_string)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
  pub status: u16,
  pub body:   String
}

impl Response {
  pub fn new(
    status: u16,
    body: impl Into<String>
  ) -> Self {
    Self {
      status,
      body: body.into()
    }
  }

  pub fn json_body(
    status: u16,
    body: &Value
  ) -> Self {
    Self::new(status, body.to_string())
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Passes successful responses
  /// through and turns everything else
  /// into an [`ApiError`].
  pub fn check(
    self,
    request: &Request
  ) -> Result<Self, ApiError> {
    if self.is_success() {
      Ok(self)
    } else {
      Err(ApiError::from_response(
        request, &self
      ))
    }
  }

  pub fn json<T: DeserializeOwned>(
    &self
  ) -> Result<T, ApiError> {
    let text = if self.body.trim().is_empty()
    {
      "null"
    } else {
      self.body.as_str()
    };
    serde_json::from_str(text).map_err(
      |err| ApiError::Decode(err.to_string())
    )
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
  #[error("{message} (code {code}, status {status})")]
  Postgrest {
    status:  u16,
    code:    String,
    message: String,
    details: Option<String>,
    hint:    Option<String>
  },
  #[error("auth error (status {status}): {message}")]
  Auth {
    status:  u16,
    message: String
  },
  #[error("transport error: {0}")]
  Transport(String),
  #[error("could not decode response: {0}")]
  Decode(String),
  #[error("invalid request: {0}")]
  InvalidRequest(String)
}

impl ApiError {
  pub fn no_rows() -> Self {
    ApiError::Postgrest {
      status:  406,
      code:    NO_ROWS_CODE.to_string(),
      message: "JSON object requested, \
                multiple (or no) rows \
                returned"
        .to_string(),
      details: Some(
        "The result contains 0 rows"
          .to_string()
      ),
      hint:    None
    }
  }

  pub fn is_no_rows(&self) -> bool {
    matches!(
      self,
      ApiError::Postgrest { code, .. }
        if code == NO_ROWS_CODE
    )
  }

  pub fn from_response(
    request: &Request,
    response: &Response
  ) -> Self {
    let status = response.status;
    let parsed: Value =
      serde_json::from_str(&response.body)
        .unwrap_or(Value::Null);
    let text = |key: &str| {
      parsed
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
    };

    if request.table().is_none() {
      let message = text(
        "error_description"
      )
      .or_else(|| text("msg"))
      .or_else(|| text("message"))
      .or_else(|| text("error"))
      .unwrap_or_else(|| {
        fallback_message(response)
      });
      return ApiError::Auth {
        status,
        message
      };
    }

    ApiError::Postgrest {
      status,
      code: text("code").unwrap_or_else(
        || format!("HTTP{status}")
      ),
      message: text("message")
        .unwrap_or_else(|| {
          fallback_message(response)
        }),
      details: text("details"),
      hint: text("hint")
    }
  }
}

fn fallback_message(
  response: &Response
) -> String {
  let body = response.body.trim();
  if body.is_empty() {
    format!("HTTP {}", response.status)
  } else {
    body.to_string()
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
enum Action {
  Select,
  Insert,
  Upsert,
  Update,
  Delete
}

/// Fluent query over one table.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
  table:       String,
  action:      Action,
  columns:     String,
  filters:     Vec<(String, String)>,
  order:       Vec<String>,
  limit:       Option<usize>,
  single:      bool,
  on_conflict: Option<String>,
  body:        Option<Value>
}

pub fn from(
  table: impl Into<String>
) -> QueryBuilder {
  QueryBuilder {
    table:       table.into(),
    action:      Action::Select,
    columns:     "*".to_string(),
    filters:     Vec::new(),
    order:       Vec::new(),
    limit:       None,
    single:      false,
    on_conflict: None,
    body:        None
  }
}

impl QueryBuilder {
  pub fn select(
    mut self,
    columns: &str
  ) -> Self {
    self.action = Action::Select;
    self.columns = columns.to_string();
    self
  }

  pub fn insert<T: Serialize>(
    mut self,
    rows: &T
  ) -> Result<Self, ApiError> {
    self.action = Action::Insert;
    self.body = Some(to_body(rows)?);
    Ok(self)
  }

  /// Insert or merge on the
  /// comma-separated `on_conflict`
  /// columns.
  pub fn upsert<T: Serialize>(
    mut self,
    row: &T,
    on_conflict: &str
  ) -> Result<Self, ApiError> {
    self.action = Action::Upsert;
    self.on_conflict =
      Some(on_conflict.to_string());
    self.body = Some(to_body(row)?);
    Ok(self)
  }

  pub fn update<T: Serialize>(
    mut self,
    patch: &T
  ) -> Result<Self, ApiError> {
    self.action = Action::Update;
    self.body = Some(to_body(patch)?);
    Ok(self)
  }

  pub fn delete(mut self) -> Self {
    self.action = Action::Delete;
    self
  }

  pub fn eq(
    mut self,
    column: &str,
    value: impl ToString
  ) -> Self {
    self.filters.push((
      column.to_string(),
      format!("eq.{}", value.to_string())
    ));
    self
  }

  pub fn order(
    mut self,
    column: &str,
    ascending: bool
  ) -> Self {
    let dir =
      if ascending { "asc" } else { "desc" };
    self.order.push(format!("{column}.{dir}"));
    self
  }

  pub fn limit(mut self, n: usize) -> Self {
    self.limit = Some(n);
    self
  }

  /// Ask for exactly one object; zero
  /// rows become [`NO_ROWS_CODE`].
  pub fn single(mut self) -> Self {
    self.single = true;
    self
  }

  pub fn into_request(
    self,
    config: &ClientConfig,
    access_token: Option<&str>
  ) -> Request {
    let method = match self.action {
      | Action::Select => Method::Get,
      | Action::Insert
      | Action::Upsert => Method::Post,
      | Action::Update => Method::Patch,
      | Action::Delete => Method::Delete
    };

    let mut request = Request::new(
      method,
      format!("{REST_PREFIX}{}", self.table)
    );
    request.headers =
      config.base_headers(access_token);

    if self.action != Action::Delete {
      request.query.push((
        "select".to_string(),
        self.columns
      ));
    }
    if let Some(columns) = self.on_conflict
    {
      request.query.push((
        "on_conflict".to_string(),
        columns
      ));
    }
    request.query.extend(self.filters);
    if !self.order.is_empty() {
      request.query.push((
        "order".to_string(),
        self.order.join(",")
      ));
    }
    if let Some(limit) = self.limit {
      request.query.push((
        "limit".to_string(),
        limit.to_string()
      ));
    }

    let prefer = match self.action {
      | Action::Select => None,
      | Action::Insert
      | Action::Update => {
        Some("return=representation")
      }
      | Action::Upsert => Some(
        "resolution=merge-duplicates,\
         return=representation"
      ),
      | Action::Delete => {
        Some("return=minimal")
      }
    };
    if let Some(prefer) = prefer {
      request.headers.push((
        "Prefer".to_string(),
        prefer.to_string()
      ));
    }
    if self.body.is_some() {
      request.headers.push((
        "Content-Type".to_string(),
        "application/json".to_string()
      ));
    }
    request.headers.push((
      "Accept".to_string(),
      if self.single {
        OBJECT_ACCEPT.to_string()
      } else {
        "application/json".to_string()
      }
    ));
    request.body = self.body;
    request
  }
}

fn to_body<T: Serialize>(
  value: &T
) -> Result<Value, ApiError> {
  serde_json::to_value(value).map_err(
    |err| {
      ApiError::InvalidRequest(
        err.to_string()
      )
    }
  )
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn config() -> ClientConfig {
    ClientConfig::new(
      "https://demo.supabase.co/",
      "anon"
    )
  }

  #[test]
  fn select_builds_filters_and_order() {
    let request = from("goals")
      .select("*")
      .eq("user_id", "u1")
      .order("created_at", true)
      .limit(4)
      .into_request(&config(), Some("jwt"));

    assert_eq!(request.method, Method::Get);
    assert_eq!(request.table(), Some("goals"));
    assert_eq!(
      request.query,
      vec![
        ("select".to_string(), "*".to_string()),
        (
          "user_id".to_string(),
          "eq.u1".to_string()
        ),
        (
          "order".to_string(),
          "created_at.asc".to_string()
        ),
        ("limit".to_string(), "4".to_string()),
      ]
    );
    assert_eq!(
      request.header("authorization"),
      Some("Bearer jwt")
    );
    assert_eq!(
      request.header("apikey"),
      Some("anon")
    );
    assert!(!request.wants_object());

    let url = request
      .url(&config().url)
      .expect("valid url");
    assert_eq!(
      url.as_str(),
      "https://demo.supabase.co/rest/v1/goals?\
       select=*&user_id=eq.u1&order=created_at.asc&limit=4"
    );
  }

  #[test]
  fn upsert_merges_on_conflict_columns() {
    let request = from("weekly_checkins")
      .upsert(
        &json!({ "week_of": "2026-02-23" }),
        "user_id,week_of"
      )
      .expect("serializable")
      .single()
      .into_request(&config(), None);

    assert_eq!(request.method, Method::Post);
    assert_eq!(
      request.query_value("on_conflict"),
      Some("user_id,week_of")
    );
    assert!(
      request
        .prefers("resolution=merge-duplicates")
    );
    assert!(
      request.prefers("return=representation")
    );
    assert!(request.wants_object());
    assert_eq!(
      request.header("Authorization"),
      Some("Bearer anon")
    );
  }

  #[test]
  fn delete_sends_no_select() {
    let request = from("goals")
      .delete()
      .eq("id", 7)
      .into_request(&config(), None);
    assert_eq!(
      request.method,
      Method::Delete
    );
    assert_eq!(
      request.query_value("select"),
      None
    );
    assert_eq!(
      request.query_value("id"),
      Some("eq.7")
    );
    assert!(request.prefers("return=minimal"));
  }

  #[test]
  fn error_bodies_decode_by_surface() {
    let data = from("user_settings")
      .single()
      .into_request(&config(), None);
    let err = ApiError::from_response(
      &data,
      &Response::new(
        406,
        r#"{"code":"PGRST116","message":"no rows","details":null,"hint":null}"#
      )
    );
    assert!(err.is_no_rows());

    let auth = Request::new(
      Method::Post,
      "/auth/v1/otp"
    );
    let err = ApiError::from_response(
      &auth,
      &Response::new(
        429,
        r#"{"msg":"Email rate limit exceeded"}"#
      )
    );
    assert_eq!(
      err,
      ApiError::Auth {
        status:  429,
        message: "Email rate limit exceeded"
          .to_string()
      }
    );

    let err = ApiError::from_response(
      &data,
      &Response::new(502, "")
    );
    assert!(!err.is_no_rows());
    assert!(
      err.to_string().contains("HTTP 502")
    );
  }

  #[test]
  fn empty_body_decodes_as_null() {
    let value: Option<Value> =
      Response::new(204, "")
        .json()
        .expect("null body");
    assert_eq!(value, None);
  }
}
