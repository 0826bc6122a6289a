pub mod local;
pub mod memory;
pub mod rest;

use std::sync::Arc;

use anyhow::Context;
use b2i_shared::postgrest::{
  self,
  ApiError,
  ClientConfig,
  QueryBuilder,
  Request,
  Response
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// Something that can execute a data or
/// auth request.
pub trait Backend: Send + Sync {
  fn execute(
    &self,
    request: &Request
  ) -> Result<Response, ApiError>;
}

/// Typed helpers over a backend, bound to
/// the signed-in user's access token.
#[derive(Clone)]
pub struct Client {
  backend:      Arc<dyn Backend>,
  config:       ClientConfig,
  access_token: Option<String>
}

impl std::fmt::Debug for Client {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("Client")
      .field("url", &self.config.url)
      .field(
        "signed_in",
        &self.access_token.is_some()
      )
      .finish()
  }
}

impl Client {
  pub fn new(
    backend: Arc<dyn Backend>,
    config: ClientConfig,
    access_token: Option<String>
  ) -> Self {
    Self {
      backend,
      config,
      access_token
    }
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub fn backend(&self) -> Arc<dyn Backend> {
    Arc::clone(&self.backend)
  }

  pub fn from(
    &self,
    table: &str
  ) -> QueryBuilder {
    postgrest::from(table)
  }

  /// Runs a raw request and fails on any
  /// non-2xx status.
  pub fn send_request(
    &self,
    request: &Request
  ) -> Result<Response, ApiError> {
    debug!(
      method = request.method.as_str(),
      path = %request.path,
      query = ?request.query,
      "executing request"
    );
    self
      .backend
      .execute(request)?
      .check(request)
  }

  fn send(
    &self,
    query: QueryBuilder
  ) -> Result<Response, ApiError> {
    let request = query.into_request(
      &self.config,
      self.access_token.as_deref()
    );
    self.send_request(&request)
  }

  pub fn fetch<T: DeserializeOwned>(
    &self,
    query: QueryBuilder
  ) -> anyhow::Result<Vec<T>> {
    let rows: Option<Vec<T>> = self
      .send(query)?
      .json()
      .context("failed decoding rows")?;
    Ok(rows.unwrap_or_default())
  }

  /// Exactly one row; zero rows is an
  /// `ApiError` whose `is_no_rows` holds.
  pub fn fetch_single<T: DeserializeOwned>(
    &self,
    query: QueryBuilder
  ) -> anyhow::Result<T> {
    let row = self
      .send(query.single())?
      .json()
      .context("failed decoding row")?;
    Ok(row)
  }

  /// At most one row, fetched as a list.
  pub fn fetch_maybe_single<
    T: DeserializeOwned
  >(
    &self,
    query: QueryBuilder
  ) -> anyhow::Result<Option<T>> {
    let rows: Vec<T> =
      self.fetch(query.limit(1))?;
    Ok(rows.into_iter().next())
  }

  pub fn insert_one<T, R>(
    &self,
    table: &str,
    row: &T
  ) -> anyhow::Result<R>
  where
    T: Serialize,
    R: DeserializeOwned
  {
    let query =
      self.from(table).insert(row)?;
    self.fetch_single(query)
  }

  pub fn insert_many<T, R>(
    &self,
    table: &str,
    rows: &[T]
  ) -> anyhow::Result<Vec<R>>
  where
    T: Serialize,
    R: DeserializeOwned
  {
    let query =
      self.from(table).insert(&rows)?;
    self.fetch(query)
  }

  pub fn upsert_one<T, R>(
    &self,
    table: &str,
    row: &T,
    on_conflict: &str
  ) -> anyhow::Result<R>
  where
    T: Serialize,
    R: DeserializeOwned
  {
    let query = self
      .from(table)
      .upsert(row, on_conflict)?;
    self.fetch_single(query)
  }

  /// Patches the rows where `column`
  /// equals `value`.
  pub fn update<T: Serialize>(
    &self,
    table: &str,
    patch: &T,
    column: &str,
    value: impl ToString
  ) -> anyhow::Result<()> {
    let query = self
      .from(table)
      .update(patch)?
      .eq(column, value);
    self.execute(query)
  }

  pub fn delete(
    &self,
    table: &str,
    column: &str,
    value: impl ToString
  ) -> anyhow::Result<()> {
    let query = self
      .from(table)
      .delete()
      .eq(column, value);
    self.execute(query)
  }

  /// Runs an update or delete built by
  /// the caller; the response body is
  /// discarded.
  pub fn execute(
    &self,
    query: QueryBuilder
  ) -> anyhow::Result<()> {
    self.send(query)?;
    Ok(())
  }
}

/// `true` when `err` wraps an
/// [`ApiError`] reporting no rows.
pub fn is_no_rows(
  err: &anyhow::Error
) -> bool {
  err
    .downcast_ref::<ApiError>()
    .is_some_and(ApiError::is_no_rows)
}
