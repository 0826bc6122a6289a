//! Browser transport for the shared
//! request builders.

use b2i_shared::auth::{
  self,
  Session,
  TokenResponse
};
use b2i_shared::model::User;
use b2i_shared::postgrest::{
  self,
  ApiError,
  ClientConfig,
  Method,
  QueryBuilder,
  Request,
  Response
};
use chrono::Utc;
use gloo::net::http::{
  Method as HttpMethod,
  RequestBuilder
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Project url and anon key baked in at
/// build time.
pub fn client_config() -> ClientConfig {
  ClientConfig::new(
    option_env!("B2I_SUPABASE_URL")
      .unwrap_or_default(),
    option_env!("B2I_SUPABASE_ANON_KEY")
      .unwrap_or_default()
  )
}

fn http_method(
  method: Method
) -> HttpMethod {
  match method {
    | Method::Get => HttpMethod::GET,
    | Method::Post => HttpMethod::POST,
    | Method::Patch => HttpMethod::PATCH,
    | Method::Delete => HttpMethod::DELETE
  }
}

/// Sends `request` with `fetch` and
/// returns the raw response, whatever
/// its status.
pub async fn execute(
  config: &ClientConfig,
  request: &Request
) -> Result<Response, ApiError> {
  let url = request.url(&config.url)?;
  let mut builder =
    RequestBuilder::new(url.as_str())
      .method(http_method(request.method));
  for (name, value) in &request.headers {
    builder = builder.header(name, value);
  }

  let outgoing = match request.body_text() {
    | Some(body) => builder.body(body),
    | None => builder.build()
  }
  .map_err(|err| {
    ApiError::Transport(err.to_string())
  })?;

  let incoming =
    outgoing.send().await.map_err(|err| {
      ApiError::Transport(err.to_string())
    })?;
  let status = incoming.status();
  let body =
    incoming.text().await.map_err(|err| {
      ApiError::Transport(err.to_string())
    })?;
  Ok(Response::new(status, body))
}

/// Data access for the signed-in user.
#[derive(Clone, PartialEq)]
pub struct Api {
  config:       ClientConfig,
  access_token: Option<String>
}

impl Api {
  pub fn new(
    config: ClientConfig,
    access_token: Option<String>
  ) -> Self {
    Self {
      config,
      access_token
    }
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub fn from(
    &self,
    table: &str
  ) -> QueryBuilder {
    postgrest::from(table)
  }

  async fn send(
    &self,
    query: QueryBuilder
  ) -> Result<Response, ApiError> {
    let request = query.into_request(
      &self.config,
      self.access_token.as_deref()
    );
    tracing::debug!(
      method = request.method.as_str(),
      path = %request.path,
      "sending request"
    );
    execute(&self.config, &request)
      .await?
      .check(&request)
  }

  pub async fn fetch<T: DeserializeOwned>(
    &self,
    query: QueryBuilder
  ) -> Result<Vec<T>, ApiError> {
    let rows: Option<Vec<T>> =
      self.send(query).await?.json()?;
    Ok(rows.unwrap_or_default())
  }

  pub async fn fetch_single<
    T: DeserializeOwned
  >(
    &self,
    query: QueryBuilder
  ) -> Result<T, ApiError> {
    self.send(query.single()).await?.json()
  }

  pub async fn fetch_maybe_single<
    T: DeserializeOwned
  >(
    &self,
    query: QueryBuilder
  ) -> Result<Option<T>, ApiError> {
    let rows: Vec<T> =
      self.fetch(query.limit(1)).await?;
    Ok(rows.into_iter().next())
  }

  pub async fn insert_one<T, R>(
    &self,
    table: &str,
    row: &T
  ) -> Result<R, ApiError>
  where
    T: Serialize,
    R: DeserializeOwned
  {
    let query =
      self.from(table).insert(row)?;
    self.fetch_single(query).await
  }

  pub async fn insert_many<T, R>(
    &self,
    table: &str,
    rows: &[T]
  ) -> Result<Vec<R>, ApiError>
  where
    T: Serialize,
    R: DeserializeOwned
  {
    let query =
      self.from(table).insert(&rows)?;
    self.fetch(query).await
  }

  pub async fn upsert_one<T, R>(
    &self,
    table: &str,
    row: &T,
    on_conflict: &str
  ) -> Result<R, ApiError>
  where
    T: Serialize,
    R: DeserializeOwned
  {
    let query = self
      .from(table)
      .upsert(row, on_conflict)?;
    self.fetch_single(query).await
  }

  pub async fn update<T: Serialize>(
    &self,
    table: &str,
    patch: &T,
    column: &str,
    value: impl ToString
  ) -> Result<(), ApiError> {
    let query = self
      .from(table)
      .update(patch)?
      .eq(column, value);
    self.send(query).await?;
    Ok(())
  }

  pub async fn delete(
    &self,
    table: &str,
    column: &str,
    value: impl ToString
  ) -> Result<(), ApiError> {
    let query = self
      .from(table)
      .delete()
      .eq(column, value);
    self.send(query).await?;
    Ok(())
  }
}

/// Magic-link calls made from the
/// browser.
pub mod gotrue {
  use super::*;

  async fn send(
    config: &ClientConfig,
    request: Request
  ) -> Result<Response, ApiError> {
    execute(config, &request)
      .await?
      .check(&request)
  }

  pub async fn send_magic_link(
    config: &ClientConfig,
    email: &str,
    redirect_to: &str
  ) -> Result<(), ApiError> {
    let request = auth::magic_link_request(
      config,
      email,
      Some(redirect_to)
    )?;
    send(config, request).await?;
    Ok(())
  }

  pub async fn refresh(
    config: &ClientConfig,
    session: &Session
  ) -> Result<Session, ApiError> {
    let request = auth::refresh_request(
      config,
      &session.refresh_token
    );
    let tokens: TokenResponse =
      send(config, request).await?.json()?;
    Ok(Session::from_token_response(
      tokens,
      Utc::now()
    ))
  }

  pub async fn fetch_user(
    config: &ClientConfig,
    access_token: &str
  ) -> Result<User, ApiError> {
    let request =
      auth::user_request(config, access_token);
    send(config, request).await?.json()
  }

  pub async fn sign_out(
    config: &ClientConfig,
    session: &Session
  ) -> Result<(), ApiError> {
    let request = auth::logout_request(
      config,
      &session.access_token
    );
    send(config, request).await?;
    Ok(())
  }
}
