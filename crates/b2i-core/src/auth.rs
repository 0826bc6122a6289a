use std::fs;
use std::io::Write;
use std::path::{
  Path,
  PathBuf
};
use std::sync::Arc;

use anyhow::{
  Context,
  anyhow
};
use b2i_shared::auth::{
  self,
  Session,
  TokenResponse
};
use b2i_shared::model::User;
use b2i_shared::postgrest::{
  ApiError,
  ClientConfig,
  Request,
  Response
};
use chrono::{
  DateTime,
  Utc
};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{
  debug,
  info,
  warn
};
use uuid::Uuid;

use crate::backend::Backend;

pub const SESSION_FILE: &str =
  "session.json";
pub const LOCAL_USER_FILE: &str =
  "user.json";

/// Magic-link sign-in against the hosted
/// auth service.
#[derive(Clone)]
pub struct AuthClient {
  backend:      Arc<dyn Backend>,
  config:       ClientConfig,
  redirect_url: Option<String>
}

impl AuthClient {
  pub fn new(
    backend: Arc<dyn Backend>,
    config: ClientConfig,
    redirect_url: Option<String>
  ) -> Self {
    Self {
      backend,
      config,
      redirect_url
    }
  }

  fn send(
    &self,
    request: &Request
  ) -> Result<Response, ApiError> {
    self
      .backend
      .execute(request)?
      .check(request)
  }

  #[tracing::instrument(skip(self))]
  pub fn send_magic_link(
    &self,
    email: &str
  ) -> anyhow::Result<()> {
    let request = auth::magic_link_request(
      &self.config,
      email,
      self.redirect_url.as_deref()
    )?;
    self.send(&request).context(
      "failed sending the sign-in link"
    )?;
    info!("magic link sent");
    Ok(())
  }

  #[tracing::instrument(skip(self, code, now))]
  pub fn verify_code(
    &self,
    email: &str,
    code: &str,
    now: DateTime<Utc>
  ) -> anyhow::Result<Session> {
    let request = auth::verify_request(
      &self.config,
      email,
      code
    )?;
    let tokens: TokenResponse = self
      .send(&request)
      .context("failed verifying the sign-in code")?
      .json()?;
    let session =
      Session::from_token_response(tokens, now);
    info!(user = %session.user.id, "signed in with code");
    Ok(session)
  }

  /// Finishes sign-in from the URL the
  /// magic link redirected to.
  #[tracing::instrument(skip(self, url, now))]
  pub fn complete_redirect(
    &self,
    url: &str,
    now: DateTime<Utc>
  ) -> anyhow::Result<Session> {
    let tokens = auth::parse_redirect(url)?
      .ok_or_else(|| {
        anyhow!(
          "the URL carries no sign-in \
           tokens"
        )
      })?;
    let user =
      self.fetch_user(&tokens.access_token)?;
    let session =
      Session::from_redirect(tokens, user, now);
    info!(user = %session.user.id, "signed in from redirect");
    Ok(session)
  }

  #[tracing::instrument(skip(self, session, now), fields(user = %session.user.id))]
  pub fn refresh(
    &self,
    session: &Session,
    now: DateTime<Utc>
  ) -> anyhow::Result<Session> {
    let request = auth::refresh_request(
      &self.config,
      &session.refresh_token
    );
    let tokens: TokenResponse = self
      .send(&request)
      .context("failed refreshing the session")?
      .json()?;
    debug!("session refreshed");
    Ok(Session::from_token_response(tokens, now))
  }

  pub fn fetch_user(
    &self,
    access_token: &str
  ) -> anyhow::Result<User> {
    let request =
      auth::user_request(&self.config, access_token);
    let user = self
      .send(&request)
      .context("failed fetching the signed-in user")?
      .json()?;
    Ok(user)
  }

  #[tracing::instrument(skip(self, session), fields(user = %session.user.id))]
  pub fn sign_out(
    &self,
    session: &Session
  ) -> anyhow::Result<()> {
    let request = auth::logout_request(
      &self.config,
      &session.access_token
    );
    self
      .send(&request)
      .context("failed signing out")?;
    Ok(())
  }
}

/// The persisted session, one JSON
/// document in the data directory.
#[derive(Debug, Clone)]
pub struct SessionFile {
  path: PathBuf
}

impl SessionFile {
  pub fn in_dir(data_dir: &Path) -> Self {
    Self {
      path: data_dir.join(SESSION_FILE)
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn load(
    &self
  ) -> anyhow::Result<Option<Session>> {
    if !self.path.exists() {
      return Ok(None);
    }
    let text = fs::read_to_string(&self.path)
      .with_context(|| {
        format!(
          "failed reading {}",
          self.path.display()
        )
      })?;
    let session =
      serde_json::from_str(&text).with_context(
        || {
          format!(
            "failed parsing {}",
            self.path.display()
          )
        }
      )?;
    Ok(Some(session))
  }

  #[tracing::instrument(skip(self, session))]
  pub fn save(
    &self,
    session: &Session
  ) -> anyhow::Result<()> {
    write_json_atomic(&self.path, session)
  }

  pub fn clear(&self) -> anyhow::Result<()> {
    if self.path.exists() {
      fs::remove_file(&self.path).with_context(
        || {
          format!(
            "failed removing {}",
            self.path.display()
          )
        }
      )?;
    }
    Ok(())
  }
}

/// Loads the saved session and refreshes
/// it when expired. A failed refresh
/// drops the session.
#[tracing::instrument(skip_all)]
pub fn restore_session(
  client: &AuthClient,
  file: &SessionFile,
  now: DateTime<Utc>
) -> anyhow::Result<Option<Session>> {
  let Some(session) = file.load()? else {
    debug!("no saved session");
    return Ok(None);
  };
  if !session.is_expired(now) {
    return Ok(Some(session));
  }

  match client.refresh(&session, now) {
    | Ok(fresh) => {
      file.save(&fresh)?;
      Ok(Some(fresh))
    }
    | Err(err) => {
      warn!(
        user = %session.user.id,
        error = %format!("{err:#}"),
        "session refresh failed; signing out"
      );
      file.clear()?;
      Ok(None)
    }
  }
}

/// Stable user for local mode, created on
/// first use.
#[tracing::instrument(skip(local_dir))]
pub fn local_user(
  local_dir: &Path
) -> anyhow::Result<User> {
  let path = local_dir.join(LOCAL_USER_FILE);
  if path.exists() {
    let text =
      fs::read_to_string(&path).with_context(|| {
        format!("failed reading {}", path.display())
      })?;
    return serde_json::from_str(&text).with_context(
      || format!("failed parsing {}", path.display())
    );
  }

  fs::create_dir_all(local_dir).with_context(|| {
    format!("failed to create {}", local_dir.display())
  })?;
  let user = User {
    id:    Uuid::new_v4(),
    email: None
  };
  write_json_atomic(&path, &user)?;
  info!(user = %user.id, "created local user");
  Ok(user)
}

fn write_json_atomic<T: Serialize>(
  path: &Path,
  value: &T
) -> anyhow::Result<()> {
  let dir = path
    .parent()
    .unwrap_or_else(|| Path::new("."));
  let mut temp = NamedTempFile::new_in(dir)?;
  serde_json::to_writer_pretty(&mut temp, value)?;
  writeln!(temp)?;
  temp.flush()?;
  temp.persist(path).map_err(|err| {
    anyhow!(
      "failed to persist {}: {}",
      path.display(),
      err
    )
  })?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use parking_lot::Mutex;
  use serde_json::json;
  use tempfile::tempdir;

  use super::*;

  /// Replays canned responses and
  /// records the paths it saw.
  #[derive(Default)]
  struct Scripted {
    responses: Mutex<Vec<Response>>,
    seen:      Mutex<Vec<String>>
  }

  impl Scripted {
    fn new(responses: Vec<Response>) -> Arc<Self> {
      Arc::new(Self {
        responses: Mutex::new(responses),
        seen:      Mutex::new(vec![])
      })
    }
  }

  impl Backend for Scripted {
    fn execute(
      &self,
      request: &Request
    ) -> Result<Response, ApiError> {
      self.seen.lock().push(request.path.clone());
      let mut responses = self.responses.lock();
      if responses.is_empty() {
        return Err(ApiError::Transport(
          "no scripted response".to_string()
        ));
      }
      Ok(responses.remove(0))
    }
  }

  fn config() -> ClientConfig {
    ClientConfig::new("https://demo.supabase.co", "anon")
  }

  fn token_body(access: &str) -> String {
    json!({
      "access_token": access,
      "refresh_token": "r2",
      "expires_in": 3600,
      "token_type": "bearer",
      "user": {
        "id": "7f4f8d5e-3c1a-4f8e-9b7a-2d9e1c0b6a11",
        "email": "me@example.com",
        "aud": "authenticated"
      }
    })
    .to_string()
  }

  fn expired_session(now: DateTime<Utc>) -> Session {
    Session {
      access_token:  "old".to_string(),
      refresh_token: "r1".to_string(),
      expires_at:    now - Duration::seconds(5),
      user:          User {
        id:    Uuid::from_u128(1),
        email: None
      }
    }
  }

  #[test]
  fn verify_code_builds_session() {
    let backend =
      Scripted::new(vec![Response::new(200, token_body("a1"))]);
    let client = AuthClient::new(backend.clone(), config(), None);
    let now = Utc::now();

    let session = client
      .verify_code("me@example.com", "123456", now)
      .expect("session");
    assert_eq!(session.access_token, "a1");
    assert_eq!(
      session.user.email.as_deref(),
      Some("me@example.com")
    );
    assert!(!session.is_expired(now));
    assert_eq!(
      backend.seen.lock().clone(),
      vec![auth::VERIFY_PATH.to_string()]
    );
  }

  #[test]
  fn expired_session_is_refreshed_and_saved() {
    let temp = tempdir().expect("tempdir");
    let file = SessionFile::in_dir(temp.path());
    let now = Utc::now();
    file.save(&expired_session(now)).expect("save");

    let backend =
      Scripted::new(vec![Response::new(200, token_body("fresh"))]);
    let client = AuthClient::new(backend, config(), None);
    let restored = restore_session(&client, &file, now)
      .expect("restore")
      .expect("session");
    assert_eq!(restored.access_token, "fresh");
    assert_eq!(
      file.load().expect("load").map(|s| s.access_token),
      Some("fresh".to_string())
    );
  }

  #[test]
  fn failed_refresh_signs_out() {
    let temp = tempdir().expect("tempdir");
    let file = SessionFile::in_dir(temp.path());
    let now = Utc::now();
    file.save(&expired_session(now)).expect("save");

    let backend = Scripted::new(vec![Response::new(
      400,
      r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#
    )]);
    let client = AuthClient::new(backend, config(), None);
    assert_eq!(
      restore_session(&client, &file, now).expect("restore"),
      None
    );
    assert!(!file.path().exists());
  }

  #[test]
  fn redirect_fetches_user() {
    let backend = Scripted::new(vec![Response::new(
      200,
      r#"{"id":"7f4f8d5e-3c1a-4f8e-9b7a-2d9e1c0b6a11","email":"me@example.com"}"#
    )]);
    let client = AuthClient::new(backend.clone(), config(), None);
    let session = client
      .complete_redirect(
        "http://localhost:3000/#access_token=a&refresh_token=r&expires_in=3600",
        Utc::now()
      )
      .expect("session");
    assert_eq!(session.refresh_token, "r");
    assert_eq!(
      backend.seen.lock().clone(),
      vec![auth::USER_PATH.to_string()]
    );
  }

  #[test]
  fn local_user_is_stable() {
    let temp = tempdir().expect("tempdir");
    let first = local_user(temp.path()).expect("create");
    let second = local_user(temp.path()).expect("reload");
    assert_eq!(first, second);
  }
}
