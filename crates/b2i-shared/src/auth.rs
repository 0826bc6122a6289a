//! Magic-link authentication requests and
//! the session they produce.

use std::sync::OnceLock;

use chrono::{
  DateTime,
  Duration,
  Utc
};
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};
use serde_json::json;
use url::Url;

use crate::model::User;
use crate::postgrest::{
  ApiError,
  ClientConfig,
  Method,
  Request
};

pub const OTP_PATH: &str = "/auth/v1/otp";
pub const VERIFY_PATH: &str =
  "/auth/v1/verify";
pub const TOKEN_PATH: &str =
  "/auth/v1/token";
pub const USER_PATH: &str = "/auth/v1/user";
pub const LOGOUT_PATH: &str =
  "/auth/v1/logout";

/// Sessions are treated as expired this
/// many seconds before the server says.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

fn email_regex() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    )
    .ok()
  })
  .as_ref()
}

pub fn validate_email(
  email: &str
) -> Result<String, ApiError> {
  let email = email.trim();
  if email_regex()
    .is_some_and(|re| re.is_match(email))
  {
    Ok(email.to_ascii_lowercase())
  } else {
    Err(ApiError::InvalidRequest(format!(
      "not an email address: {email:?}"
    )))
  }
}

fn auth_request(
  config: &ClientConfig,
  method: Method,
  path: &str,
  access_token: Option<&str>
) -> Request {
  let mut request =
    Request::new(method, path);
  request.headers =
    config.base_headers(access_token);
  request.headers.push((
    "Content-Type".to_string(),
    "application/json".to_string()
  ));
  request
}

/// Sends a sign-in link to `email`,
/// creating the account on first use.
pub fn magic_link_request(
  config: &ClientConfig,
  email: &str,
  redirect_to: Option<&str>
) -> Result<Request, ApiError> {
  let email = validate_email(email)?;
  let mut request = auth_request(
    config,
    Method::Post,
    OTP_PATH,
    None
  );
  if let Some(redirect) = redirect_to
    .map(str::trim)
    .filter(|value| !value.is_empty())
  {
    request.query.push((
      "redirect_to".to_string(),
      redirect.to_string()
    ));
  }
  request.body = Some(json!({
    "email": email,
    "create_user": true
  }));
  Ok(request)
}

/// Exchanges the code from the sign-in
/// email for a session.
pub fn verify_request(
  config: &ClientConfig,
  email: &str,
  token: &str
) -> Result<Request, ApiError> {
  let email = validate_email(email)?;
  let mut request = auth_request(
    config,
    Method::Post,
    VERIFY_PATH,
    None
  );
  request.body = Some(json!({
    "type": "email",
    "email": email,
    "token": token.trim()
  }));
  Ok(request)
}

pub fn refresh_request(
  config: &ClientConfig,
  refresh_token: &str
) -> Request {
  let mut request = auth_request(
    config,
    Method::Post,
    TOKEN_PATH,
    None
  );
  request.query.push((
    "grant_type".to_string(),
    "refresh_token".to_string()
  ));
  request.body = Some(json!({
    "refresh_token": refresh_token
  }));
  request
}

pub fn user_request(
  config: &ClientConfig,
  access_token: &str
) -> Request {
  auth_request(
    config,
    Method::Get,
    USER_PATH,
    Some(access_token)
  )
}

pub fn logout_request(
  config: &ClientConfig,
  access_token: &str
) -> Request {
  auth_request(
    config,
    Method::Post,
    LOGOUT_PATH,
    Some(access_token)
  )
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
  pub access_token:  String,
  pub refresh_token: String,
  pub expires_in:    i64,
  #[serde(default)]
  pub expires_at:    Option<i64>,
  pub user:          User
}

/// Tokens carried in the fragment of a
/// magic-link redirect.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
)]
pub struct RedirectTokens {
  pub access_token:  String,
  pub refresh_token: String,
  pub expires_in:    i64
}

/// Reads the fragment of the URL the
/// sign-in link redirected to. `Ok(None)`
/// when it carries no tokens.
pub fn parse_redirect(
  raw: &str
) -> Result<Option<RedirectTokens>, ApiError>
{
  let url = Url::parse(raw.trim())
    .map_err(|err| {
      ApiError::InvalidRequest(format!(
        "bad redirect url: {err}"
      ))
    })?;
  let Some(fragment) = url.fragment()
  else {
    return Ok(None);
  };

  let mut access_token = None;
  let mut refresh_token = None;
  let mut expires_in = 3600;
  let mut error = None;
  for (key, value) in
    url::form_urlencoded::parse(
      fragment.as_bytes()
    )
  {
    match key.as_ref() {
      | "access_token" => {
        access_token =
          Some(value.into_owned())
      }
      | "refresh_token" => {
        refresh_token =
          Some(value.into_owned())
      }
      | "expires_in" => {
        expires_in = value
          .parse()
          .unwrap_or(expires_in)
      }
      | "error_description" => {
        error = Some(value.into_owned())
      }
      | _ => {}
    }
  }

  if let Some(message) = error {
    return Err(ApiError::Auth {
      status: 401,
      message
    });
  }

  Ok(access_token.zip(refresh_token).map(
    |(access_token, refresh_token)| {
      RedirectTokens {
        access_token,
        refresh_token,
        expires_in
      }
    }
  ))
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Session {
  pub access_token:  String,
  pub refresh_token: String,
  pub expires_at:    DateTime<Utc>,
  pub user:          User
}

impl Session {
  pub fn from_token_response(
    response: TokenResponse,
    now: DateTime<Utc>
  ) -> Self {
    let expires_at = response
      .expires_at
      .and_then(|secs| {
        DateTime::from_timestamp(secs, 0)
      })
      .unwrap_or_else(|| {
        now
          + Duration::seconds(
            response.expires_in
          )
      });
    Self {
      access_token: response.access_token,
      refresh_token: response
        .refresh_token,
      expires_at,
      user: response.user
    }
  }

  pub fn from_redirect(
    tokens: RedirectTokens,
    user: User,
    now: DateTime<Utc>
  ) -> Self {
    Self {
      access_token: tokens.access_token,
      refresh_token: tokens.refresh_token,
      expires_at: now
        + Duration::seconds(
          tokens.expires_in
        ),
      user
    }
  }

  pub fn is_expired(
    &self,
    now: DateTime<Utc>
  ) -> bool {
    now
      + Duration::seconds(
        EXPIRY_MARGIN_SECS
      )
      >= self.expires_at
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use pretty_assertions::assert_eq;
  use uuid::Uuid;

  use super::*;

  fn config() -> ClientConfig {
    ClientConfig::new(
      "https://demo.supabase.co",
      "anon"
    )
  }

  #[test]
  fn emails_are_validated() {
    assert_eq!(
      validate_email(" Me@Example.com ")
        .expect("valid"),
      "me@example.com"
    );
    assert!(validate_email("nope").is_err());
    assert!(
      validate_email("a b@c.io").is_err()
    );
  }

  #[test]
  fn magic_link_carries_redirect() {
    let request = magic_link_request(
      &config(),
      "me@example.com",
      Some("https://app.example/")
    )
    .expect("request");
    assert_eq!(request.path, OTP_PATH);
    assert_eq!(
      request.query_value("redirect_to"),
      Some("https://app.example/")
    );
    assert_eq!(
      request.body,
      Some(json!({
        "email": "me@example.com",
        "create_user": true
      }))
    );
    assert!(
      magic_link_request(
        &config(),
        "",
        None
      )
      .is_err()
    );
  }

  #[test]
  fn refresh_uses_grant_type() {
    let request =
      refresh_request(&config(), "r1");
    assert_eq!(
      request.query_value("grant_type"),
      Some("refresh_token")
    );
    assert_eq!(
      user_request(&config(), "jwt")
        .header("Authorization"),
      Some("Bearer jwt")
    );
  }

  #[test]
  fn redirect_fragment_parses() {
    let tokens = parse_redirect(
      "https://app.example/#access_token=a1&expires_in=60&refresh_token=r1&token_type=bearer&type=magiclink"
    )
    .expect("parse")
    .expect("tokens");
    assert_eq!(
      tokens,
      RedirectTokens {
        access_token:  "a1".to_string(),
        refresh_token: "r1".to_string(),
        expires_in:    60
      }
    );

    assert_eq!(
      parse_redirect("https://app.example/")
        .expect("parse"),
      None
    );

    let err = parse_redirect(
      "https://app.example/#error=access_denied&error_description=Email+link+is+invalid+or+has+expired"
    )
    .expect_err("redirect error");
    assert_eq!(
      err,
      ApiError::Auth {
        status:  401,
        message: "Email link is invalid or \
                  has expired"
          .to_string()
      }
    );
  }

  #[test]
  fn sessions_expire_a_minute_early() {
    let now = Utc
      .with_ymd_and_hms(2026, 2, 27, 9, 0, 0)
      .single()
      .expect("valid timestamp");
    let session = Session::from_redirect(
      RedirectTokens {
        access_token:  "a".to_string(),
        refresh_token: "r".to_string(),
        expires_in:    3600
      },
      User {
        id:    Uuid::from_u128(1),
        email: None
      },
      now
    );
    assert!(!session.is_expired(now));
    assert!(session.is_expired(
      now + Duration::seconds(3540)
    ));
    assert!(!session.is_expired(
      now + Duration::seconds(3539)
    ));
  }
}
