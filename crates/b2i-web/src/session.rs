use b2i_shared::auth::{
  self,
  Session
};
use b2i_shared::model::User;
use b2i_shared::postgrest::{
  ApiError,
  ClientConfig
};
use chrono::Utc;
use wasm_bindgen::JsValue;
use yew::{
  Callback,
  Children,
  ContextProvider,
  Html,
  Properties,
  function_component,
  hook,
  html,
  use_context,
  use_effect_with,
  use_state
};

use crate::api::{
  self,
  Api,
  gotrue
};

const SESSION_STORAGE_KEY: &str =
  "b2i.session";

fn local_storage() -> Option<web_sys::Storage> {
  web_sys::window().and_then(|window| {
    window.local_storage().ok().flatten()
  })
}

fn load_session() -> Option<Session> {
  let raw = local_storage().and_then(
    |storage| {
      storage
        .get_item(SESSION_STORAGE_KEY)
        .ok()
        .flatten()
    }
  )?;
  match serde_json::from_str(&raw) {
    | Ok(session) => Some(session),
    | Err(err) => {
      tracing::warn!(
        error = %err,
        "discarding unreadable stored \
         session"
      );
      None
    }
  }
}

fn store_session(session: Option<&Session>) {
  let Some(storage) = local_storage() else {
    return;
  };
  let result = match session {
    | Some(session) => {
      match serde_json::to_string(session) {
        | Ok(raw) => storage.set_item(
          SESSION_STORAGE_KEY,
          &raw
        ),
        | Err(err) => {
          tracing::error!(
            error = %err,
            "failed encoding session"
          );
          return;
        }
      }
    }
    | None => {
      storage.remove_item(SESSION_STORAGE_KEY)
    }
  };
  if let Err(err) = result {
    tracing::warn!(
      ?err,
      "failed writing session to local \
       storage"
    );
  }
}

fn current_href() -> Option<String> {
  web_sys::window()
    .and_then(|window| {
      window.location().href().ok()
    })
}

/// Drops the token fragment from the
/// address bar.
fn clear_fragment() {
  let Some(window) = web_sys::window()
  else {
    return;
  };
  let path = window
    .location()
    .pathname()
    .unwrap_or_else(|_| "/".to_string());
  if let Ok(history) = window.history() {
    let _ = history.replace_state_with_url(
      &JsValue::NULL,
      "",
      Some(&path)
    );
  }
}

async fn complete_redirect(
  config: &ClientConfig
) -> Result<Option<Session>, ApiError> {
  let Some(href) = current_href() else {
    return Ok(None);
  };
  let Some(tokens) =
    auth::parse_redirect(&href)?
  else {
    return Ok(None);
  };
  clear_fragment();
  let user = gotrue::fetch_user(
    config,
    &tokens.access_token
  )
  .await?;
  tracing::info!(
    user = %user.id,
    "signed in from redirect"
  );
  Ok(Some(Session::from_redirect(
    tokens,
    user,
    Utc::now()
  )))
}

/// Redirect tokens first, then the
/// stored session, refreshed when it has
/// expired.
async fn restore(
  config: &ClientConfig
) -> Option<Session> {
  match complete_redirect(config).await {
    | Ok(Some(session)) => {
      store_session(Some(&session));
      return Some(session);
    }
    | Ok(None) => {}
    | Err(err) => {
      tracing::error!(
        error = %err,
        "failed completing sign-in \
         redirect"
      );
    }
  }

  let stored = load_session()?;
  if !stored.is_expired(Utc::now()) {
    return Some(stored);
  }
  match gotrue::refresh(config, &stored).await
  {
    | Ok(session) => {
      tracing::debug!(
        "refreshed expired session"
      );
      store_session(Some(&session));
      Some(session)
    }
    | Err(err) => {
      tracing::warn!(
        error = %err,
        "session refresh failed; signing \
         out"
      );
      store_session(None);
      None
    }
  }
}

/// What the rest of the app knows about
/// the signed-in user.
#[derive(Clone, PartialEq)]
pub struct AuthContext {
  pub session:  Option<Session>,
  pub loading:  bool,
  config:       ClientConfig,
  set_session:  Callback<Option<Session>>
}

impl AuthContext {
  pub fn user(&self) -> Option<User> {
    self
      .session
      .as_ref()
      .map(|session| session.user.clone())
  }

  pub fn is_configured(&self) -> bool {
    self.config.is_configured()
  }

  /// Data access carrying the current
  /// access token.
  pub fn api(&self) -> Api {
    Api::new(
      self.config.clone(),
      self.session.as_ref().map(|session| {
        session.access_token.clone()
      })
    )
  }

  /// Emails a sign-in link that returns
  /// to this page.
  pub async fn sign_in_with_email(
    &self,
    email: &str
  ) -> Result<(), ApiError> {
    let redirect = web_sys::window()
      .and_then(|window| {
        window.location().origin().ok()
      })
      .unwrap_or_default();
    gotrue::send_magic_link(
      &self.config,
      email,
      &redirect
    )
    .await
  }

  pub fn sign_out(&self) {
    let config = self.config.clone();
    let session = self.session.clone();
    let set_session =
      self.set_session.clone();
    wasm_bindgen_futures::spawn_local(
      async move {
        if let Some(session) = session {
          if let Err(err) =
            gotrue::sign_out(&config, &session)
              .await
          {
            tracing::warn!(
              error = %err,
              "remote sign-out failed"
            );
          }
        }
        set_session.emit(None);
      }
    );
  }
}

#[derive(Properties, PartialEq)]
pub struct AuthProviderProps {
  pub children: Children
}

#[function_component(AuthProvider)]
pub fn auth_provider(
  props: &AuthProviderProps
) -> Html {
  let session =
    use_state(|| None::<Session>);
  let loading = use_state(|| true);
  let config = api::client_config();

  {
    let session = session.clone();
    let loading = loading.clone();
    let config = config.clone();
    use_effect_with((), move |_| {
      wasm_bindgen_futures::spawn_local(
        async move {
          let restored =
            restore(&config).await;
          tracing::info!(
            signed_in = restored.is_some(),
            "auth restored"
          );
          session.set(restored);
          loading.set(false);
        }
      );
      || ()
    });
  }

  let set_session = {
    let session = session.clone();
    Callback::from(
      move |next: Option<Session>| {
        store_session(next.as_ref());
        session.set(next);
      }
    )
  };

  let context = AuthContext {
    session: (*session).clone(),
    loading: *loading,
    config,
    set_session
  };

  html! {
      <ContextProvider<AuthContext> {context}>
          { props.children.clone() }
      </ContextProvider<AuthContext>>
  }
}

/// The auth context. Outside the
/// provider this is a signed-out one.
#[hook]
pub fn use_auth() -> AuthContext {
  use_context::<AuthContext>()
    .unwrap_or_else(|| AuthContext {
      session:     None,
      loading:     false,
      config:      api::client_config(),
      set_session: Callback::noop()
    })
}
