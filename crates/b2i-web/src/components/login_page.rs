use web_sys::{
  InputEvent,
  SubmitEvent
};
use yew::{
  Callback,
  Html,
  function_component,
  html,
  use_state
};

use super::input_value;
use crate::session::use_auth;

#[derive(Clone, PartialEq)]
enum Notice {
  Sent(String),
  Failed(String)
}

#[function_component(LoginPage)]
pub fn login_page() -> Html {
  let auth = use_auth();
  let email = use_state(String::new);
  let sending = use_state(|| false);
  let notice = use_state(|| None::<Notice>);

  let oninput = {
    let email = email.clone();
    Callback::from(move |event: InputEvent| {
      email.set(input_value(&event));
    })
  };

  let onsubmit = {
    let auth = auth.clone();
    let email = email.clone();
    let sending = sending.clone();
    let notice = notice.clone();
    Callback::from(move |event: SubmitEvent| {
      event.prevent_default();
      if *sending {
        return;
      }
      let auth = auth.clone();
      let address = (*email).clone();
      let sending = sending.clone();
      let notice = notice.clone();
      sending.set(true);
      wasm_bindgen_futures::spawn_local(
        async move {
          let outcome = match auth
            .sign_in_with_email(&address)
            .await
          {
            | Ok(()) => Notice::Sent(format!(
              "Check {} for a sign-in link.",
              address.trim()
            )),
            | Err(err) => {
              tracing::warn!(
                error = %err,
                "magic link request failed"
              );
              Notice::Failed(err.to_string())
            }
          };
          notice.set(Some(outcome));
          sending.set(false);
        }
      );
    })
  };

  html! {
      <div class="login-page">
          <form class="login-card" {onsubmit}>
              <h1>{ "Busy to Intentional" }</h1>
              <p class="muted">{ "Sign in with a link sent to your email." }</p>
              {
                  if auth.is_configured() {
                      html! {}
                  } else {
                      html! {
                          <p class="notice error">
                              { "This build has no project url or key; sign-in will fail." }
                          </p>
                      }
                  }
              }
              <input
                  type="email"
                  placeholder="you@example.com"
                  value={(*email).clone()}
                  {oninput}
                  required=true
              />
              <button type="submit" disabled={*sending}>
                  { if *sending { "Sending..." } else { "Send magic link" } }
              </button>
              {
                  match &*notice {
                      Some(Notice::Sent(message)) => html! {
                          <p class="notice success">{ message }</p>
                      },
                      Some(Notice::Failed(message)) => html! {
                          <p class="notice error">{ message }</p>
                      },
                      None => html! {},
                  }
              }
          </form>
      </div>
  }
}
