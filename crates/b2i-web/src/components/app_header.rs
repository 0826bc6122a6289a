use yew::{
  Callback,
  Html,
  MouseEvent,
  classes,
  function_component,
  html,
  use_state
};
use yew_router::prelude::Link;

use super::AboutDialog;
use crate::app::Route;
use crate::session::use_auth;

#[function_component(AppHeader)]
pub fn app_header() -> Html {
  let auth = use_auth();
  let menu_open = use_state(|| false);
  let email = auth
    .user()
    .and_then(|user| user.email)
    .unwrap_or_else(|| "Signed in".to_string());

  let toggle_menu = {
    let menu_open = menu_open.clone();
    Callback::from(move |_: MouseEvent| {
      menu_open.set(!*menu_open);
    })
  };

  let sign_out = {
    let auth = auth.clone();
    let menu_open = menu_open.clone();
    Callback::from(move |_: MouseEvent| {
      menu_open.set(false);
      auth.sign_out();
    })
  };

  html! {
      <header class="app-header">
          <div class="brand">
              <span class="brand-title">{ "Busy to Intentional" }</span>
          </div>
          <nav class="app-nav">
              <Link<Route> to={Route::Home}>{ "Board" }</Link<Route>>
              <Link<Route> to={Route::Metrics}>{ "Metrics" }</Link<Route>>
          </nav>
          <AboutDialog />
          <div class={classes!("user-menu", (*menu_open).then_some("open"))}>
              <button class="user-menu-toggle" onclick={toggle_menu}>
                  { email.clone() }
              </button>
              {
                  if *menu_open {
                      html! {
                          <div class="user-menu-panel">
                              <div class="muted">{ email }</div>
                              <button class="danger" onclick={sign_out}>{ "Sign out" }</button>
                          </div>
                      }
                  } else {
                      html! {}
                  }
              }
          </div>
      </header>
  }
}
