use chrono::Local;
use yew::{
  Children,
  Html,
  Properties,
  function_component,
  html
};
use yew_router::{
  BrowserRouter,
  Routable,
  Switch
};

use crate::components::{
  AppHeader,
  CheckinPanel,
  ChecklistPanel,
  FooterBar,
  GoalsPanel,
  KanbanBoard,
  LoginPage,
  MetricsPage
};
use crate::session::{
  AuthProvider,
  use_auth
};

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
  #[at("/")]
  Home,
  #[at("/metrics")]
  Metrics,
  #[not_found]
  #[at("/404")]
  NotFound
}

fn switch(route: Route) -> Html {
  match route {
    | Route::Home | Route::NotFound => {
      html! { <Gate><HomePage /></Gate> }
    }
    | Route::Metrics => {
      html! { <Gate><MetricsPage /></Gate> }
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  html! {
      <AuthProvider>
          <BrowserRouter>
              <Switch<Route> render={switch} />
          </BrowserRouter>
      </AuthProvider>
  }
}

#[derive(Properties, PartialEq)]
struct GateProps {
  children: Children
}

/// Shows the login screen until a user
/// is signed in.
#[function_component(Gate)]
fn gate(props: &GateProps) -> Html {
  let auth = use_auth();
  if auth.loading {
    return html! {
        <div class="page-loading">{ "Loading..." }</div>
    };
  }
  if auth.session.is_none() {
    return html! { <LoginPage /> };
  }
  html! {
      <div class="app-shell">
          <AppHeader />
          <main class="app-main">{ props.children.clone() }</main>
          <FooterBar />
      </div>
  }
}

#[function_component(HomePage)]
fn home_page() -> Html {
  let today = Local::now().date_naive();
  html! {
      <>
          <GoalsPanel />
          <KanbanBoard {today} />
          <div class="review-grid">
              <ChecklistPanel />
              <CheckinPanel {today} />
          </div>
      </>
  }
}
