mod api;
mod app;
mod components;
mod drag;
mod hooks;
mod session;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!("starting b2i web frontend");

  let mount = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .and_then(|document| {
      document.get_element_by_id("app")
    });

  match mount {
    | Some(mount) => {
      yew::Renderer::<app::App>::with_root(
        mount
      )
      .render();
    }
    | None => {
      tracing::warn!(
        "no #app element; mounting on body"
      );
      yew::Renderer::<app::App>::new()
        .render();
    }
  }
}
