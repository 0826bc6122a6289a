use web_sys::{
  InputEvent,
  KeyboardEvent
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  function_component,
  html,
  use_state
};

use super::input_value;
use crate::hooks::use_settings;

/// The user's footer line; click to edit,
/// Enter saves and Escape cancels.
#[function_component(FooterBar)]
pub fn footer_bar() -> Html {
  let settings = use_settings();
  let editing = use_state(|| None::<String>);

  let start_edit = {
    let editing = editing.clone();
    let message =
      settings.footer_message().to_string();
    Callback::from(move |_: MouseEvent| {
      editing.set(Some(message.clone()))
    })
  };

  let content = match (*editing).clone() {
    | Some(value) => {
      let oninput = {
        let editing = editing.clone();
        Callback::from(
          move |event: InputEvent| {
            editing
              .set(Some(input_value(&event)))
          }
        )
      };
      let onkeydown = {
        let editing = editing.clone();
        let update = settings
          .update_footer_message
          .clone();
        let value = value.clone();
        Callback::from(
          move |event: KeyboardEvent| {
            match event.key().as_str() {
              | "Enter" => {
                update.emit(value.clone());
                editing.set(None);
              }
              | "Escape" => editing.set(None),
              | _ => {}
            }
          }
        )
      };
      html! {
          <input class="footer-edit" {value} {oninput} {onkeydown} />
      }
    }
    | None => html! {
        <span class="footer-message" title="Click to edit" onclick={start_edit}>
            { settings.footer_message() }
        </span>
    }
  };

  html! {
      <footer class="app-footer">{ content }</footer>
  }
}
