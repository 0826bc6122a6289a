use b2i_shared::drag::DragLocation;
use web_sys::{
  DragEvent,
  InputEvent,
  SubmitEvent
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  classes,
  function_component,
  html,
  use_state
};

use super::input_value;
use crate::drag;
use crate::hooks::use_checklist;

const CHECKLIST_DROPPABLE: &str =
  "checklist";

#[function_component(ChecklistPanel)]
pub fn checklist_panel() -> Html {
  let checklist = use_checklist();
  let draft = use_state(String::new);

  let oninput = {
    let draft = draft.clone();
    Callback::from(move |event: InputEvent| {
      draft.set(input_value(&event))
    })
  };

  let onsubmit = {
    let draft = draft.clone();
    let add = checklist.add.clone();
    Callback::from(move |event: SubmitEvent| {
      event.prevent_default();
      add.emit((*draft).clone());
      draft.set(String::new());
    })
  };

  let on_reset = {
    let reset_all =
      checklist.reset_all.clone();
    Callback::from(move |_: MouseEvent| {
      reset_all.emit(())
    })
  };

  let progress = checklist.progress;
  let percent = progress.rounded();

  html! {
      <section class="panel checklist-panel">
          <div class="panel-header">
              <h2>{ "Friday Shutdown" }</h2>
              <button class="link-button" onclick={on_reset}>{ "Reset" }</button>
          </div>
          <div class="progress">
              <div class="progress-bar" style={format!("width: {percent}%")}></div>
          </div>
          <div class="muted">
              { format!("{}/{} done ({percent}%)", progress.completed, progress.total) }
              { if progress.is_complete() { " - shutdown complete" } else { "" } }
          </div>
          {
              if checklist.is_loading {
                  html! { <div class="muted">{ "Loading checklist..." }</div> }
              } else {
                  html! {
                      <ul class="checklist">
                          {
                              for checklist.items.iter().enumerate().map(|(index, item)| {
                                  let id = item.id;
                                  let location = DragLocation::new(CHECKLIST_DROPPABLE, index);
                                  let ondragstart = {
                                      let location = location.clone();
                                      Callback::from(move |event: DragEvent| {
                                          drag::start_drag(&event, id.to_string(), location.clone());
                                      })
                                  };
                                  let ondragover = Callback::from(|event: DragEvent| drag::allow_drop(&event));
                                  let ondrop = {
                                      let on_drop = checklist.on_drop.clone();
                                      Callback::from(move |event: DragEvent| {
                                          if let Some(result) = drag::finish_drop(&event, location.clone()) {
                                              on_drop.emit(result);
                                          }
                                      })
                                  };
                                  let on_toggle = {
                                      let toggle = checklist.toggle.clone();
                                      Callback::from(move |_: MouseEvent| toggle.emit(id))
                                  };
                                  let on_remove = {
                                      let remove = checklist.remove.clone();
                                      Callback::from(move |_: MouseEvent| remove.emit(id))
                                  };
                                  html! {
                                      <li
                                          key={id.to_string()}
                                          class={classes!("checklist-item", item.is_checked.then_some("done"))}
                                          draggable="true"
                                          {ondragstart}
                                          {ondragover}
                                          {ondrop}
                                      >
                                          <span class="drag-handle">{ "⋮⋮" }</span>
                                          <input type="checkbox" checked={item.is_checked} onclick={on_toggle} />
                                          <span class="checklist-label">{ &item.label }</span>
                                          <button class="icon-button" title="Remove" onclick={on_remove}>{ "×" }</button>
                                      </li>
                                  }
                              })
                          }
                      </ul>
                  }
              }
          }
          <form class="inline-form" {onsubmit}>
              <input placeholder="Add an item" value={(*draft).clone()} {oninput} />
              <button type="submit">{ "Add" }</button>
          </form>
      </section>
  }
}
