use uuid::Uuid;
use web_sys::{
  InputEvent,
  KeyboardEvent,
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
use crate::hooks::use_goals;

#[function_component(GoalsPanel)]
pub fn goals_panel() -> Html {
  let goals = use_goals();
  let draft = use_state(String::new);
  let editing =
    use_state(|| None::<(Uuid, String)>);

  let oninput = {
    let draft = draft.clone();
    Callback::from(move |event: InputEvent| {
      draft.set(input_value(&event));
    })
  };

  let onsubmit = {
    let draft = draft.clone();
    let add = goals.add.clone();
    Callback::from(move |event: SubmitEvent| {
      event.prevent_default();
      add.emit((*draft).clone());
      draft.set(String::new());
    })
  };

  let completed = goals
    .goals
    .iter()
    .filter(|goal| goal.is_completed)
    .count();

  html! {
      <section class="panel goals-panel">
          <div class="panel-header">
              <h2>{ "Annual Goals" }</h2>
              <span class="badge">{ format!("{completed}/{}", goals.goals.len()) }</span>
          </div>
          {
              if goals.is_loading {
                  html! { <div class="muted">{ "Loading goals..." }</div> }
              } else if goals.goals.is_empty() {
                  html! { <div class="muted">{ "No goals yet. What matters this year?" }</div> }
              } else {
                  html! {
                      <ul class="goal-list">
                          {
                              for goals.goals.iter().map(|goal| {
                                  let id = goal.id;
                                  let on_toggle = {
                                      let toggle = goals.toggle.clone();
                                      Callback::from(move |_: MouseEvent| toggle.emit(id))
                                  };
                                  let on_remove = {
                                      let remove = goals.remove.clone();
                                      Callback::from(move |_: MouseEvent| remove.emit(id))
                                  };
                                  let editing_title = (*editing)
                                      .as_ref()
                                      .filter(|(editing_id, _)| *editing_id == id)
                                      .map(|(_, title)| title.clone());
                                  let title = match editing_title {
                                      Some(title) => {
                                          let on_edit_input = {
                                              let editing = editing.clone();
                                              Callback::from(move |event: InputEvent| {
                                                  editing.set(Some((id, input_value(&event))));
                                              })
                                          };
                                          let on_edit_key = {
                                              let editing = editing.clone();
                                              let rename = goals.rename.clone();
                                              let current = title.clone();
                                              Callback::from(move |event: KeyboardEvent| {
                                                  match event.key().as_str() {
                                                      "Enter" => {
                                                          rename.emit((id, current.clone()));
                                                          editing.set(None);
                                                      }
                                                      "Escape" => editing.set(None),
                                                      _ => {}
                                                  }
                                              })
                                          };
                                          html! {
                                              <input
                                                  class="goal-edit"
                                                  value={title}
                                                  oninput={on_edit_input}
                                                  onkeydown={on_edit_key}
                                              />
                                          }
                                      }
                                      None => {
                                          let on_start_edit = {
                                              let editing = editing.clone();
                                              let title = goal.title.clone();
                                              Callback::from(move |_: MouseEvent| {
                                                  editing.set(Some((id, title.clone())));
                                              })
                                          };
                                          html! {
                                              <span class="goal-title" ondblclick={on_start_edit}>
                                                  { &goal.title }
                                              </span>
                                          }
                                      }
                                  };
                                  html! {
                                      <li key={id.to_string()} class={classes!("goal", goal.is_completed.then_some("done"))}>
                                          <input type="checkbox" checked={goal.is_completed} onclick={on_toggle} />
                                          { title }
                                          <button class="icon-button" title="Delete goal" onclick={on_remove}>{ "×" }</button>
                                      </li>
                                  }
                              })
                          }
                      </ul>
                  }
              }
          }
          <form class="inline-form" {onsubmit}>
              <input placeholder="Add a goal" value={(*draft).clone()} {oninput} />
              <button type="submit">{ "Add" }</button>
          </form>
      </section>
  }
}
