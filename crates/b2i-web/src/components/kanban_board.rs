use b2i_shared::board::{
  self,
  CardDraft
};
use b2i_shared::model::{
  ColumnId,
  Priority
};
use chrono::NaiveDate;
use uuid::Uuid;
use web_sys::{
  Event,
  InputEvent,
  SubmitEvent
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html,
  use_state
};

use super::{
  KanbanColumn,
  input_value,
  select_value
};
use crate::hooks::use_kanban_board;

#[derive(Properties, PartialEq)]
pub struct KanbanBoardProps {
  pub today: NaiveDate
}

#[function_component(KanbanBoard)]
pub fn kanban_board(
  props: &KanbanBoardProps
) -> Html {
  let board = use_kanban_board();
  let title = use_state(String::new);
  let priority =
    use_state(|| None::<Priority>);
  let due = use_state(|| None::<NaiveDate>);
  let dragging_card =
    use_state(|| None::<Uuid>);
  let drag_over =
    use_state(|| None::<ColumnId>);
  let show_archive = use_state(|| false);

  let on_title = {
    let title = title.clone();
    Callback::from(move |event: InputEvent| {
      title.set(input_value(&event))
    })
  };

  let on_priority = {
    let priority = priority.clone();
    Callback::from(move |event: Event| {
      priority
        .set(select_value(&event).parse().ok())
    })
  };

  let on_due = {
    let due = due.clone();
    Callback::from(move |event: InputEvent| {
      due.set(
        NaiveDate::parse_from_str(
          &input_value(&event),
          "%Y-%m-%d"
        )
        .ok()
      )
    })
  };

  let onsubmit = {
    let add = board.add.clone();
    let title = title.clone();
    let priority = priority.clone();
    let due = due.clone();
    Callback::from(move |event: SubmitEvent| {
      event.prevent_default();
      add.emit(CardDraft {
        priority: *priority,
        due_date: *due,
        ..CardDraft::new((*title).clone())
      });
      title.set(String::new());
      priority.set(None);
      due.set(None);
    })
  };

  let on_drag_start = {
    let dragging_card = dragging_card.clone();
    Callback::from(move |id: Uuid| {
      dragging_card.set(Some(id))
    })
  };

  let on_drag_end = {
    let dragging_card = dragging_card.clone();
    let drag_over = drag_over.clone();
    Callback::from(move |()| {
      dragging_card.set(None);
      drag_over.set(None);
    })
  };

  let on_drag_over = {
    let drag_over = drag_over.clone();
    Callback::from(move |column: ColumnId| {
      if *drag_over != Some(column) {
        drag_over.set(Some(column));
      }
    })
  };

  let toggle_archive = {
    let show_archive = show_archive.clone();
    Callback::from(move |_: MouseEvent| {
      show_archive.set(!*show_archive)
    })
  };

  let archived = board::archived_cards(
    &board.cards
  );

  html! {
      <section class="panel kanban-panel">
          <div class="panel-header">
              <h2>{ "Task Board" }</h2>
          </div>
          <form class="card-form" {onsubmit}>
              <input
                  placeholder="New task"
                  value={(*title).clone()}
                  oninput={on_title}
              />
              <select onchange={on_priority}>
                  <option value="" selected={priority.is_none()}>{ "No priority" }</option>
                  <option value="low" selected={*priority == Some(Priority::Low)}>{ "Low" }</option>
                  <option value="medium" selected={*priority == Some(Priority::Medium)}>{ "Medium" }</option>
                  <option value="high" selected={*priority == Some(Priority::High)}>{ "High" }</option>
              </select>
              <input
                  type="date"
                  value={(*due).map(|date| date.format("%Y-%m-%d").to_string()).unwrap_or_default()}
                  oninput={on_due}
              />
              <button type="submit">{ "Add card" }</button>
          </form>
          {
              if board.is_loading {
                  html! { <div class="muted">{ "Loading board..." }</div> }
              } else {
                  html! {
                      <div class="kanban-board">
                          {
                              for ColumnId::ALL.iter().map(|column| {
                                  let cards = board::column_cards(&board.cards, *column)
                                      .into_iter()
                                      .cloned()
                                      .collect::<Vec<_>>();
                                  html! {
                                      <KanbanColumn
                                          key={column.as_str()}
                                          column={*column}
                                          cards={cards}
                                          today={props.today}
                                          dragging_card={*dragging_card}
                                          is_drop_hint={*drag_over == Some(*column)}
                                          on_drag_start={on_drag_start.clone()}
                                          on_drag_end={on_drag_end.clone()}
                                          on_drag_over={on_drag_over.clone()}
                                          on_drop={board.on_drop.clone()}
                                          on_archive={board.archive.clone()}
                                          on_delete={board.delete.clone()}
                                      />
                                  }
                              })
                          }
                      </div>
                  }
              }
          }
          <div class="archive-section">
              <button class="link-button" onclick={toggle_archive}>
                  { format!("{} archived ({})", if *show_archive { "Hide" } else { "Show" }, archived.len()) }
              </button>
              {
                  if *show_archive {
                      html! {
                          <ul class="archive-list">
                              {
                                  for archived.iter().map(|card| {
                                      let id = card.id;
                                      let on_restore = {
                                          let unarchive = board.unarchive.clone();
                                          Callback::from(move |_: MouseEvent| unarchive.emit(id))
                                      };
                                      let on_delete = {
                                          let delete = board.delete.clone();
                                          Callback::from(move |_: MouseEvent| delete.emit(id))
                                      };
                                      html! {
                                          <li key={id.to_string()}>
                                              <span>{ &card.title }</span>
                                              <span class="muted">{ card.column_id.title() }</span>
                                              <button class="icon-button" onclick={on_restore}>{ "Restore" }</button>
                                              <button class="icon-button danger" onclick={on_delete}>{ "Delete" }</button>
                                          </li>
                                      }
                                  })
                              }
                          </ul>
                      }
                  } else {
                      html! {}
                  }
              }
          </div>
      </section>
  }
}
