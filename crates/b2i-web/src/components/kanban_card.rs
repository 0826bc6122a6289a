use b2i_shared::drag::{
  DragLocation,
  DropResult
};
use b2i_shared::model::{
  ColumnId,
  KanbanCard
};
use chrono::NaiveDate;
use uuid::Uuid;
use web_sys::DragEvent;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html
};

use crate::drag;

#[derive(Properties, PartialEq)]
pub struct KanbanCardProps {
  pub card:          KanbanCard,
  pub column:        ColumnId,
  pub index:         usize,
  pub today:         NaiveDate,
  pub is_dragging:   bool,
  pub on_drag_start: Callback<Uuid>,
  pub on_drag_end:   Callback<()>,
  pub on_drop:       Callback<DropResult>,
  pub on_archive:    Callback<Uuid>,
  pub on_delete:     Callback<Uuid>
}

#[function_component(KanbanCardView)]
pub fn kanban_card(
  props: &KanbanCardProps
) -> Html {
  let card_id = props.card.id;
  let location = DragLocation::new(
    props.column.as_str(),
    props.index
  );

  let ondragstart = {
    let on_drag_start =
      props.on_drag_start.clone();
    let location = location.clone();
    Callback::from(
      move |event: DragEvent| {
        drag::start_drag(
          &event,
          card_id.to_string(),
          location.clone()
        );
        on_drag_start.emit(card_id);
      }
    )
  };

  let ondragend = {
    let on_drag_end =
      props.on_drag_end.clone();
    Callback::from(move |_| {
      on_drag_end.emit(());
    })
  };

  let ondragover =
    Callback::from(|event: DragEvent| {
      drag::allow_drop(&event);
    });

  // Dropping on a card inserts before it.
  let ondrop = {
    let on_drop = props.on_drop.clone();
    let on_drag_end =
      props.on_drag_end.clone();
    Callback::from(
      move |event: DragEvent| {
        if let Some(result) =
          drag::finish_drop(
            &event,
            location.clone()
          )
        {
          on_drop.emit(result);
        }
        on_drag_end.emit(());
      }
    )
  };

  let on_archive = {
    let on_archive =
      props.on_archive.clone();
    Callback::from(move |_: MouseEvent| {
      on_archive.emit(card_id)
    })
  };

  let on_delete = {
    let on_delete = props.on_delete.clone();
    Callback::from(move |_: MouseEvent| {
      on_delete.emit(card_id)
    })
  };

  let overdue = props
    .card
    .due_date
    .is_some_and(|due| due < props.today)
    && props.column != ColumnId::Complete;

  html! {
      <div
          class={classes!("kanban-card", props.is_dragging.then_some("dragging"))}
          draggable="true"
          {ondragstart}
          {ondragend}
          {ondragover}
          {ondrop}
      >
          <div class="kanban-card-title">{ &props.card.title }</div>
          {
              match props.card.description.as_deref().filter(|text| !text.trim().is_empty()) {
                  Some(text) => html! { <div class="kanban-card-description">{ text }</div> },
                  None => html! {},
              }
          }
          <div class="kanban-card-meta">
              {
                  match props.card.priority {
                      Some(priority) => html! {
                          <span class={classes!("priority", format!("priority-{priority}"))}>
                              { priority.as_str() }
                          </span>
                      },
                      None => html! {},
                  }
              }
              {
                  match props.card.due_date {
                      Some(due) => html! {
                          <span class={classes!("due", overdue.then_some("overdue"))}>
                              { due.format("%b %-d").to_string() }
                          </span>
                      },
                      None => html! {},
                  }
              }
          </div>
          <div class="kanban-card-actions">
              <button class="icon-button" title="Archive" onclick={on_archive}>{ "Archive" }</button>
              <button class="icon-button danger" title="Delete" onclick={on_delete}>{ "Delete" }</button>
          </div>
      </div>
  }
}
