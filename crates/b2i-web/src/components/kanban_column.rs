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
  Properties,
  classes,
  function_component,
  html
};

use super::KanbanCardView;
use crate::drag;

#[derive(Properties, PartialEq)]
pub struct KanbanColumnProps {
  pub column:        ColumnId,
  pub cards:         Vec<KanbanCard>,
  pub today:         NaiveDate,
  pub dragging_card: Option<Uuid>,
  pub is_drop_hint:  bool,
  pub on_drag_start: Callback<Uuid>,
  pub on_drag_end:   Callback<()>,
  pub on_drag_over:  Callback<ColumnId>,
  pub on_drop:       Callback<DropResult>,
  pub on_archive:    Callback<Uuid>,
  pub on_delete:     Callback<Uuid>
}

#[function_component(KanbanColumn)]
pub fn kanban_column(
  props: &KanbanColumnProps
) -> Html {
  let column = props.column;

  let ondragover = {
    let on_drag_over =
      props.on_drag_over.clone();
    Callback::from(
      move |event: DragEvent| {
        drag::allow_drop(&event);
        on_drag_over.emit(column);
      }
    )
  };

  // Dropping on the column body appends.
  let ondrop = {
    let on_drop = props.on_drop.clone();
    let on_drag_end =
      props.on_drag_end.clone();
    let end = props.cards.len();
    Callback::from(
      move |event: DragEvent| {
        let destination = DragLocation::new(
          column.as_str(),
          end
        );
        if let Some(result) =
          drag::finish_drop(&event, destination)
        {
          on_drop.emit(result);
        }
        on_drag_end.emit(());
      }
    )
  };

  html! {
      <div class={classes!("kanban-column", props.is_drop_hint.then_some("drop-hint"))} {ondragover} {ondrop}>
          <div class="kanban-column-header">
              <div>
                  <span class="kanban-column-title">{ column.title() }</span>
                  <span class="muted">{ column.subtitle() }</span>
              </div>
              <span class="badge">{ props.cards.len() }</span>
          </div>
          <div class="kanban-column-body">
              {
                  if props.cards.is_empty() {
                      html! { <div class="kanban-empty">{ "Drop cards here" }</div> }
                  } else {
                      html! {
                          <>
                              {
                                  for props.cards.iter().cloned().enumerate().map(|(index, card)| {
                                      let card_id = card.id;
                                      html! {
                                          <KanbanCardView
                                              key={card_id.to_string()}
                                              card={card}
                                              column={column}
                                              index={index}
                                              today={props.today}
                                              is_dragging={props.dragging_card == Some(card_id)}
                                              on_drag_start={props.on_drag_start.clone()}
                                              on_drag_end={props.on_drag_end.clone()}
                                              on_drop={props.on_drop.clone()}
                                              on_archive={props.on_archive.clone()}
                                              on_delete={props.on_delete.clone()}
                                          />
                                      }
                                  })
                              }
                          </>
                      }
                  }
              }
          </div>
      </div>
  }
}
