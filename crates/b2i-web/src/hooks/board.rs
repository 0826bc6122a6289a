use std::rc::Rc;

use b2i_shared::board::{
  self,
  CardDraft,
  CardMove,
  PositionWrite
};
use b2i_shared::drag::DropResult;
use b2i_shared::model::{
  CardPatch,
  KANBAN_CARDS_TABLE,
  KanbanCard,
  NewKanbanCard
};
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::{
  Callback,
  Reducible,
  hook,
  use_effect_with,
  use_reducer
};

use super::logged;
use crate::api::Api;
use crate::session::use_auth;

#[derive(Clone, PartialEq)]
pub struct BoardState {
  cards:      Vec<KanbanCard>,
  is_loading: bool,
  // Position writes produced by moves
  // and not yet sent.
  outbox:     Vec<PositionWrite>
}

impl Default for BoardState {
  fn default() -> Self {
    Self {
      cards:      Vec::new(),
      is_loading: true,
      outbox:     Vec::new()
    }
  }
}

pub enum BoardAction {
  Loaded(Vec<KanbanCard>),
  Failed,
  Added(KanbanCard),
  Patched(Uuid, CardPatch),
  Removed(Uuid),
  Moved(CardMove),
  Flushed(usize)
}

impl Reducible for BoardState {
  type Action = BoardAction;

  fn reduce(
    self: Rc<Self>,
    action: Self::Action
  ) -> Rc<Self> {
    let mut next = (*self).clone();
    match action {
      | BoardAction::Loaded(cards) => {
        next.cards = cards;
        next.is_loading = false;
      }
      | BoardAction::Failed => {
        next.is_loading = false
      }
      | BoardAction::Added(card) => {
        next.cards.push(card)
      }
      | BoardAction::Patched(id, patch) => {
        if let Some(card) = next
          .cards
          .iter_mut()
          .find(|card| card.id == id)
        {
          patch.apply(card);
        }
      }
      | BoardAction::Removed(id) => {
        next.cards.retain(|card| card.id != id)
      }
      | BoardAction::Moved(request) => {
        let Some(writes) = board::move_card(
          &mut next.cards,
          request.card_id,
          request.column,
          Some(request.index)
        ) else {
          return self;
        };
        tracing::debug!(
          card = %request.card_id,
          column = %request.column,
          writes = writes.len(),
          "card moved"
        );
        next.outbox.extend(writes);
      }
      | BoardAction::Flushed(count) => {
        let count = count.min(next.outbox.len());
        next.outbox.drain(..count);
      }
    }
    Rc::new(next)
  }
}

#[derive(Clone, PartialEq)]
pub struct BoardHandle {
  pub cards:      Vec<KanbanCard>,
  pub is_loading: bool,
  pub add:        Callback<CardDraft>,
  pub update:     Callback<(Uuid, CardPatch)>,
  pub archive:    Callback<Uuid>,
  pub unarchive:  Callback<Uuid>,
  pub delete:     Callback<Uuid>,
  pub move_card:  Callback<CardMove>,
  pub on_drop:    Callback<DropResult>
}

async fn persist_moves(
  api: Api,
  writes: Vec<PositionWrite>
) {
  for write in writes {
    let patch = CardPatch {
      column_id: Some(write.column_id),
      position: Some(write.position),
      ..CardPatch::default()
    };
    logged(
      api
        .update(
          KANBAN_CARDS_TABLE,
          &patch,
          "id",
          write.id
        )
        .await,
      "move card"
    );
  }
}

#[hook]
pub fn use_kanban_board() -> BoardHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let state =
    use_reducer(BoardState::default);

  {
    let dispatcher = state.dispatcher();
    use_effect_with(
      (user.clone(), api.clone()),
      move |(user, api)| {
        let user = user.clone();
        let api = api.clone();
        spawn_local(async move {
          let Some(user) = user else {
            dispatcher.dispatch(
              BoardAction::Loaded(Vec::new())
            );
            return;
          };
          let query = api
            .from(KANBAN_CARDS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("position", true);
          match logged(
            api
              .fetch::<KanbanCard>(query)
              .await,
            "fetch cards"
          ) {
            | Some(cards) => dispatcher
              .dispatch(BoardAction::Loaded(
                cards
              )),
            | None => dispatcher
              .dispatch(BoardAction::Failed)
          }
        });
        || ()
      }
    );
  }

  {
    let dispatcher = state.dispatcher();
    use_effect_with(
      (state.outbox.clone(), api.clone()),
      move |(outbox, api)| {
        if !outbox.is_empty() {
          dispatcher.dispatch(
            BoardAction::Flushed(outbox.len())
          );
          spawn_local(persist_moves(
            api.clone(),
            outbox.clone()
          ));
        }
        || ()
      }
    );
  }

  let add = {
    let dispatcher = state.dispatcher();
    let cards = state.cards.clone();
    let api = api.clone();
    let user = user.clone();
    Callback::from(move |draft: CardDraft| {
      let Some(user) = user.clone() else {
        return;
      };
      let Some(draft) = draft.normalized()
      else {
        return;
      };
      let row = NewKanbanCard {
        user_id:   user.id,
        position:  board::next_position(
          &cards,
          draft.column_id
        ),
        title:     draft.title,
        column_id: draft.column_id,
        priority:  draft.priority,
        due_date:  draft.due_date
      };
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        if let Some(card) = logged(
          api
            .insert_one::<_, KanbanCard>(
              KANBAN_CARDS_TABLE,
              &row
            )
            .await,
          "add card"
        ) {
          tracing::info!(
            card = %card.id,
            "card added"
          );
          dispatcher
            .dispatch(BoardAction::Added(card));
        }
      });
    })
  };

  let update = {
    let dispatcher = state.dispatcher();
    let cards = state.cards.clone();
    let api = api.clone();
    Callback::from(
      move |(id, patch): (Uuid, CardPatch)| {
        if patch.is_empty()
          || !cards.iter().any(|card| card.id == id)
        {
          return;
        }
        if patch.title.as_deref().is_some_and(
          |title| title.trim().is_empty()
        ) {
          return;
        }
        let dispatcher = dispatcher.clone();
        let api = api.clone();
        spawn_local(async move {
          if logged(
            api
              .update(
                KANBAN_CARDS_TABLE,
                &patch,
                "id",
                id
              )
              .await,
            "update card"
          )
          .is_some()
          {
            dispatcher.dispatch(
              BoardAction::Patched(id, patch)
            );
          }
        });
      }
    )
  };

  let archive = {
    let update = update.clone();
    Callback::from(move |id: Uuid| {
      update.emit((id, CardPatch::archived(true)))
    })
  };

  let unarchive = {
    let update = update.clone();
    Callback::from(move |id: Uuid| {
      update
        .emit((id, CardPatch::archived(false)))
    })
  };

  let delete = {
    let dispatcher = state.dispatcher();
    let api = api.clone();
    Callback::from(move |id: Uuid| {
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        if logged(
          api
            .delete(KANBAN_CARDS_TABLE, "id", id)
            .await,
          "delete card"
        )
        .is_some()
        {
          dispatcher
            .dispatch(BoardAction::Removed(id));
        }
      });
    })
  };

  let move_card = {
    let dispatcher = state.dispatcher();
    let has_user = user.is_some();
    Callback::from(move |request: CardMove| {
      if has_user {
        dispatcher
          .dispatch(BoardAction::Moved(request));
      }
    })
  };

  let on_drop = {
    let move_card = move_card.clone();
    Callback::from(move |drop: DropResult| {
      if let Some(request) =
        board::resolve_card_drop(&drop)
      {
        move_card.emit(request);
      }
    })
  };

  BoardHandle {
    cards: state.cards.clone(),
    is_loading: state.is_loading,
    add,
    update,
    archive,
    unarchive,
    delete,
    move_card,
    on_drop
  }
}

#[cfg(test)]
mod tests {
  use b2i_shared::model::ColumnId;
  use chrono::Utc;

  use super::*;

  fn card(title: &str) -> KanbanCard {
    KanbanCard {
      id:          Uuid::new_v4(),
      title:       title.to_string(),
      description: None,
      column_id:   ColumnId::Todo,
      priority:    None,
      due_date:    None,
      is_archived: false,
      position:    0,
      created_at:  Utc::now()
    }
  }

  #[test]
  fn patches_apply_to_the_matching_card() {
    let first = card("First");
    let second = card("Second");
    let state = Rc::new(BoardState::default())
      .reduce(BoardAction::Loaded(vec![
        first.clone(),
        second.clone(),
      ]));
    assert!(!state.is_loading);

    let state = state.reduce(
      BoardAction::Patched(
        second.id,
        CardPatch::archived(true)
      )
    );
    assert!(!state.cards[0].is_archived);
    assert!(state.cards[1].is_archived);

    let state = state
      .reduce(BoardAction::Removed(first.id));
    assert_eq!(state.cards.len(), 1);
    assert_eq!(state.cards[0].id, second.id);
  }

  #[test]
  fn moves_apply_to_cards_added_after_the_render() {
    let first = card("First");
    let state = Rc::new(BoardState::default())
      .reduce(BoardAction::Loaded(vec![
        first.clone(),
      ]));
    let late = KanbanCard {
      position: 1,
      ..card("Late")
    };
    let state = state
      .reduce(BoardAction::Added(late.clone()));

    let state =
      state.reduce(BoardAction::Moved(CardMove {
        card_id: first.id,
        column:  ColumnId::Complete,
        index:   0
      }));
    assert_eq!(state.cards.len(), 2);
    let late_now = state
      .cards
      .iter()
      .find(|card| card.id == late.id)
      .expect("late card kept");
    assert_eq!(late_now.position, 0);
    assert_eq!(state.outbox.len(), 2);

    let state =
      state.reduce(BoardAction::Flushed(2));
    assert!(state.outbox.is_empty());
  }
}
