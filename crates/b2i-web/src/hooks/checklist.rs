use std::rc::Rc;

use b2i_shared::checklist::{
  self,
  DEFAULT_ITEMS,
  Progress
};
use b2i_shared::drag::DropResult;
use b2i_shared::model::{
  CHECKLIST_ITEMS_TABLE,
  ChecklistItem,
  NewChecklistItem,
  User,
  normalize_text
};
use serde_json::json;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::{
  Callback,
  Reducible,
  hook,
  use_effect_with,
  use_mut_ref,
  use_reducer
};

use super::logged;
use crate::api::Api;
use crate::session::use_auth;

#[derive(Clone, PartialEq)]
pub struct ChecklistState {
  items:      Vec<ChecklistItem>,
  is_loading: bool,
  // Position writes produced by reorders
  // and not yet sent.
  outbox:     Vec<(Uuid, i32)>
}

impl Default for ChecklistState {
  fn default() -> Self {
    Self {
      items:      Vec::new(),
      is_loading: true,
      outbox:     Vec::new()
    }
  }
}

pub enum ChecklistAction {
  Loaded(Vec<ChecklistItem>),
  Failed,
  Added(ChecklistItem),
  Checked(Uuid, bool),
  Removed(Uuid),
  ResetAll,
  Reordered(usize, usize),
  Flushed(usize)
}

impl Reducible for ChecklistState {
  type Action = ChecklistAction;

  fn reduce(
    self: Rc<Self>,
    action: Self::Action
  ) -> Rc<Self> {
    let mut next = (*self).clone();
    match action {
      | ChecklistAction::Loaded(items) => {
        next.items = items;
        next.is_loading = false;
      }
      | ChecklistAction::Failed => {
        next.is_loading = false
      }
      | ChecklistAction::Added(item) => {
        next.items.push(item)
      }
      | ChecklistAction::Checked(id, checked) => {
        if let Some(item) = next
          .items
          .iter_mut()
          .find(|item| item.id == id)
        {
          item.is_checked = checked;
        }
      }
      | ChecklistAction::Removed(id) => {
        next.items.retain(|item| item.id != id)
      }
      | ChecklistAction::ResetAll => {
        for item in &mut next.items {
          item.is_checked = false;
        }
      }
      | ChecklistAction::Reordered(start, end) => {
        if !checklist::reorder(
          &mut next.items,
          start,
          end
        ) {
          return self;
        }
        let writes =
          checklist::renumber(&next.items);
        for (item, (_, position)) in
          next.items.iter_mut().zip(&writes)
        {
          item.position = *position;
        }
        next.outbox.extend(writes);
      }
      | ChecklistAction::Flushed(count) => {
        let count = count.min(next.outbox.len());
        next.outbox.drain(..count);
      }
    }
    Rc::new(next)
  }
}

#[derive(Clone, PartialEq)]
pub struct ChecklistHandle {
  pub items:      Vec<ChecklistItem>,
  pub is_loading: bool,
  pub progress:   Progress,
  pub toggle:     Callback<Uuid>,
  pub add:        Callback<String>,
  pub remove:     Callback<Uuid>,
  pub reset_all:  Callback<()>,
  pub reorder:    Callback<(usize, usize)>,
  pub on_drop:    Callback<DropResult>
}

async fn seed_defaults(
  api: &Api,
  user: &User
) -> Option<Vec<ChecklistItem>> {
  let rows: Vec<NewChecklistItem> =
    DEFAULT_ITEMS
      .iter()
      .zip(0_i32..)
      .map(|(label, position)| {
        NewChecklistItem {
          user_id: user.id,
          label: (*label).to_string(),
          is_checked: false,
          position
        }
      })
      .collect();
  let mut items: Vec<ChecklistItem> =
    logged(
      api
        .insert_many(
          CHECKLIST_ITEMS_TABLE,
          &rows
        )
        .await,
      "seed checklist"
    )?;
  items.sort_by_key(|item| item.position);
  tracing::info!(
    count = items.len(),
    "seeded default checklist"
  );
  Some(items)
}

/// Stops at the first failed write.
async fn persist_positions(
  api: Api,
  writes: Vec<(Uuid, i32)>
) {
  for (id, position) in writes {
    let patch =
      json!({ "position": position });
    if logged(
      api
        .update(
          CHECKLIST_ITEMS_TABLE,
          &patch,
          "id",
          id
        )
        .await,
      "reorder checklist"
    )
    .is_none()
    {
      break;
    }
  }
}

#[hook]
pub fn use_checklist() -> ChecklistHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let state =
    use_reducer(ChecklistState::default);
  // The user whose checklist has been
  // loaded at least once.
  let initialized =
    use_mut_ref(|| None::<Uuid>);

  {
    let dispatcher = state.dispatcher();
    let initialized = initialized.clone();
    use_effect_with(
      (user.clone(), api.clone()),
      move |(user, api)| {
        let user = user.clone();
        let api = api.clone();
        spawn_local(async move {
          let Some(user) = user else {
            *initialized.borrow_mut() = None;
            dispatcher.dispatch(
              ChecklistAction::Loaded(
                Vec::new()
              )
            );
            return;
          };
          let query = api
            .from(CHECKLIST_ITEMS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("position", true);
          let Some(fetched) = logged(
            api
              .fetch::<ChecklistItem>(query)
              .await,
            "fetch checklist"
          ) else {
            dispatcher
              .dispatch(ChecklistAction::Failed);
            return;
          };

          let first_load = initialized
            .borrow_mut()
            .replace(user.id)
            != Some(user.id);
          if fetched.is_empty() && first_load {
            match seed_defaults(&api, &user)
              .await
            {
              | Some(items) => dispatcher
                .dispatch(
                  ChecklistAction::Loaded(
                    items
                  )
                ),
              | None => dispatcher.dispatch(
                ChecklistAction::Failed
              )
            }
            return;
          }
          dispatcher.dispatch(
            ChecklistAction::Loaded(fetched)
          );
        });
        || ()
      }
    );
  }

  let toggle = {
    let dispatcher = state.dispatcher();
    let items = state.items.clone();
    let api = api.clone();
    Callback::from(move |id: Uuid| {
      let Some(checked) = items
        .iter()
        .find(|item| item.id == id)
        .map(|item| !item.is_checked)
      else {
        return;
      };
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        let patch =
          json!({ "is_checked": checked });
        if logged(
          api
            .update(
              CHECKLIST_ITEMS_TABLE,
              &patch,
              "id",
              id
            )
            .await,
          "toggle item"
        )
        .is_some()
        {
          dispatcher.dispatch(
            ChecklistAction::Checked(
              id, checked
            )
          );
        }
      });
    })
  };

  let add = {
    let dispatcher = state.dispatcher();
    let count = state.items.len();
    let api = api.clone();
    let user = user.clone();
    Callback::from(move |label: String| {
      let Some(user) = user.clone() else {
        return;
      };
      let Some(label) = normalize_text(&label)
      else {
        return;
      };
      let row = NewChecklistItem {
        user_id: user.id,
        label,
        is_checked: false,
        position: i32::try_from(count)
          .unwrap_or(i32::MAX)
      };
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        if let Some(item) = logged(
          api
            .insert_one::<_, ChecklistItem>(
              CHECKLIST_ITEMS_TABLE,
              &row
            )
            .await,
          "add item"
        ) {
          dispatcher.dispatch(
            ChecklistAction::Added(item)
          );
        }
      });
    })
  };

  let remove = {
    let dispatcher = state.dispatcher();
    let api = api.clone();
    Callback::from(move |id: Uuid| {
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        if logged(
          api
            .delete(
              CHECKLIST_ITEMS_TABLE,
              "id",
              id
            )
            .await,
          "remove item"
        )
        .is_some()
        {
          dispatcher.dispatch(
            ChecklistAction::Removed(id)
          );
        }
      });
    })
  };

  let reset_all = {
    let dispatcher = state.dispatcher();
    let api = api.clone();
    let user = user.clone();
    Callback::from(move |()| {
      let Some(user) = user.clone() else {
        return;
      };
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        let patch =
          json!({ "is_checked": false });
        if logged(
          api
            .update(
              CHECKLIST_ITEMS_TABLE,
              &patch,
              "user_id",
              user.id
            )
            .await,
          "reset checklist"
        )
        .is_some()
        {
          dispatcher
            .dispatch(ChecklistAction::ResetAll);
        }
      });
    })
  };

  {
    let dispatcher = state.dispatcher();
    use_effect_with(
      (state.outbox.clone(), api.clone()),
      move |(outbox, api)| {
        if !outbox.is_empty() {
          dispatcher.dispatch(
            ChecklistAction::Flushed(
              outbox.len()
            )
          );
          spawn_local(persist_positions(
            api.clone(),
            outbox.clone()
          ));
        }
        || ()
      }
    );
  }

  let reorder = {
    let dispatcher = state.dispatcher();
    let has_user = user.is_some();
    Callback::from(
      move |(start, end): (usize, usize)| {
        if has_user {
          dispatcher.dispatch(
            ChecklistAction::Reordered(
              start, end
            )
          );
        }
      }
    )
  };

  let on_drop = {
    let reorder = reorder.clone();
    Callback::from(move |drop: DropResult| {
      if let Some(indices) =
        checklist::resolve_item_drop(&drop)
      {
        reorder.emit(indices);
      }
    })
  };

  ChecklistHandle {
    items: state.items.clone(),
    is_loading: state.is_loading,
    progress: Progress::of(&state.items),
    toggle,
    add,
    remove,
    reset_all,
    reorder,
    on_drop
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn item(label: &str, checked: bool) -> ChecklistItem {
    ChecklistItem {
      id:         Uuid::new_v4(),
      label:      label.to_string(),
      is_checked: checked,
      position:   0,
      created_at: Utc::now()
    }
  }

  #[test]
  fn reset_unchecks_everything() {
    let state =
      Rc::new(ChecklistState::default()).reduce(
        ChecklistAction::Loaded(vec![
          item("Inbox zero", true),
          item("Plan Monday", false),
        ])
      );
    assert_eq!(Progress::of(&state.items).completed, 1);

    let state =
      state.reduce(ChecklistAction::ResetAll);
    assert!(
      state.items.iter().all(|item| !item.is_checked)
    );
  }

  #[test]
  fn failed_load_keeps_items() {
    let state =
      Rc::new(ChecklistState::default()).reduce(
        ChecklistAction::Loaded(vec![item(
          "Inbox zero",
          false
        )])
      );
    let state =
      state.reduce(ChecklistAction::Failed);
    assert_eq!(state.items.len(), 1);
    assert!(!state.is_loading);
  }

  #[test]
  fn reorder_covers_items_added_after_the_render() {
    let state =
      Rc::new(ChecklistState::default()).reduce(
        ChecklistAction::Loaded(vec![item(
          "Inbox zero",
          false
        )])
      );
    let late = ChecklistItem {
      position: 1,
      ..item("Plan Monday", false)
    };
    let state = state
      .reduce(ChecklistAction::Added(late.clone()));

    let state = state
      .reduce(ChecklistAction::Reordered(1, 0));
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.items[0].id, late.id);
    assert_eq!(
      state
        .items
        .iter()
        .map(|item| item.position)
        .collect::<Vec<_>>(),
      vec![0, 1]
    );
    assert_eq!(state.outbox.len(), 2);

    let state = state
      .reduce(ChecklistAction::Flushed(2));
    assert!(state.outbox.is_empty());
  }
}
