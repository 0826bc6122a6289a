use std::rc::Rc;

use b2i_shared::model::{
  GOALS_TABLE,
  Goal,
  GoalPatch,
  NewGoal,
  normalize_text
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
use crate::session::use_auth;

#[derive(Clone, PartialEq)]
pub struct GoalsState {
  goals:      Vec<Goal>,
  is_loading: bool
}

impl Default for GoalsState {
  fn default() -> Self {
    Self {
      goals:      Vec::new(),
      is_loading: true
    }
  }
}

pub enum GoalsAction {
  Loaded(Vec<Goal>),
  Failed,
  Added(Goal),
  Patched(Uuid, GoalPatch),
  Removed(Uuid)
}

impl Reducible for GoalsState {
  type Action = GoalsAction;

  fn reduce(
    self: Rc<Self>,
    action: Self::Action
  ) -> Rc<Self> {
    let mut next = (*self).clone();
    match action {
      | GoalsAction::Loaded(goals) => {
        next.goals = goals;
        next.is_loading = false;
      }
      | GoalsAction::Failed => {
        next.is_loading = false;
      }
      | GoalsAction::Added(goal) => {
        next.goals.push(goal)
      }
      | GoalsAction::Patched(id, patch) => {
        if let Some(goal) = next
          .goals
          .iter_mut()
          .find(|goal| goal.id == id)
        {
          patch.apply(goal);
        }
      }
      | GoalsAction::Removed(id) => {
        next.goals.retain(|goal| goal.id != id)
      }
    }
    Rc::new(next)
  }
}

#[derive(Clone, PartialEq)]
pub struct GoalsHandle {
  pub goals:      Vec<Goal>,
  pub is_loading: bool,
  pub add:        Callback<String>,
  pub toggle:     Callback<Uuid>,
  pub rename:     Callback<(Uuid, String)>,
  pub remove:     Callback<Uuid>
}

#[hook]
pub fn use_goals() -> GoalsHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let state =
    use_reducer(GoalsState::default);

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
              GoalsAction::Loaded(Vec::new())
            );
            return;
          };
          let query = api
            .from(GOALS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("created_at", true);
          match logged(
            api.fetch::<Goal>(query).await,
            "fetch goals"
          ) {
            | Some(goals) => {
              tracing::debug!(
                count = goals.len(),
                "goals loaded"
              );
              dispatcher.dispatch(
                GoalsAction::Loaded(goals)
              )
            }
            | None => dispatcher
              .dispatch(GoalsAction::Failed)
          }
        });
        || ()
      }
    );
  }

  let add = {
    let dispatcher = state.dispatcher();
    let api = api.clone();
    let user = user.clone();
    Callback::from(move |title: String| {
      let Some(user) = user.clone() else {
        return;
      };
      let Some(title) = normalize_text(&title)
      else {
        return;
      };
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        let row = NewGoal {
          user_id: user.id,
          title
        };
        if let Some(goal) = logged(
          api
            .insert_one::<_, Goal>(
              GOALS_TABLE,
              &row
            )
            .await,
          "add goal"
        ) {
          dispatcher
            .dispatch(GoalsAction::Added(goal));
        }
      });
    })
  };

  let patch = {
    let dispatcher = state.dispatcher();
    let api = api.clone();
    move |id: Uuid, patch: GoalPatch| {
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        if logged(
          api
            .update(GOALS_TABLE, &patch, "id", id)
            .await,
          "update goal"
        )
        .is_some()
        {
          dispatcher.dispatch(
            GoalsAction::Patched(id, patch)
          );
        }
      });
    }
  };

  let toggle = {
    let goals = state.goals.clone();
    let patch = patch.clone();
    Callback::from(move |id: Uuid| {
      let Some(goal) =
        goals.iter().find(|goal| goal.id == id)
      else {
        return;
      };
      patch(id, GoalPatch {
        is_completed: Some(!goal.is_completed),
        ..GoalPatch::default()
      });
    })
  };

  let rename = {
    let patch = patch.clone();
    Callback::from(
      move |(id, title): (Uuid, String)| {
        if let Some(title) =
          normalize_text(&title)
        {
          patch(id, GoalPatch {
            title: Some(title),
            ..GoalPatch::default()
          });
        }
      }
    )
  };

  let remove = {
    let dispatcher = state.dispatcher();
    Callback::from(move |id: Uuid| {
      let dispatcher = dispatcher.clone();
      let api = api.clone();
      spawn_local(async move {
        if logged(
          api.delete(GOALS_TABLE, "id", id).await,
          "delete goal"
        )
        .is_some()
        {
          dispatcher
            .dispatch(GoalsAction::Removed(id));
        }
      });
    })
  };

  GoalsHandle {
    goals: state.goals.clone(),
    is_loading: state.is_loading,
    add,
    toggle,
    rename,
    remove
  }
}
