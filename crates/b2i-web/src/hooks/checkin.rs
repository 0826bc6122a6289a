use b2i_shared::checkin::{
  MonthlyDraft,
  WeeklyDraft,
  WeeklyMetrics
};
use b2i_shared::model::{
  MONTHLY_REVIEWS_TABLE,
  MonthlyReview,
  User,
  WEEKLY_CHECKINS_TABLE,
  WeeklyCheckin
};
use chrono::NaiveDate;
use wasm_bindgen_futures::spawn_local;
use yew::{
  Callback,
  hook,
  use_effect_with,
  use_state
};

use super::logged;
use crate::api::Api;
use crate::session::use_auth;

pub const RECENT_CHECKINS: usize = 4;
pub const METRICS_WEEKS: usize = 12;

async fn fetch_week(
  api: &Api,
  user: &User,
  week_of: NaiveDate
) -> Option<Option<WeeklyCheckin>> {
  let query = api
    .from(WEEKLY_CHECKINS_TABLE)
    .select("*")
    .eq("user_id", user.id)
    .eq("week_of", week_of);
  logged(
    api.fetch_maybe_single(query).await,
    "fetch check-in"
  )
}

async fn fetch_recent(
  api: &Api,
  user: &User,
  limit: usize
) -> Option<Vec<WeeklyCheckin>> {
  let query = api
    .from(WEEKLY_CHECKINS_TABLE)
    .select("*")
    .eq("user_id", user.id)
    .order("week_of", false)
    .limit(limit);
  logged(
    api.fetch(query).await,
    "fetch recent check-ins"
  )
}

#[derive(Clone, PartialEq)]
pub struct WeeklyHandle {
  pub current:    Option<WeeklyCheckin>,
  /// Newest first.
  pub recent:     Vec<WeeklyCheckin>,
  pub is_loading: bool,
  pub is_saving:  bool,
  pub save:       Callback<WeeklyDraft>
}

impl WeeklyHandle {
  pub fn draft(&self) -> WeeklyDraft {
    self
      .current
      .as_ref()
      .map(WeeklyDraft::from_checkin)
      .unwrap_or_default()
  }
}

#[hook]
pub fn use_weekly_checkin(
  week_of: NaiveDate
) -> WeeklyHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let current =
    use_state(|| None::<WeeklyCheckin>);
  let recent =
    use_state(Vec::<WeeklyCheckin>::new);
  let is_loading = use_state(|| true);
  let is_saving = use_state(|| false);

  {
    let current = current.clone();
    let recent = recent.clone();
    let is_loading = is_loading.clone();
    use_effect_with(
      (user.clone(), api.clone(), week_of),
      move |(user, api, week_of)| {
        let user = user.clone();
        let api = api.clone();
        let week_of = *week_of;
        spawn_local(async move {
          if let Some(user) = user {
            if let Some(found) =
              fetch_week(&api, &user, week_of)
                .await
            {
              current.set(found);
            }
            if let Some(rows) = fetch_recent(
              &api,
              &user,
              RECENT_CHECKINS
            )
            .await
            {
              recent.set(rows);
            }
          } else {
            current.set(None);
            recent.set(Vec::new());
          }
          is_loading.set(false);
        });
        || ()
      }
    );
  }

  let save = {
    let current = current.clone();
    let recent = recent.clone();
    let is_saving = is_saving.clone();
    Callback::from(move |draft: WeeklyDraft| {
      let Some(user) = user.clone() else {
        return;
      };
      let current = current.clone();
      let recent = recent.clone();
      let is_saving = is_saving.clone();
      let api = api.clone();
      is_saving.set(true);
      spawn_local(async move {
        let row =
          draft.into_upsert(user.id, week_of);
        if let Some(saved) = logged(
          api
            .upsert_one::<_, WeeklyCheckin>(
              WEEKLY_CHECKINS_TABLE,
              &row,
              "user_id,week_of"
            )
            .await,
          "save check-in"
        ) {
          tracing::info!(
            week_of = %saved.week_of,
            "check-in saved"
          );
          current.set(Some(saved));
          if let Some(rows) = fetch_recent(
            &api,
            &user,
            RECENT_CHECKINS
          )
          .await
          {
            recent.set(rows);
          }
        }
        is_saving.set(false);
      });
    })
  };

  WeeklyHandle {
    current: (*current).clone(),
    recent: (*recent).clone(),
    is_loading: *is_loading,
    is_saving: *is_saving,
    save
  }
}

#[derive(Clone, PartialEq)]
pub struct MonthlyHandle {
  pub current:   Option<MonthlyReview>,
  pub is_saving: bool,
  pub save:      Callback<MonthlyDraft>
}

impl MonthlyHandle {
  pub fn draft(&self) -> MonthlyDraft {
    self
      .current
      .as_ref()
      .map(MonthlyDraft::from_review)
      .unwrap_or_default()
  }
}

#[hook]
pub fn use_monthly_review(
  month_of: NaiveDate
) -> MonthlyHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let current =
    use_state(|| None::<MonthlyReview>);
  let is_saving = use_state(|| false);

  {
    let current = current.clone();
    use_effect_with(
      (user.clone(), api.clone(), month_of),
      move |(user, api, month_of)| {
        let user = user.clone();
        let api = api.clone();
        let month_of = *month_of;
        spawn_local(async move {
          let Some(user) = user else {
            current.set(None);
            return;
          };
          let query = api
            .from(MONTHLY_REVIEWS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .eq("month_of", month_of);
          if let Some(found) = logged(
            api.fetch_maybe_single(query).await,
            "fetch review"
          ) {
            current.set(found);
          }
        });
        || ()
      }
    );
  }

  let save = {
    let current = current.clone();
    let is_saving = is_saving.clone();
    Callback::from(move |draft: MonthlyDraft| {
      let Some(user) = user.clone() else {
        return;
      };
      let current = current.clone();
      let is_saving = is_saving.clone();
      let api = api.clone();
      is_saving.set(true);
      spawn_local(async move {
        let row =
          draft.into_upsert(user.id, month_of);
        if let Some(saved) = logged(
          api
            .upsert_one::<_, MonthlyReview>(
              MONTHLY_REVIEWS_TABLE,
              &row,
              "user_id,month_of"
            )
            .await,
          "save review"
        ) {
          current.set(Some(saved));
        }
        is_saving.set(false);
      });
    })
  };

  MonthlyHandle {
    current: (*current).clone(),
    is_saving: *is_saving,
    save
  }
}

#[derive(Clone, PartialEq)]
pub struct MetricsHandle {
  pub metrics:    WeeklyMetrics,
  pub is_loading: bool
}

#[hook]
pub fn use_weekly_metrics(
  limit: usize
) -> MetricsHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let metrics = use_state(WeeklyMetrics::default);
  let is_loading = use_state(|| true);

  {
    let metrics = metrics.clone();
    let is_loading = is_loading.clone();
    use_effect_with(
      (user, api, limit),
      move |(user, api, limit)| {
        let user = user.clone();
        let api = api.clone();
        let limit = *limit;
        spawn_local(async move {
          if let Some(user) = user {
            if let Some(rows) =
              fetch_recent(&api, &user, limit)
                .await
            {
              metrics.set(
                WeeklyMetrics::from_checkins(
                  rows
                )
              );
            }
          } else {
            metrics.set(WeeklyMetrics::default());
          }
          is_loading.set(false);
        });
        || ()
      }
    );
  }

  MetricsHandle {
    metrics: (*metrics).clone(),
    is_loading: *is_loading
  }
}
