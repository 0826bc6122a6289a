//! Data hooks: the same load and mutate
//! rules as the native stores, over the
//! browser transport. Each hook keeps its
//! list in a reducer so async writes
//! apply to the latest state.

mod board;
mod checkin;
mod checklist;
mod goals;
mod settings;

pub use board::{
  BoardHandle,
  use_kanban_board
};
pub use checkin::{
  METRICS_WEEKS,
  MetricsHandle,
  MonthlyHandle,
  WeeklyHandle,
  use_monthly_review,
  use_weekly_checkin,
  use_weekly_metrics
};
pub use checklist::{
  ChecklistHandle,
  use_checklist
};
pub use goals::{
  GoalsHandle,
  use_goals
};
pub use settings::{
  SettingsHandle,
  use_settings
};

use b2i_shared::postgrest::ApiError;

/// Logs a failed remote call; `None`
/// stands for the failure.
pub(crate) fn logged<T>(
  result: Result<T, ApiError>,
  action: &str
) -> Option<T> {
  match result {
    | Ok(value) => Some(value),
    | Err(err) => {
      tracing::error!(
        action,
        error = %err,
        "remote call failed"
      );
      None
    }
  }
}
