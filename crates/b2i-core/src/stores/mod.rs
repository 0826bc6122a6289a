//! Stateful per-user views over the data store.
//!
//! Each store keeps the local list the front-ends render, fetches it on
//! `load`, and pairs every mutation with a remote write. Without a signed-in
//! user `load` clears the state and mutations do nothing.

mod board;
mod checkin;
mod checklist;
mod goals;
mod settings;

pub use board::BoardStore;
pub use checkin::{DEFAULT_METRICS_LIMIT, MetricsStore, MonthlyReviewStore, WeeklyCheckinStore};
pub use checklist::ChecklistStore;
pub use goals::GoalsStore;
pub use settings::SettingsStore;

use tracing::error;

/// Logs a failed remote call and hands the error back to the caller.
pub(crate) fn logged<T>(result: anyhow::Result<T>, action: &str) -> anyhow::Result<T> {
    if let Err(err) = &result {
        error!(action, error = %format!("{err:#}"), "remote call failed");
    }
    result
}
