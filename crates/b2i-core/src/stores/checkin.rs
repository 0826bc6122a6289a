use anyhow::Context;
use b2i_shared::checkin::{MonthlyDraft, WeeklyDraft, WeeklyMetrics};
use b2i_shared::model::{
    MONTHLY_REVIEWS_TABLE, MonthlyReview, User, WEEKLY_CHECKINS_TABLE, WeeklyCheckin,
};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use super::logged;
use crate::backend::Client;

/// The current week's check-in plus the most recent ones.
#[derive(Debug)]
pub struct WeeklyCheckinStore {
    client: Client,
    user: Option<User>,
    current: Option<WeeklyCheckin>,
    recent: Vec<WeeklyCheckin>,
    recent_count: usize,
    is_loading: bool,
}

impl WeeklyCheckinStore {
    pub fn new(client: Client, user: Option<User>, recent_count: usize) -> Self {
        Self {
            client,
            user,
            current: None,
            recent: Vec::new(),
            recent_count,
            is_loading: true,
        }
    }

    pub fn current(&self) -> Option<&WeeklyCheckin> {
        self.current.as_ref()
    }

    /// Newest first.
    pub fn recent(&self) -> &[WeeklyCheckin] {
        &self.recent
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The form state for the current week, blank when nothing is saved.
    pub fn draft(&self) -> WeeklyDraft {
        self.current
            .as_ref()
            .map(WeeklyDraft::from_checkin)
            .unwrap_or_default()
    }

    #[instrument(skip(self))]
    pub fn load(&mut self, week_of: NaiveDate) -> anyhow::Result<()> {
        if self.user.is_none() {
            self.current = None;
            self.recent.clear();
            self.is_loading = false;
            return Ok(());
        }

        let result = self
            .fetch(week_of)
            .and_then(|current| Ok((current, self.fetch_recent()?)));
        self.is_loading = false;
        let (current, recent) = logged(result, "load weekly check-ins")?;
        self.current = current;
        self.recent = recent;
        debug!(
            has_current = self.current.is_some(),
            recent = self.recent.len(),
            "weekly check-ins loaded"
        );
        Ok(())
    }

    /// The saved check-in for `week_of`, if any.
    pub fn fetch(&self, week_of: NaiveDate) -> anyhow::Result<Option<WeeklyCheckin>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let query = self
            .client
            .from(WEEKLY_CHECKINS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .eq("week_of", week_of);
        self.client.fetch_maybe_single(query)
    }

    fn fetch_recent(&self) -> anyhow::Result<Vec<WeeklyCheckin>> {
        let Some(user) = &self.user else {
            return Ok(Vec::new());
        };
        let query = self
            .client
            .from(WEEKLY_CHECKINS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("week_of", false)
            .limit(self.recent_count);
        self.client.fetch(query)
    }

    /// Upserts the week's entry, then refreshes the recent list.
    #[instrument(skip(self, draft))]
    pub fn save(
        &mut self,
        draft: WeeklyDraft,
        week_of: NaiveDate,
    ) -> anyhow::Result<Option<WeeklyCheckin>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let row = draft.into_upsert(user.id, week_of);

        let result = self
            .client
            .upsert_one(WEEKLY_CHECKINS_TABLE, &row, "user_id,week_of")
            .context("failed saving weekly check-in");
        let saved: WeeklyCheckin = logged(result, "save weekly check-in")?;
        info!(week = %week_of, "weekly check-in saved");
        self.current = Some(saved.clone());

        self.recent = logged(self.fetch_recent(), "refresh weekly check-ins")?;
        Ok(Some(saved))
    }
}

#[derive(Debug)]
pub struct MonthlyReviewStore {
    client: Client,
    user: Option<User>,
    current: Option<MonthlyReview>,
}

impl MonthlyReviewStore {
    pub fn new(client: Client, user: Option<User>) -> Self {
        Self {
            client,
            user,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&MonthlyReview> {
        self.current.as_ref()
    }

    pub fn draft(&self) -> MonthlyDraft {
        self.current
            .as_ref()
            .map(MonthlyDraft::from_review)
            .unwrap_or_default()
    }

    #[instrument(skip(self))]
    pub fn fetch(&mut self, month_of: NaiveDate) -> anyhow::Result<Option<MonthlyReview>> {
        let Some(user) = &self.user else {
            self.current = None;
            return Ok(None);
        };
        let query = self
            .client
            .from(MONTHLY_REVIEWS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .eq("month_of", month_of);
        self.current = logged(
            self.client.fetch_maybe_single(query),
            "fetch monthly review",
        )?;
        Ok(self.current.clone())
    }

    #[instrument(skip(self, draft))]
    pub fn save(
        &mut self,
        draft: MonthlyDraft,
        month_of: NaiveDate,
    ) -> anyhow::Result<Option<MonthlyReview>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let row = draft.into_upsert(user.id, month_of);

        let result = self
            .client
            .upsert_one(MONTHLY_REVIEWS_TABLE, &row, "user_id,month_of")
            .context("failed saving monthly review");
        let saved: MonthlyReview = logged(result, "save monthly review")?;
        info!(month = %month_of, "monthly review saved");
        self.current = Some(saved.clone());
        Ok(Some(saved))
    }
}

/// Check-ins the metrics view reads when no count is given.
pub const DEFAULT_METRICS_LIMIT: usize = 8;

/// Aggregates over the most recent weekly check-ins.
#[derive(Debug)]
pub struct MetricsStore {
    client: Client,
    user: Option<User>,
    metrics: WeeklyMetrics,
    is_loading: bool,
}

impl MetricsStore {
    pub fn new(client: Client, user: Option<User>) -> Self {
        Self {
            client,
            user,
            metrics: WeeklyMetrics::from_checkins(Vec::new()),
            is_loading: true,
        }
    }

    pub fn metrics(&self) -> &WeeklyMetrics {
        &self.metrics
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[instrument(skip(self))]
    pub fn load(&mut self, weeks: Option<usize>) -> anyhow::Result<()> {
        let Some(user) = &self.user else {
            self.metrics = WeeklyMetrics::from_checkins(Vec::new());
            self.is_loading = false;
            return Ok(());
        };
        let query = self
            .client
            .from(WEEKLY_CHECKINS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("week_of", false)
            .limit(weeks.unwrap_or(DEFAULT_METRICS_LIMIT));
        let result = logged(self.client.fetch(query), "fetch metrics");
        self.is_loading = false;
        self.metrics = WeeklyMetrics::from_checkins(result?);
        debug!(
            weeks = self.metrics.checkins.len(),
            streak = self.metrics.streak,
            "metrics loaded"
        );
        Ok(())
    }
}
