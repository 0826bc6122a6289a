use anyhow::Context;
use b2i_shared::model::{GOALS_TABLE, Goal, GoalPatch, NewGoal, User, normalize_text};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::logged;
use crate::backend::Client;

#[derive(Debug)]
pub struct GoalsStore {
    client: Client,
    user: Option<User>,
    goals: Vec<Goal>,
    is_loading: bool,
}

impl GoalsStore {
    pub fn new(client: Client, user: Option<User>) -> Self {
        Self {
            client,
            user,
            goals: Vec::new(),
            is_loading: true,
        }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn find(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    #[instrument(skip(self))]
    pub fn load(&mut self) -> anyhow::Result<()> {
        let Some(user) = &self.user else {
            self.goals.clear();
            self.is_loading = false;
            return Ok(());
        };

        let query = self
            .client
            .from(GOALS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("created_at", true);
        let result = logged(self.client.fetch(query), "fetch goals");
        self.is_loading = false;
        self.goals = result?;
        debug!(count = self.goals.len(), "goals loaded");
        Ok(())
    }

    /// Adds a goal; blank titles are ignored.
    #[instrument(skip(self))]
    pub fn add(&mut self, title: &str) -> anyhow::Result<Option<Goal>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let Some(title) = normalize_text(title) else {
            return Ok(None);
        };

        let row = NewGoal {
            user_id: user.id,
            title,
        };
        let goal: Goal = logged(
            self.client
                .insert_one(GOALS_TABLE, &row)
                .context("failed adding goal"),
            "add goal",
        )?;
        info!(goal = %goal.id, "goal added");
        self.goals.push(goal.clone());
        Ok(Some(goal))
    }

    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: Uuid) -> anyhow::Result<bool> {
        let Some(current) = self.find(id).map(|goal| goal.is_completed) else {
            return Ok(false);
        };
        self.patch(
            id,
            GoalPatch {
                is_completed: Some(!current),
                ..GoalPatch::default()
            },
        )
    }

    #[instrument(skip(self))]
    pub fn rename(&mut self, id: Uuid, title: &str) -> anyhow::Result<bool> {
        let Some(title) = normalize_text(title) else {
            return Ok(false);
        };
        self.patch(
            id,
            GoalPatch {
                title: Some(title),
                ..GoalPatch::default()
            },
        )
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: Uuid) -> anyhow::Result<bool> {
        if self.user.is_none() || self.find(id).is_none() {
            return Ok(false);
        }
        logged(self.client.delete(GOALS_TABLE, "id", id), "delete goal")?;
        self.goals.retain(|goal| goal.id != id);
        info!(goal = %id, "goal deleted");
        Ok(true)
    }

    fn patch(&mut self, id: Uuid, patch: GoalPatch) -> anyhow::Result<bool> {
        if self.user.is_none() || self.find(id).is_none() {
            return Ok(false);
        }
        logged(
            self.client.update(GOALS_TABLE, &patch, "id", id),
            "update goal",
        )?;
        if let Some(goal) = self.goals.iter_mut().find(|goal| goal.id == id) {
            patch.apply(goal);
        }
        debug!(goal = %id, "goal updated");
        Ok(true)
    }
}
