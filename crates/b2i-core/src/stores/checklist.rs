use anyhow::Context;
use b2i_shared::checklist::{self, DEFAULT_ITEMS, Progress};
use b2i_shared::drag::DropResult;
use b2i_shared::model::{CHECKLIST_ITEMS_TABLE, ChecklistItem, NewChecklistItem, User, normalize_text};
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::logged;
use crate::backend::Client;

#[derive(Debug)]
pub struct ChecklistStore {
    client: Client,
    user: Option<User>,
    items: Vec<ChecklistItem>,
    is_loading: bool,
    initialized: bool,
}

impl ChecklistStore {
    pub fn new(client: Client, user: Option<User>) -> Self {
        Self {
            client,
            user,
            items: Vec::new(),
            is_loading: true,
            initialized: false,
        }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.items)
    }

    pub fn find(&self, id: Uuid) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Fetches the user's items. The first load of an empty checklist seeds
    /// the default shutdown items; later loads never seed again.
    #[instrument(skip(self))]
    pub fn load(&mut self) -> anyhow::Result<()> {
        let Some(user) = self.user.clone() else {
            self.items.clear();
            self.is_loading = false;
            self.initialized = false;
            return Ok(());
        };

        let query = self
            .client
            .from(CHECKLIST_ITEMS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("position", true);
        let fetched: Vec<ChecklistItem> = match logged(self.client.fetch(query), "fetch checklist")
        {
            Ok(items) => items,
            Err(err) => {
                self.is_loading = false;
                return Err(err);
            }
        };

        let first_load = !self.initialized;
        self.initialized = true;
        if fetched.is_empty() && first_load {
            let result = logged(self.seed_defaults(&user), "seed checklist");
            self.is_loading = false;
            self.items = result?;
            info!(count = self.items.len(), "seeded default checklist");
            return Ok(());
        }

        self.items = fetched;
        self.is_loading = false;
        debug!(count = self.items.len(), "checklist loaded");
        Ok(())
    }

    fn seed_defaults(&self, user: &User) -> anyhow::Result<Vec<ChecklistItem>> {
        let rows: Vec<NewChecklistItem> = DEFAULT_ITEMS
            .iter()
            .zip(0_i32..)
            .map(|(label, position)| NewChecklistItem {
                user_id: user.id,
                label: (*label).to_string(),
                is_checked: false,
                position,
            })
            .collect();
        let mut items: Vec<ChecklistItem> = self
            .client
            .insert_many(CHECKLIST_ITEMS_TABLE, &rows)
            .context("failed creating default checklist")?;
        items.sort_by_key(|item| item.position);
        Ok(items)
    }

    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: Uuid) -> anyhow::Result<bool> {
        let Some(checked) = self.find(id).map(|item| item.is_checked) else {
            return Ok(false);
        };
        let query = self
            .client
            .from(CHECKLIST_ITEMS_TABLE)
            .update(&json!({ "is_checked": !checked }))?
            .eq("id", id);
        logged(self.client.execute(query), "toggle item")?;
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.is_checked = !checked;
        }
        Ok(true)
    }

    /// Appends an item; blank labels are ignored.
    #[instrument(skip(self))]
    pub fn add(&mut self, label: &str) -> anyhow::Result<Option<ChecklistItem>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let Some(label) = normalize_text(label) else {
            return Ok(None);
        };
        let row = NewChecklistItem {
            user_id: user.id,
            label,
            is_checked: false,
            position: i32::try_from(self.items.len()).unwrap_or(i32::MAX),
        };
        let item: ChecklistItem = logged(
            self.client
                .insert_one(CHECKLIST_ITEMS_TABLE, &row)
                .context("failed adding checklist item"),
            "add item",
        )?;
        self.items.push(item.clone());
        Ok(Some(item))
    }

    #[instrument(skip(self))]
    pub fn remove(&mut self, id: Uuid) -> anyhow::Result<bool> {
        if self.find(id).is_none() {
            return Ok(false);
        }
        logged(
            self.client.delete(CHECKLIST_ITEMS_TABLE, "id", id),
            "remove item",
        )?;
        self.items.retain(|item| item.id != id);
        Ok(true)
    }

    /// Unchecks every item of the user in one write.
    #[instrument(skip(self))]
    pub fn reset_all(&mut self) -> anyhow::Result<bool> {
        let Some(user) = &self.user else {
            return Ok(false);
        };
        let query = self
            .client
            .from(CHECKLIST_ITEMS_TABLE)
            .update(&json!({ "is_checked": false }))?
            .eq("user_id", user.id);
        logged(self.client.execute(query), "reset checklist")?;
        for item in &mut self.items {
            item.is_checked = false;
        }
        info!(count = self.items.len(), "checklist reset");
        Ok(true)
    }

    /// Moves the item at `start` to `end` locally, then writes every
    /// position in order.
    #[instrument(skip(self))]
    pub fn reorder(&mut self, start: usize, end: usize) -> anyhow::Result<bool> {
        if self.user.is_none() || !checklist::reorder(&mut self.items, start, end) {
            return Ok(false);
        }
        let writes = checklist::renumber(&self.items);
        for (item, (_, position)) in self.items.iter_mut().zip(&writes) {
            item.position = *position;
        }
        for (id, position) in writes {
            let patch = json!({ "position": position });
            logged(
                self.client.update(CHECKLIST_ITEMS_TABLE, &patch, "id", id),
                "reorder checklist",
            )?;
        }
        debug!(start, end, "checklist reordered");
        Ok(true)
    }

    pub fn apply_drop(&mut self, drop: &DropResult) -> anyhow::Result<bool> {
        match checklist::resolve_item_drop(drop) {
            Some((start, end)) => self.reorder(start, end),
            None => Ok(false),
        }
    }
}
