use anyhow::Context;
use b2i_shared::board::{self, CardDraft, PositionWrite};
use b2i_shared::drag::DropResult;
use b2i_shared::model::{CardPatch, ColumnId, KANBAN_CARDS_TABLE, KanbanCard, NewKanbanCard, User};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::logged;
use crate::backend::Client;

#[derive(Debug)]
pub struct BoardStore {
    client: Client,
    user: Option<User>,
    cards: Vec<KanbanCard>,
    is_loading: bool,
}

impl BoardStore {
    pub fn new(client: Client, user: Option<User>) -> Self {
        Self {
            client,
            user,
            cards: Vec::new(),
            is_loading: true,
        }
    }

    pub fn cards(&self) -> &[KanbanCard] {
        &self.cards
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn find(&self, id: Uuid) -> Option<&KanbanCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn column_cards(&self, column: ColumnId) -> Vec<&KanbanCard> {
        board::column_cards(&self.cards, column)
    }

    pub fn archived_cards(&self) -> Vec<&KanbanCard> {
        board::archived_cards(&self.cards)
    }

    #[instrument(skip(self))]
    pub fn load(&mut self) -> anyhow::Result<()> {
        let Some(user) = &self.user else {
            self.cards.clear();
            self.is_loading = false;
            return Ok(());
        };

        let query = self
            .client
            .from(KANBAN_CARDS_TABLE)
            .select("*")
            .eq("user_id", user.id)
            .order("position", true);
        let result = logged(self.client.fetch(query), "fetch cards");
        self.is_loading = false;
        self.cards = result?;
        debug!(count = self.cards.len(), "cards loaded");
        Ok(())
    }

    /// Appends a card to the end of its column. Blank titles are ignored.
    #[instrument(skip(self, draft), fields(column = %draft.column_id))]
    pub fn add(&mut self, draft: CardDraft) -> anyhow::Result<Option<KanbanCard>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let Some(draft) = draft.normalized() else {
            return Ok(None);
        };

        let row = NewKanbanCard {
            user_id: user.id,
            title: draft.title,
            column_id: draft.column_id,
            priority: draft.priority,
            due_date: draft.due_date,
            position: board::next_position(&self.cards, draft.column_id),
        };
        let card: KanbanCard = logged(
            self.client
                .insert_one(KANBAN_CARDS_TABLE, &row)
                .context("failed adding card"),
            "add card",
        )?;
        info!(card = %card.id, position = card.position, "card added");
        self.cards.push(card.clone());
        Ok(Some(card))
    }

    /// Writes `patch` and merges it locally once the store accepted it.
    #[instrument(skip(self, patch))]
    pub fn update(&mut self, id: Uuid, patch: CardPatch) -> anyhow::Result<bool> {
        if self.user.is_none() || self.find(id).is_none() || patch.is_empty() {
            return Ok(false);
        }
        if let Some(title) = &patch.title
            && title.trim().is_empty()
        {
            return Ok(false);
        }

        let query = self
            .client
            .from(KANBAN_CARDS_TABLE)
            .update(&patch)?
            .eq("id", id);
        logged(self.client.execute(query), "update card")?;
        if let Some(card) = self.cards.iter_mut().find(|card| card.id == id) {
            patch.apply(card);
        }
        debug!(card = %id, "card updated");
        Ok(true)
    }

    pub fn archive(&mut self, id: Uuid) -> anyhow::Result<bool> {
        self.update(id, CardPatch::archived(true))
    }

    pub fn unarchive(&mut self, id: Uuid) -> anyhow::Result<bool> {
        self.update(id, CardPatch::archived(false))
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: Uuid) -> anyhow::Result<bool> {
        if self.user.is_none() || self.find(id).is_none() {
            return Ok(false);
        }
        logged(
            self.client.delete(KANBAN_CARDS_TABLE, "id", id),
            "delete card",
        )?;
        self.cards.retain(|card| card.id != id);
        info!(card = %id, "card deleted");
        Ok(true)
    }

    /// Moves a card locally right away, then persists the changed columns
    /// and positions. A failed write is logged and the local order stays.
    #[instrument(skip(self))]
    pub fn move_card(
        &mut self,
        id: Uuid,
        column: ColumnId,
        index: Option<usize>,
    ) -> anyhow::Result<bool> {
        if self.user.is_none() {
            return Ok(false);
        }
        let Some(writes) = board::move_card(&mut self.cards, id, column, index) else {
            return Ok(false);
        };
        debug!(writes = writes.len(), "card moved locally");

        for write in &writes {
            logged(self.persist_position(write), "move card")?;
        }
        info!(card = %id, %column, "card moved");
        Ok(true)
    }

    /// Applies a finished drag; drops that change nothing are ignored.
    pub fn apply_drop(&mut self, drop: &DropResult) -> anyhow::Result<bool> {
        match board::resolve_card_drop(drop) {
            Some(card_move) => {
                self.move_card(card_move.card_id, card_move.column, Some(card_move.index))
            }
            None => Ok(false),
        }
    }

    fn persist_position(&self, write: &PositionWrite) -> anyhow::Result<()> {
        let patch = CardPatch {
            column_id: Some(write.column_id),
            position: Some(write.position),
            ..CardPatch::default()
        };
        self.client
            .update(KANBAN_CARDS_TABLE, &patch, "id", write.id)
    }
}
