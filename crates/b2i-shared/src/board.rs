use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

use crate::drag::DropResult;
use crate::model::{
  ColumnId,
  KanbanCard,
  Priority,
  normalize_text
};

/// A card's stored column and position
/// after a move. Only cards whose stored
/// values changed get one.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct PositionWrite {
  pub id:        Uuid,
  pub column_id: ColumnId,
  pub position:  i32
}

/// A move requested by a drop: put the
/// card into `column` at `index`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
pub struct CardMove {
  pub card_id: Uuid,
  pub column:  ColumnId,
  pub index:   usize
}

/// Input of the add-card form.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct CardDraft {
  pub title:     String,
  pub column_id: ColumnId,
  pub due_date:  Option<NaiveDate>,
  pub priority:  Option<Priority>
}

impl CardDraft {
  pub fn new(
    title: impl Into<String>
  ) -> Self {
    Self {
      title:     title.into(),
      column_id: ColumnId::Todo,
      due_date:  None,
      priority:  None
    }
  }

  /// The draft with a trimmed title, or
  /// `None` when the title is blank.
  pub fn normalized(self) -> Option<Self> {
    let title =
      normalize_text(&self.title)?;
    Some(Self { title, ..self })
  }
}

pub fn column_cards(
  cards: &[KanbanCard],
  column: ColumnId
) -> Vec<&KanbanCard> {
  cards
    .iter()
    .filter(|card| {
      card.column_id == column
        && !card.is_archived
    })
    .collect()
}

pub fn archived_cards(
  cards: &[KanbanCard]
) -> Vec<&KanbanCard> {
  cards
    .iter()
    .filter(|card| card.is_archived)
    .collect()
}

/// Position for a card appended to
/// `column`.
pub fn next_position(
  cards: &[KanbanCard],
  column: ColumnId
) -> i32 {
  to_position(
    column_cards(cards, column).len()
  )
}

/// Moves `card_id` into `target` at
/// `target_index` (append when `None`,
/// clamped to the column length).
///
/// The list is rebuilt as every other
/// card in its original order followed
/// by the target column's live cards,
/// and that column is renumbered from
/// zero. On a cross-column move the
/// source column's live cards are
/// renumbered too, so both stay `0..n`.
/// Returns the writes needed to persist
/// the change; the moved card is always
/// among them. `None` when the card is
/// unknown.
pub fn move_card(
  cards: &mut Vec<KanbanCard>,
  card_id: Uuid,
  target: ColumnId,
  target_index: Option<usize>
) -> Option<Vec<PositionWrite>> {
  let idx = cards
    .iter()
    .position(|card| card.id == card_id)?;

  let mut moved = cards.remove(idx);
  let source = moved.column_id;
  moved.column_id = target;

  let (mut target_cards, mut others): (
    Vec<KanbanCard>,
    Vec<KanbanCard>
  ) = cards.drain(..).partition(|card| {
    card.column_id == target
      && !card.is_archived
  });

  let insert_at = target_index
    .unwrap_or(target_cards.len())
    .min(target_cards.len());
  target_cards.insert(insert_at, moved);

  let mut writes = Vec::new();
  for (idx, card) in
    target_cards.iter_mut().enumerate()
  {
    let position = to_position(idx);
    if card.id == card_id
      || card.position != position
    {
      card.position = position;
      writes.push(PositionWrite {
        id: card.id,
        column_id: card.column_id,
        position
      });
    }
  }

  if source != target {
    let source_cards = others
      .iter_mut()
      .filter(|card| {
        card.column_id == source
          && !card.is_archived
      });
    for (idx, card) in
      source_cards.enumerate()
    {
      let position = to_position(idx);
      if card.position != position {
        card.position = position;
        writes.push(PositionWrite {
          id: card.id,
          column_id: card.column_id,
          position
        });
      }
    }
  }

  cards.extend(others);
  cards.extend(target_cards);
  Some(writes)
}

/// Turns a finished drag into a card
/// move. Drops outside a column, drops
/// back onto the starting slot and
/// unparseable ids yield `None`.
pub fn resolve_card_drop(
  drop: &DropResult
) -> Option<CardMove> {
  let destination =
    drop.effective_destination()?;
  let card_id = Uuid::parse_str(
    drop.draggable_id.trim()
  )
  .ok()?;
  let column = destination
    .droppable_id
    .parse::<ColumnId>()
    .ok()?;
  Some(CardMove {
    card_id,
    column,
    index: destination.index
  })
}

fn to_position(idx: usize) -> i32 {
  i32::try_from(idx).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::drag::DragLocation;

  fn card(
    n: u128,
    column: ColumnId,
    position: i32
  ) -> KanbanCard {
    KanbanCard {
      id: Uuid::from_u128(n),
      title: format!("card {n}"),
      description: None,
      column_id: column,
      priority: None,
      due_date: None,
      is_archived: false,
      position,
      created_at: Utc
        .with_ymd_and_hms(
          2026, 1, 5, 9, 0, 0
        )
        .single()
        .expect("valid timestamp")
    }
  }

  fn ids(cards: &[&KanbanCard]) -> Vec<u128> {
    cards
      .iter()
      .map(|card| card.id.as_u128())
      .collect()
  }

  fn sample_board() -> Vec<KanbanCard> {
    vec![
      card(1, ColumnId::Todo, 0),
      card(2, ColumnId::Todo, 1),
      card(3, ColumnId::InProgress, 0),
      card(4, ColumnId::Todo, 2),
    ]
  }

  #[test]
  fn moves_card_across_columns_at_index() {
    let mut cards = sample_board();

    let writes = move_card(
      &mut cards,
      Uuid::from_u128(2),
      ColumnId::InProgress,
      Some(0)
    )
    .expect("card exists");

    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::InProgress
      )),
      vec![2, 3]
    );
    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::Todo
      )),
      vec![1, 4]
    );
    assert_eq!(
      writes,
      vec![
        PositionWrite {
          id:        Uuid::from_u128(2),
          column_id: ColumnId::InProgress,
          position:  0
        },
        PositionWrite {
          id:        Uuid::from_u128(3),
          column_id: ColumnId::InProgress,
          position:  1
        },
        PositionWrite {
          id:        Uuid::from_u128(4),
          column_id: ColumnId::Todo,
          position:  1
        },
      ]
    );
  }

  fn positions(
    cards: &[KanbanCard],
    column: ColumnId
  ) -> Vec<i32> {
    column_cards(cards, column)
      .iter()
      .map(|card| card.position)
      .collect()
  }

  #[test]
  fn both_columns_stay_dense_after_move_and_add()
  {
    let mut cards = vec![
      card(1, ColumnId::Todo, 0),
      card(2, ColumnId::Todo, 1),
      card(3, ColumnId::Todo, 2),
    ];
    move_card(
      &mut cards,
      Uuid::from_u128(1),
      ColumnId::Complete,
      None
    )
    .expect("card exists");

    let position =
      next_position(&cards, ColumnId::Todo);
    cards.push(card(
      4,
      ColumnId::Todo,
      position
    ));

    assert_eq!(
      positions(&cards, ColumnId::Todo),
      vec![0, 1, 2]
    );
    assert_eq!(
      positions(&cards, ColumnId::Complete),
      vec![0]
    );
  }

  #[test]
  fn reorders_within_column() {
    let mut cards = sample_board();

    move_card(
      &mut cards,
      Uuid::from_u128(1),
      ColumnId::Todo,
      Some(2)
    )
    .expect("card exists");

    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::Todo
      )),
      vec![2, 4, 1]
    );
    let positions: Vec<i32> =
      column_cards(&cards, ColumnId::Todo)
        .iter()
        .map(|card| card.position)
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);
  }

  #[test]
  fn missing_index_appends_and_large_index_clamps()
  {
    let mut cards = sample_board();
    move_card(
      &mut cards,
      Uuid::from_u128(3),
      ColumnId::Todo,
      None
    )
    .expect("card exists");
    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::Todo
      )),
      vec![1, 2, 4, 3]
    );

    move_card(
      &mut cards,
      Uuid::from_u128(1),
      ColumnId::Complete,
      Some(40)
    )
    .expect("card exists");
    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::Complete
      )),
      vec![1]
    );
  }

  #[test]
  fn unknown_card_leaves_board_untouched() {
    let mut cards = sample_board();
    let before = cards.clone();
    assert_eq!(
      move_card(
        &mut cards,
        Uuid::from_u128(99),
        ColumnId::Complete,
        Some(0)
      ),
      None
    );
    assert_eq!(cards, before);
  }

  #[test]
  fn archived_cards_stay_out_of_columns() {
    let mut cards = sample_board();
    cards[1].is_archived = true;

    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::Todo
      )),
      vec![1, 4]
    );
    assert_eq!(
      ids(&archived_cards(&cards)),
      vec![2]
    );
    assert_eq!(
      next_position(&cards, ColumnId::Todo),
      2
    );

    move_card(
      &mut cards,
      Uuid::from_u128(4),
      ColumnId::Todo,
      Some(0)
    )
    .expect("card exists");
    assert_eq!(
      ids(&column_cards(
        &cards,
        ColumnId::Todo
      )),
      vec![4, 1]
    );
    assert!(
      cards
        .iter()
        .any(|card| card.is_archived)
    );
  }

  #[test]
  fn drop_resolution() {
    let card_id = Uuid::from_u128(7);
    let mut drop = DropResult {
      draggable_id: card_id.to_string(),
      source:       DragLocation::new(
        "todo", 1
      ),
      destination:  None
    };
    assert_eq!(
      resolve_card_drop(&drop),
      None
    );

    drop.destination =
      Some(DragLocation::new("todo", 1));
    assert_eq!(
      resolve_card_drop(&drop),
      None
    );

    drop.destination = Some(
      DragLocation::new("in-progress", 1)
    );
    assert_eq!(
      resolve_card_drop(&drop),
      Some(CardMove {
        card_id,
        column: ColumnId::InProgress,
        index: 1
      })
    );

    drop.destination =
      Some(DragLocation::new("trash", 0));
    assert_eq!(
      resolve_card_drop(&drop),
      None
    );
  }

  #[test]
  fn blank_draft_titles_are_rejected() {
    assert_eq!(
      CardDraft::new("   ").normalized(),
      None
    );
    assert_eq!(
      CardDraft::new("  Plan sprint ")
        .normalized()
        .map(|draft| draft.title),
      Some("Plan sprint".to_string())
    );
  }
}
