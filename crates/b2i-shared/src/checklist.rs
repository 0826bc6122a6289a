use uuid::Uuid;

use crate::drag::DropResult;
use crate::model::ChecklistItem;

/// Friday shutdown items seeded for a
/// user with an empty checklist.
pub const DEFAULT_ITEMS: [&str; 12] = [
  "Inbox Zero",
  "Paperbox Zero",
  "Review last week calendar - Notebook",
  "Review task list and reassign",
  "Preview calendar for conflicts",
  "Review To Do: Does anything need to \
   move to In Progress?",
  "Review In Progress: What is next \
   step? Place on calendar/to-do list",
  "Place \"big rocks\" on calendar",
  "Schedule Lunch",
  "Schedule workouts",
  "Send A9/ALT call for agenda items",
  "Make weekend list if necessary"
];

/// Removes the element at `start` and
/// reinserts it at `end` (clamped).
/// Returns `false` and leaves the list
/// alone when `start` is out of range.
pub fn reorder<T>(
  items: &mut Vec<T>,
  start: usize,
  end: usize
) -> bool {
  if start >= items.len() {
    return false;
  }
  let item = items.remove(start);
  let end = end.min(items.len());
  items.insert(end, item);
  true
}

/// Position writes for every item, in
/// list order.
pub fn renumber(
  items: &[ChecklistItem]
) -> Vec<(Uuid, i32)> {
  items
    .iter()
    .enumerate()
    .map(|(idx, item)| {
      (
        item.id,
        i32::try_from(idx)
          .unwrap_or(i32::MAX)
      )
    })
    .collect()
}

/// `(source, destination)` indices of a
/// checklist drop, or `None` when the
/// item went nowhere.
pub fn resolve_item_drop(
  drop: &DropResult
) -> Option<(usize, usize)> {
  let destination =
    drop.destination.as_ref()?;
  if destination.index == drop.source.index
  {
    return None;
  }
  Some((drop.source.index, destination.index))
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct Progress {
  pub completed: usize,
  pub total:     usize
}

impl Progress {
  pub fn of(
    items: &[ChecklistItem]
  ) -> Self {
    Self {
      completed: items
        .iter()
        .filter(|item| item.is_checked)
        .count(),
      total:     items.len()
    }
  }

  pub fn percent(self) -> f64 {
    if self.total == 0 {
      return 0.0;
    }
    self.completed as f64
      / self.total as f64
      * 100.0
  }

  pub fn rounded(self) -> u32 {
    self.percent().round() as u32
  }

  pub fn is_complete(self) -> bool {
    self.total > 0
      && self.completed == self.total
  }
}

#[cfg(test)]
mod tests {
  use chrono::DateTime;
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::drag::DragLocation;

  fn item(
    n: u128,
    checked: bool
  ) -> ChecklistItem {
    ChecklistItem {
      id: Uuid::from_u128(n),
      label: format!("item {n}"),
      is_checked: checked,
      position: 0,
      created_at: DateTime::default()
    }
  }

  #[test]
  fn reorder_splices() {
    let mut items =
      vec!['a', 'b', 'c', 'd'];
    assert!(reorder(&mut items, 0, 2));
    assert_eq!(
      items,
      vec!['b', 'c', 'a', 'd']
    );

    assert!(reorder(&mut items, 3, 0));
    assert_eq!(
      items,
      vec!['d', 'b', 'c', 'a']
    );

    assert!(reorder(&mut items, 1, 99));
    assert_eq!(
      items,
      vec!['d', 'c', 'a', 'b']
    );

    assert!(!reorder(&mut items, 4, 0));
    assert_eq!(
      items,
      vec!['d', 'c', 'a', 'b']
    );
  }

  #[test]
  fn renumber_follows_list_order() {
    let items =
      vec![item(3, false), item(1, true)];
    assert_eq!(
      renumber(&items),
      vec![
        (Uuid::from_u128(3), 0),
        (Uuid::from_u128(1), 1),
      ]
    );
  }

  #[test]
  fn item_drop_needs_a_new_index() {
    let mut drop = DropResult {
      draggable_id: "x".to_string(),
      source:       DragLocation::new(
        "checklist",
        2
      ),
      destination:  None
    };
    assert_eq!(
      resolve_item_drop(&drop),
      None
    );
    drop.destination = Some(
      DragLocation::new("checklist", 2)
    );
    assert_eq!(
      resolve_item_drop(&drop),
      None
    );
    drop.destination = Some(
      DragLocation::new("checklist", 0)
    );
    assert_eq!(
      resolve_item_drop(&drop),
      Some((2, 0))
    );
  }

  #[test]
  fn progress_counts_checked_items() {
    let empty = Progress::of(&[]);
    assert_eq!(empty.percent(), 0.0);
    assert!(!empty.is_complete());

    let items = vec![
      item(1, true),
      item(2, false),
      item(3, false),
    ];
    let progress = Progress::of(&items);
    assert_eq!(
      progress,
      Progress {
        completed: 1,
        total:     3
      }
    );
    assert_eq!(progress.rounded(), 33);
    assert!(!progress.is_complete());

    let done = Progress::of(&[
      item(1, true),
      item(2, true),
    ]);
    assert_eq!(done.rounded(), 100);
    assert!(done.is_complete());
  }

  #[test]
  fn twelve_default_items() {
    assert_eq!(DEFAULT_ITEMS.len(), 12);
    assert_eq!(
      DEFAULT_ITEMS[7],
      "Place \"big rocks\" on calendar"
    );
    assert_eq!(
      DEFAULT_ITEMS[5],
      "Review To Do: Does anything need \
       to move to In Progress?"
    );
  }
}
