use serde::{
  Deserialize,
  Serialize
};

/// Where a dragged item was picked up
/// from or dropped onto: a droppable
/// list and an index inside it.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct DragLocation {
  pub droppable_id: String,
  pub index:        usize
}

impl DragLocation {
  pub fn new(
    droppable_id: impl Into<String>,
    index: usize
  ) -> Self {
    Self {
      droppable_id: droppable_id.into(),
      index
    }
  }
}

/// Outcome of a finished drag gesture.
/// `destination` is `None` when the
/// item was released outside any list.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct DropResult {
  pub draggable_id: String,
  pub source:       DragLocation,
  pub destination:  Option<DragLocation>
}

impl DropResult {
  /// The drop target when the gesture
  /// actually changes something.
  pub fn effective_destination(
    &self
  ) -> Option<&DragLocation> {
    let destination =
      self.destination.as_ref()?;
    if *destination == self.source {
      return None;
    }
    Some(destination)
  }
}
