//! HTML5 drag events mapped onto the
//! shared `DropResult`.

use b2i_shared::drag::{
  DragLocation,
  DropResult
};
use serde::{
  Deserialize,
  Serialize
};
use web_sys::DragEvent;

const DRAG_FORMAT: &str = "text/plain";

#[derive(Serialize, Deserialize)]
struct DragPayload {
  draggable_id: String,
  source:       DragLocation
}

/// Records what is being dragged and
/// where it was picked up.
pub fn start_drag(
  event: &DragEvent,
  draggable_id: String,
  source: DragLocation
) {
  let Some(data_transfer) =
    event.data_transfer()
  else {
    return;
  };
  let payload = DragPayload {
    draggable_id,
    source
  };
  match serde_json::to_string(&payload) {
    | Ok(raw) => {
      let _ =
        data_transfer.set_data(DRAG_FORMAT, &raw);
      data_transfer.set_effect_allowed("move");
    }
    | Err(err) => {
      tracing::warn!(
        error = %err,
        "failed encoding drag payload"
      )
    }
  }
}

/// Lets the element accept drops.
pub fn allow_drop(event: &DragEvent) {
  event.prevent_default();
  if let Some(data_transfer) =
    event.data_transfer()
  {
    data_transfer.set_drop_effect("move");
  }
}

/// Completes a drag released over
/// `destination`.
pub fn finish_drop(
  event: &DragEvent,
  destination: DragLocation
) -> Option<DropResult> {
  event.prevent_default();
  event.stop_propagation();
  let raw = event
    .data_transfer()?
    .get_data(DRAG_FORMAT)
    .ok()?;
  match serde_json::from_str::<DragPayload>(
    &raw
  ) {
    | Ok(payload) => Some(DropResult {
      draggable_id: payload.draggable_id,
      source:       payload.source,
      destination:  Some(destination)
    }),
    | Err(err) => {
      tracing::warn!(
        error = %err,
        "ignoring drop with unknown payload"
      );
      None
    }
  }
}
