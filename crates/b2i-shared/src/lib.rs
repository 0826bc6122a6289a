//! Domain types and pure logic shared by
//! the native engine and the web
//! front-end.

pub mod auth;
pub mod board;
pub mod calendar;
pub mod checkin;
pub mod checklist;
pub mod drag;
pub mod model;
pub mod postgrest;

pub use auth::Session;
pub use board::{
  CardDraft,
  CardMove,
  PositionWrite
};
pub use checkin::{
  CheckinKind,
  MonthlyDraft,
  Score,
  ScoreArea,
  WeeklyDraft,
  WeeklyMetrics
};
pub use checklist::Progress;
pub use drag::{
  DragLocation,
  DropResult
};
pub use model::*;
pub use postgrest::{
  ApiError,
  ClientConfig,
  Request,
  Response
};
