mod about_dialog;
mod app_header;
mod checkin_panel;
mod checklist_panel;
mod footer_bar;
mod goals_panel;
mod kanban_board;
mod kanban_card;
mod kanban_column;
mod login_page;
mod metrics_page;
mod score_picker;

pub use about_dialog::AboutDialog;
pub use app_header::AppHeader;
pub use checkin_panel::CheckinPanel;
pub use checklist_panel::ChecklistPanel;
pub use footer_bar::FooterBar;
pub use goals_panel::GoalsPanel;
pub use kanban_board::KanbanBoard;
pub use kanban_card::KanbanCardView;
pub use kanban_column::KanbanColumn;
pub use login_page::LoginPage;
pub use metrics_page::MetricsPage;
pub use score_picker::ScorePicker;

use web_sys::{
  Event,
  HtmlInputElement,
  HtmlSelectElement,
  HtmlTextAreaElement,
  InputEvent
};
use yew::TargetCast;

pub(crate) fn input_value(
  event: &InputEvent
) -> String {
  event
    .target_unchecked_into::<HtmlInputElement>()
    .value()
}

pub(crate) fn textarea_value(
  event: &InputEvent
) -> String {
  event
    .target_unchecked_into::<HtmlTextAreaElement>()
    .value()
}

pub(crate) fn select_value(
  event: &Event
) -> String {
  event
    .target_unchecked_into::<HtmlSelectElement>()
    .value()
}
