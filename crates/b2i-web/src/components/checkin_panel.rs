use b2i_shared::calendar::{
  month_label,
  month_of,
  week_label,
  week_monday
};
use b2i_shared::checkin::{
  ADJUST_PROMPT,
  CheckinKind,
  EQUANIMITY_PROMPT,
  FLAG_PROMPT,
  KEYSTONE_PROMPT,
  MonthlyDraft,
  NEXT_WHY_PROMPT,
  Score,
  ScoreArea,
  TRENDS_PROMPT,
  WeeklyDraft
};
use chrono::NaiveDate;
use web_sys::InputEvent;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html,
  use_effect_with,
  use_state
};

use super::{
  ScorePicker,
  textarea_value
};
use crate::hooks::{
  use_monthly_review,
  use_weekly_checkin
};

#[derive(Properties, PartialEq)]
pub struct CheckinPanelProps {
  pub today: NaiveDate
}

/// The weekly check-in, or the monthly
/// review on the last Friday of the
/// month.
#[function_component(CheckinPanel)]
pub fn checkin_panel(
  props: &CheckinPanelProps
) -> Html {
  let kind = CheckinKind::for_date(props.today);
  html! {
      <section class="panel checkin-panel">
          <div class="panel-header">
              <h2>{ kind.title() }</h2>
              <span class="muted">{ kind.blurb() }</span>
          </div>
          {
              match kind {
                  CheckinKind::Weekly => html! {
                      <WeeklyForm week_of={week_monday(props.today)} />
                  },
                  CheckinKind::Monthly => html! {
                      <MonthlyForm month_of={month_of(props.today)} />
                  },
              }
          }
      </section>
  }
}

fn note_field(
  prompt: &'static str,
  value: String,
  oninput: Callback<InputEvent>
) -> Html {
  html! {
      <label class="note-field">
          <span>{ prompt }</span>
          <textarea rows="3" {value} {oninput} />
      </label>
  }
}

#[derive(Properties, PartialEq)]
struct WeeklyFormProps {
  week_of: NaiveDate
}

#[function_component(WeeklyForm)]
fn weekly_form(
  props: &WeeklyFormProps
) -> Html {
  let checkin =
    use_weekly_checkin(props.week_of);
  let draft = use_state(WeeklyDraft::default);

  {
    let draft = draft.clone();
    use_effect_with(
      checkin.current.clone(),
      move |current| {
        draft.set(
          current
            .as_ref()
            .map(WeeklyDraft::from_checkin)
            .unwrap_or_default()
        );
        || ()
      }
    );
  }

  let on_pick = {
    let draft = draft.clone();
    Callback::from(
      move |(area, score): (ScoreArea, Score)| {
        let mut next = (*draft).clone();
        next.click_score(area, score);
        draft.set(next);
      }
    )
  };

  let on_equanimity = {
    let draft = draft.clone();
    Callback::from(move |event: InputEvent| {
      draft.set(WeeklyDraft {
        equanimity_note: textarea_value(&event),
        ..(*draft).clone()
      })
    })
  };

  let on_flag = {
    let draft = draft.clone();
    Callback::from(move |event: InputEvent| {
      draft.set(WeeklyDraft {
        flag_note: textarea_value(&event),
        ..(*draft).clone()
      })
    })
  };

  let on_save = {
    let draft = draft.clone();
    let save = checkin.save.clone();
    Callback::from(move |_: MouseEvent| {
      save.emit((*draft).clone())
    })
  };

  html! {
      <div class="checkin-form">
          <div class="muted">{ format!("Week of {}", week_label(props.week_of)) }</div>
          {
              for ScoreArea::ALL.iter().map(|area| html! {
                  <ScorePicker
                      area={*area}
                      value={draft.score(*area)}
                      on_pick={on_pick.clone()}
                  />
              })
          }
          { note_field(EQUANIMITY_PROMPT, draft.equanimity_note.clone(), on_equanimity) }
          { note_field(FLAG_PROMPT, draft.flag_note.clone(), on_flag) }
          <button onclick={on_save} disabled={checkin.is_saving}>
              { if checkin.is_saving { "Saving..." } else if checkin.current.is_some() { "Update check-in" } else { "Save check-in" } }
          </button>
          {
              if checkin.recent.is_empty() {
                  html! {}
              } else {
                  html! {
                      <table class="recent-checkins">
                          <thead>
                              <tr>
                                  <th>{ "Week" }</th>
                                  { for ScoreArea::ALL.iter().map(|area| html! { <th>{ area.label() }</th> }) }
                              </tr>
                          </thead>
                          <tbody>
                              {
                                  for checkin.recent.iter().map(|row| html! {
                                      <tr key={row.id.to_string()}>
                                          <td>{ week_label(row.week_of) }</td>
                                          {
                                              for ScoreArea::ALL.iter().map(|area| html! {
                                                  <td>{ area.score_of(row).map(|score| score.to_string()).unwrap_or_else(|| "-".to_string()) }</td>
                                              })
                                          }
                                      </tr>
                                  })
                              }
                          </tbody>
                      </table>
                  }
              }
          }
      </div>
  }
}

#[derive(Properties, PartialEq)]
struct MonthlyFormProps {
  month_of: NaiveDate
}

#[function_component(MonthlyForm)]
fn monthly_form(
  props: &MonthlyFormProps
) -> Html {
  let review =
    use_monthly_review(props.month_of);
  let draft = use_state(MonthlyDraft::default);

  {
    let draft = draft.clone();
    use_effect_with(
      review.current.clone(),
      move |current| {
        draft.set(
          current
            .as_ref()
            .map(MonthlyDraft::from_review)
            .unwrap_or_default()
        );
        || ()
      }
    );
  }

  let field = |edit: fn(&mut MonthlyDraft, String)| {
    let draft = draft.clone();
    Callback::from(move |event: InputEvent| {
      let mut next = (*draft).clone();
      edit(&mut next, textarea_value(&event));
      draft.set(next);
    })
  };

  let on_save = {
    let draft = draft.clone();
    let save = review.save.clone();
    Callback::from(move |_: MouseEvent| {
      save.emit((*draft).clone())
    })
  };

  html! {
      <div class="checkin-form">
          <div class="muted">{ month_label(props.month_of) }</div>
          { note_field(TRENDS_PROMPT, draft.trends_note.clone(), field(|d, v| d.trends_note = v)) }
          { note_field(KEYSTONE_PROMPT, draft.keystone_note.clone(), field(|d, v| d.keystone_note = v)) }
          { note_field(NEXT_WHY_PROMPT, draft.next_why_note.clone(), field(|d, v| d.next_why_note = v)) }
          { note_field(ADJUST_PROMPT, draft.adjust_note.clone(), field(|d, v| d.adjust_note = v)) }
          <button onclick={on_save} disabled={review.is_saving}>
              { if review.is_saving { "Saving..." } else { "Save review" } }
          </button>
      </div>
  }
}
