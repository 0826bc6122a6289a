use b2i_shared::calendar::week_label;
use b2i_shared::checkin::{
  DatedNote,
  ScoreArea,
  ScoreTone
};
use yew::{
  Html,
  classes,
  function_component,
  html
};

use crate::hooks::{
  METRICS_WEEKS,
  use_weekly_metrics
};

fn notes_list(
  title: &str,
  notes: Vec<DatedNote>
) -> Html {
  html! {
      <section class="panel notes-panel">
          <h3>{ title }</h3>
          {
              if notes.is_empty() {
                  html! { <div class="muted">{ "Nothing recorded yet." }</div> }
              } else {
                  html! {
                      <ul>
                          {
                              for notes.into_iter().map(|note| html! {
                                  <li>
                                      <span class="muted">{ week_label(note.week_of) }</span>
                                      { " " }
                                      { note.note }
                                  </li>
                              })
                          }
                      </ul>
                  }
              }
          }
      </section>
  }
}

#[function_component(MetricsPage)]
pub fn metrics_page() -> Html {
  let handle = use_weekly_metrics(METRICS_WEEKS);
  let metrics = &handle.metrics;

  if handle.is_loading {
    return html! {
        <div class="muted">{ "Loading metrics..." }</div>
    };
  }
  if metrics.checkins.is_empty() {
    return html! {
        <section class="panel">
            <h2>{ "Metrics" }</h2>
            <p class="muted">{ "No check-ins yet. Save a weekly check-in to start a streak." }</p>
        </section>
    };
  }

  html! {
      <div class="metrics-page">
          <section class="panel">
              <div class="panel-header">
                  <h2>{ "Metrics" }</h2>
                  <span class="badge">
                      { format!("{}-week streak", metrics.streak) }
                  </span>
              </div>
              <div class="averages">
                  {
                      for ScoreArea::ALL.iter().map(|area| {
                          let average = metrics.averages.get(*area);
                          let tone = average.map(|value| ScoreTone::of(value).css_class());
                          html! {
                              <div class={classes!("average", tone)}>
                                  <span class="average-label">{ area.label() }</span>
                                  <span class="average-value">
                                      { average.map(|value| format!("{value:.1}")).unwrap_or_else(|| "-".to_string()) }
                                  </span>
                              </div>
                          }
                      })
                  }
              </div>
          </section>
          <section class="panel">
              <h3>{ "Trends" }</h3>
              <table class="trends">
                  <thead>
                      <tr>
                          <th>{ "Area" }</th>
                          { for metrics.timeline().map(|checkin| html! { <th>{ week_label(checkin.week_of) }</th> }) }
                      </tr>
                  </thead>
                  <tbody>
                      {
                          for ScoreArea::ALL.iter().map(|area| html! {
                              <tr>
                                  <td>{ area.label() }</td>
                                  {
                                      for metrics.timeline().map(|checkin| {
                                          let score = area.score_of(checkin);
                                          html! {
                                              <td class={classes!(score.map(|score| score.tone().css_class()))}>
                                                  { score.map(|score| score.to_string()).unwrap_or_else(|| "-".to_string()) }
                                              </td>
                                          }
                                      })
                                  }
                              </tr>
                          })
                      }
                  </tbody>
              </table>
          </section>
          { notes_list("Equanimity", metrics.equanimity_notes()) }
          { notes_list("Flags", metrics.flags()) }
      </div>
  }
}
