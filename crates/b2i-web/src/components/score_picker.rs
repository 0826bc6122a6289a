use b2i_shared::checkin::{
  Score,
  ScoreArea
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct ScorePickerProps {
  pub area:    ScoreArea,
  pub value:   Option<Score>,
  pub on_pick: Callback<(ScoreArea, Score)>
}

/// One row of 1-5 buttons. Clicking the
/// selected score clears it.
#[function_component(ScorePicker)]
pub fn score_picker(
  props: &ScorePickerProps
) -> Html {
  let area = props.area;
  html! {
      <div class="score-row">
          <div class="score-label">
              <strong>{ area.label() }</strong>
              <span class="muted">{ area.question() }</span>
          </div>
          <div class="score-buttons">
              {
                  for Score::all().map(|score| {
                      let selected = props.value == Some(score);
                      let onclick = {
                          let on_pick = props.on_pick.clone();
                          Callback::from(move |_: MouseEvent| on_pick.emit((area, score)))
                      };
                      html! {
                          <button
                              type="button"
                              class={classes!("score", selected.then_some(score.tone().css_class()))}
                              {onclick}
                          >
                              { score.value() }
                          </button>
                      }
                  })
              }
          </div>
      </div>
  }
}
