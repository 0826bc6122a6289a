use yew::{
  Callback,
  Html,
  MouseEvent,
  function_component,
  html,
  use_state
};

const SECTIONS: [(&str, &str); 4] = [
  (
    "Annual Goals",
    "Set three to five meaningful goals for the year. Keep them at the top \
     of the page and check them off as you reach them."
  ),
  (
    "Task Board",
    "To Do holds committed work, In Progress what you are on right now (keep \
     it to a handful), Complete what is finished. Drag cards between columns \
     and archive finished ones regularly."
  ),
  (
    "Friday Shutdown",
    "Every Friday, work through the checklist: clear inboxes, review the \
     week, move cards, plan next week's big rocks. Add, remove and reorder \
     items to fit your workflow."
  ),
  (
    "Personal Mantra",
    "The footer holds your intention for the year. Click it to write your own."
  )
];

const TIPS: [&str; 4] = [
  "Review your annual goals during every Friday Shutdown.",
  "Too many active tasks kills focus.",
  "Archive completed tasks to keep the board clean.",
  "Never skip Friday Shutdown."
];

/// Header button plus the static
/// framework overview it opens.
#[function_component(AboutDialog)]
pub fn about_dialog() -> Html {
  let open = use_state(|| false);

  let show = {
    let open = open.clone();
    Callback::from(move |_: MouseEvent| {
      open.set(true)
    })
  };

  let hide = {
    let open = open.clone();
    Callback::from(move |_: MouseEvent| {
      open.set(false)
    })
  };

  html! {
      <>
          <button class="link-button" title="About B2I" onclick={show}>{ "About" }</button>
          {
              if *open {
                  html! {
                      <div class="modal">
                          <div class="modal-backdrop" onclick={hide.clone()}></div>
                          <div class="modal-content about-dialog" role="dialog">
                              <div class="panel-header">
                                  <div>
                                      <h2>{ "About B2I" }</h2>
                                      <span class="muted">{ "Busy to Intentional" }</span>
                                  </div>
                                  <button class="icon-button" aria-label="Close" onclick={hide}>{ "×" }</button>
                              </div>
                              <p>
                                  { "B2I helps you move from reactive busyness to purposeful action \
                                     by pairing annual goals, a visual task board and a weekly review." }
                              </p>
                              {
                                  for SECTIONS.iter().enumerate().map(|(idx, (title, body))| html! {
                                      <section key={*title}>
                                          <h3>{ format!("{}. {title}", idx + 1) }</h3>
                                          <p>{ *body }</p>
                                      </section>
                                  })
                              }
                              <section class="about-tips">
                                  <h3>{ "Tips" }</h3>
                                  <ul>
                                      { for TIPS.iter().map(|tip| html! { <li>{ *tip }</li> }) }
                                  </ul>
                              </section>
                          </div>
                      </div>
                  }
              } else {
                  html! {}
              }
          }
      </>
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sections_follow_the_page_layout() {
    let titles: Vec<&str> = SECTIONS
      .iter()
      .map(|(title, _)| *title)
      .collect();
    assert_eq!(
      titles,
      vec![
        "Annual Goals",
        "Task Board",
        "Friday Shutdown",
        "Personal Mantra"
      ]
    );
    assert!(
      SECTIONS
        .iter()
        .all(|(_, body)| !body.trim().is_empty())
    );
  }
}
