use b2i_shared::model::{
  DEFAULT_FOOTER_MESSAGE,
  FooterUpdate,
  NewUserSettings,
  USER_SETTINGS_TABLE,
  UserSettings,
  normalize_text
};
use chrono::Utc;
use wasm_bindgen_futures::spawn_local;
use yew::{
  Callback,
  hook,
  use_effect_with,
  use_state
};

use super::logged;
use crate::session::use_auth;

#[derive(Clone, PartialEq)]
pub struct SettingsHandle {
  pub settings:              UserSettings,
  pub is_loading:            bool,
  pub update_footer_message: Callback<String>
}

impl SettingsHandle {
  pub fn footer_message(&self) -> &str {
    &self.settings.footer_message
  }
}

#[hook]
pub fn use_settings() -> SettingsHandle {
  let auth = use_auth();
  let user = auth.user();
  let api = auth.api();
  let settings =
    use_state(UserSettings::default);
  let is_loading = use_state(|| true);

  {
    let settings = settings.clone();
    let is_loading = is_loading.clone();
    use_effect_with(
      (user.clone(), api.clone()),
      move |(user, api)| {
        let user = user.clone();
        let api = api.clone();
        spawn_local(async move {
          let Some(user) = user else {
            settings.set(UserSettings::default());
            is_loading.set(false);
            return;
          };
          let query = api
            .from(USER_SETTINGS_TABLE)
            .select("footer_message,updated_at")
            .eq("user_id", user.id);
          match api
            .fetch_single::<UserSettings>(query)
            .await
          {
            | Ok(found) => settings.set(found),
            | Err(err) if err.is_no_rows() => {
              let row = NewUserSettings {
                user_id:        user.id,
                footer_message:
                  DEFAULT_FOOTER_MESSAGE
                    .to_string()
              };
              if let Some(created) = logged(
                api
                  .insert_one::<_, UserSettings>(
                    USER_SETTINGS_TABLE,
                    &row
                  )
                  .await,
                "create settings"
              ) {
                settings.set(created);
              }
            }
            | Err(err) => {
              tracing::warn!(
                error = %err,
                "failed fetching settings; \
                 keeping defaults"
              );
            }
          }
          is_loading.set(false);
        });
        || ()
      }
    );
  }

  let update_footer_message = {
    let settings = settings.clone();
    Callback::from(move |message: String| {
      let Some(user) = user.clone() else {
        return;
      };
      let Some(message) =
        normalize_text(&message)
      else {
        return;
      };
      let settings = settings.clone();
      let api = api.clone();
      spawn_local(async move {
        let update = FooterUpdate {
          footer_message: message,
          updated_at:     Utc::now()
        };
        if logged(
          api
            .update(
              USER_SETTINGS_TABLE,
              &update,
              "user_id",
              user.id
            )
            .await,
          "update footer"
        )
        .is_some()
        {
          settings.set(UserSettings {
            footer_message: update
              .footer_message,
            updated_at:     Some(
              update.updated_at
            )
          });
        }
      });
    })
  };

  SettingsHandle {
    settings: (*settings).clone(),
    is_loading: *is_loading,
    update_footer_message
  }
}
