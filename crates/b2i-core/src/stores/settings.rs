use anyhow::Context;
use b2i_shared::model::{
    FooterUpdate, NewUserSettings, USER_SETTINGS_TABLE, User, UserSettings, normalize_text,
};
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::logged;
use crate::backend::{Client, is_no_rows};

/// Per-user preferences. Until a row exists the defaults are shown.
#[derive(Debug)]
pub struct SettingsStore {
    client: Client,
    user: Option<User>,
    settings: UserSettings,
    is_loading: bool,
}

impl SettingsStore {
    pub fn new(client: Client, user: Option<User>) -> Self {
        Self {
            client,
            user,
            settings: UserSettings::default(),
            is_loading: true,
        }
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn footer_message(&self) -> &str {
        &self.settings.footer_message
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Fetches the settings row and creates it with the default footer
    /// when the user has none. Any other failure keeps the defaults.
    #[instrument(skip(self))]
    pub fn load(&mut self) -> anyhow::Result<()> {
        let Some(user) = self.user.clone() else {
            self.settings = UserSettings::default();
            self.is_loading = false;
            return Ok(());
        };

        let query = self
            .client
            .from(USER_SETTINGS_TABLE)
            .select("*")
            .eq("user_id", user.id);
        let result = self.client.fetch_single::<UserSettings>(query);
        self.is_loading = false;
        match result {
            Ok(settings) => {
                self.settings = settings;
                Ok(())
            }
            Err(err) if is_no_rows(&err) => {
                let row = NewUserSettings {
                    user_id: user.id,
                    footer_message: UserSettings::default().footer_message,
                };
                let created: UserSettings = logged(
                    self.client
                        .insert_one(USER_SETTINGS_TABLE, &row)
                        .context("failed creating default settings"),
                    "create settings",
                )?;
                info!("created default settings");
                self.settings = created;
                Ok(())
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed fetching settings; using defaults");
                self.settings = UserSettings::default();
                Ok(())
            }
        }
    }

    /// Stores a new footer message. Blank messages are ignored.
    #[instrument(skip(self, now))]
    pub fn update_footer_message(
        &mut self,
        message: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let Some(user) = &self.user else {
            return Ok(false);
        };
        let Some(message) = normalize_text(message) else {
            return Ok(false);
        };

        let patch = FooterUpdate {
            footer_message: message,
            updated_at: now,
        };
        let query = self
            .client
            .from(USER_SETTINGS_TABLE)
            .update(&patch)?
            .eq("user_id", user.id);
        logged(self.client.execute(query), "update footer")?;
        self.settings.footer_message = patch.footer_message;
        self.settings.updated_at = Some(patch.updated_at);
        info!("footer message updated");
        Ok(true)
    }
}
