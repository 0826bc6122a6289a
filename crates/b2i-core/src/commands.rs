mod account;
mod planning;
mod reflection;
mod shutdown;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use b2i_shared::auth::Session;
use b2i_shared::model::User;
use b2i_shared::postgrest::ClientConfig;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::{AuthClient, SessionFile, local_user, restore_session};
use crate::backend::{Backend, Client, LocalBackend, RestBackend};
use crate::cli::Command;
use crate::config::{Config, StorageMode};
use crate::datetime::Clock;
use crate::render::Renderer;

/// Directory under the data dir that holds the local-mode tables.
pub const LOCAL_DIR: &str = "local";

const LOCAL_ENDPOINT: &str = "local";

/// Everything a command needs: configuration, the data client and the
/// current user, if any.
pub struct Workspace {
    pub cfg: Config,
    pub clock: Clock,
    pub data_dir: PathBuf,
    client: Client,
    user: Option<User>,
    remote: Option<RemoteAuth>,
}

struct RemoteAuth {
    client: AuthClient,
    file: SessionFile,
    session: Option<Session>,
}

impl Workspace {
    /// Opens the store selected by `storage.mode` and restores the user.
    #[instrument(skip(cfg, data_dir))]
    pub fn open(cfg: Config, data_dir: &Path) -> anyhow::Result<Self> {
        let clock = Clock::from_config(&cfg);
        match cfg.storage_mode()? {
            StorageMode::Local => {
                let local_dir = data_dir.join(LOCAL_DIR);
                let backend = LocalBackend::open(&local_dir)?;
                let user = local_user(&local_dir)?;
                info!(user = %user.id, dir = %local_dir.display(), "using local storage");
                let client = Client::new(
                    Arc::new(backend),
                    ClientConfig::new(LOCAL_ENDPOINT, ""),
                    None,
                );
                Ok(Self {
                    cfg,
                    clock,
                    data_dir: data_dir.to_path_buf(),
                    client,
                    user: Some(user),
                    remote: None,
                })
            }
            StorageMode::Remote => {
                let config = cfg.client_config()?;
                let backend: Arc<dyn Backend> = Arc::new(RestBackend::new(config.clone())?);
                let auth = AuthClient::new(
                    Arc::clone(&backend),
                    config.clone(),
                    cfg.get("auth.redirect_url"),
                );
                let file = SessionFile::in_dir(data_dir);
                let session = restore_session(&auth, &file, clock.now())?;
                debug!(signed_in = session.is_some(), "session restored");
                let client = Client::new(
                    backend,
                    config,
                    session.as_ref().map(|s| s.access_token.clone()),
                );
                Ok(Self {
                    cfg,
                    clock,
                    data_dir: data_dir.to_path_buf(),
                    client,
                    user: session.as_ref().map(|s| s.user.clone()),
                    remote: Some(RemoteAuth {
                        client: auth,
                        file,
                        session,
                    }),
                })
            }
        }
    }

    /// A workspace over an arbitrary backend with a fixed user. No sign-in
    /// flow is available.
    pub fn with_backend(
        cfg: Config,
        clock: Clock,
        data_dir: &Path,
        backend: Arc<dyn Backend>,
        user: Option<User>,
    ) -> Self {
        Self {
            cfg,
            clock,
            data_dir: data_dir.to_path_buf(),
            client: Client::new(backend, ClientConfig::new(LOCAL_ENDPOINT, ""), None),
            user,
            remote: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.remote.is_none()
    }

    pub(crate) fn client(&self) -> Client {
        self.client.clone()
    }

    /// The current user; data commands fail without one.
    pub(crate) fn require_user(&self) -> anyhow::Result<User> {
        self.user
            .clone()
            .ok_or_else(|| anyhow!("not signed in; run `b2i auth login <email>` first"))
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.user = session.as_ref().map(|s| s.user.clone());
        let token = session.as_ref().map(|s| s.access_token.clone());
        self.client = Client::new(self.client.backend(), self.client.config().clone(), token);
        if let Some(remote) = &mut self.remote {
            remote.session = session;
        }
    }
}

#[instrument(skip(ws, renderer, out, command))]
pub fn dispatch(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Auth { action } => account::run(ws, out, action),
        Command::Goals { action } => planning::goals(ws, renderer, out, action),
        Command::Board { action } => planning::board(ws, renderer, out, action),
        Command::Checklist { action } => shutdown::checklist(ws, renderer, out, action),
        Command::Footer { action } => shutdown::footer(ws, renderer, out, action),
        Command::Today => shutdown::today(ws, renderer, out),
        Command::Checkin { action } => reflection::checkin(ws, renderer, out, action),
        Command::Review { action } => reflection::review(ws, renderer, out, action),
        Command::Metrics { weeks } => reflection::metrics(ws, renderer, out, weeks),
    }
}

/// Finds the one id that starts with `prefix`. Hyphens are optional and
/// case does not matter.
pub fn resolve_id(
    prefix: &str,
    ids: impl IntoIterator<Item = Uuid>,
    kind: &str,
) -> anyhow::Result<Uuid> {
    let needle: String = prefix
        .trim()
        .chars()
        .filter(|ch| *ch != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    if needle.is_empty() {
        return Err(anyhow!("empty {kind} id"));
    }

    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.simple().to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(anyhow!("no {kind} matches id '{prefix}'")),
        _ => Err(anyhow!(
            "id '{prefix}' matches {} {kind}s; use more characters",
            matches.len()
        )),
    }
}

/// Tells the user a command was accepted but had no effect.
fn report_unchanged(out: &mut dyn Write, reason: &str) -> anyhow::Result<()> {
    info!(reason, "nothing changed");
    writeln!(out, "Nothing changed: {reason}.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolve_id_accepts_unique_prefixes() {
        let a = Uuid::parse_str("3f2a1c00-0000-4000-8000-000000000001").expect("uuid");
        let b = Uuid::parse_str("3f2b9d00-0000-4000-8000-000000000002").expect("uuid");

        assert_eq!(resolve_id("3F2A", [a, b], "goal").expect("match"), a);
        assert_eq!(resolve_id("3f2b9d00-00", [a, b], "goal").expect("match"), b);
        assert!(resolve_id("3f2", [a, b], "goal").is_err());
        assert!(resolve_id("ff", [a, b], "goal").is_err());
        assert!(resolve_id("  ", [a, b], "goal").is_err());
    }
}
