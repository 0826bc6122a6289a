use std::io::Write;

use anyhow::anyhow;
use tracing::{info, instrument, warn};

use super::{RemoteAuth, Workspace};
use crate::cli::AuthCommand;

#[instrument(skip(ws, out))]
pub(super) fn run(ws: &mut Workspace, out: &mut dyn Write, action: AuthCommand) -> anyhow::Result<()> {
    if let AuthCommand::Status = action {
        return status(ws, out);
    }

    let now = ws.clock.now();
    let remote = remote(ws)?;
    match action {
        AuthCommand::Login { email } => {
            remote.client.send_magic_link(&email)?;
            writeln!(out, "Check {email} for your sign-in link.")?;
            writeln!(
                out,
                "Then run `b2i auth verify {email} <code>` or `b2i auth callback <url>`."
            )?;
            Ok(())
        }
        AuthCommand::Verify { email, code } => {
            let session = remote.client.verify_code(&email, &code, now)?;
            remote.file.save(&session)?;
            writeln!(out, "Signed in as {}.", display_user(&session.user))?;
            ws.set_session(Some(session));
            Ok(())
        }
        AuthCommand::Callback { url } => {
            let session = remote.client.complete_redirect(&url, now)?;
            remote.file.save(&session)?;
            writeln!(out, "Signed in as {}.", display_user(&session.user))?;
            ws.set_session(Some(session));
            Ok(())
        }
        AuthCommand::Logout => {
            match &remote.session {
                Some(session) => {
                    if let Err(err) = remote.client.sign_out(session) {
                        warn!(error = %format!("{err:#}"), "remote sign-out failed");
                    }
                    info!(user = %session.user.id, "signed out");
                }
                None => info!("no session to end"),
            }
            remote.file.clear()?;
            ws.set_session(None);
            writeln!(out, "Signed out.")?;
            Ok(())
        }
        AuthCommand::Status => status(ws, out),
    }
}

fn remote(ws: &Workspace) -> anyhow::Result<&RemoteAuth> {
    ws.remote
        .as_ref()
        .ok_or_else(|| anyhow!("sign-in is not used with storage.mode = local"))
}

fn status(ws: &Workspace, out: &mut dyn Write) -> anyhow::Result<()> {
    let Some(remote) = &ws.remote else {
        match ws.user() {
            Some(user) => writeln!(out, "Local storage, user {}.", user.id)?,
            None => writeln!(out, "Local storage.")?,
        }
        return Ok(());
    };

    match &remote.session {
        Some(session) => {
            writeln!(out, "Signed in as {}.", display_user(&session.user))?;
            writeln!(
                out,
                "Session valid until {}.",
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            )?;
        }
        None => writeln!(out, "Not signed in. Run `b2i auth login <email>`.")?,
    }
    Ok(())
}

fn display_user(user: &b2i_shared::model::User) -> String {
    user.email.clone().unwrap_or_else(|| user.id.to_string())
}
