use std::sync::Arc;

use b2i_core::backend::MemoryBackend;
use b2i_core::cli::GlobalCli;
use b2i_core::commands::{self, Workspace};
use b2i_core::config::Config;
use b2i_core::datetime::Clock;
use b2i_core::render::Renderer;
use b2i_shared::model::{GOALS_TABLE, KANBAN_CARDS_TABLE, User};
use clap::Parser;
use tempfile::tempdir;
use uuid::Uuid;

struct Harness {
    ws: Workspace,
    backend: Arc<MemoryBackend>,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new(user: Option<User>) -> Self {
        let dir = tempdir().expect("tempdir");
        let backend = Arc::new(MemoryBackend::new());
        let ws = Workspace::with_backend(
            Config::default(),
            Clock::with_zone(chrono_tz::UTC),
            dir.path(),
            backend.clone(),
            user,
        );
        Self {
            ws,
            backend,
            _dir: dir,
        }
    }

    fn signed_in() -> Self {
        Self::new(Some(User {
            id: Uuid::new_v4(),
            email: Some("me@example.com".to_string()),
        }))
    }

    fn run(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let mut argv = vec!["b2i"];
        argv.extend_from_slice(args);
        let cli = GlobalCli::try_parse_from(argv)?;
        let command = cli.command.expect("a command");
        let mut out: Vec<u8> = Vec::new();
        commands::dispatch(&mut self.ws, &Renderer::plain(), &mut out, command)?;
        Ok(String::from_utf8(out).expect("utf8"))
    }
}

#[test]
fn data_commands_require_a_user() {
    let mut harness = Harness::new(None);
    let err = harness.run(&["goals"]).expect_err("gate");
    assert!(err.to_string().contains("not signed in"));
    assert!(harness.backend.table_names().is_empty());
}

#[test]
fn goals_are_added_and_toggled_by_id_prefix() {
    let mut harness = Harness::signed_in();
    let added = harness
        .run(&["goals", "add", "Read", "twelve", "books"])
        .expect("add");
    assert!(added.starts_with("Added goal "));

    let id = harness.backend.rows(GOALS_TABLE)[0]["id"]
        .as_str()
        .expect("id")
        .to_string();
    let toggled = harness.run(&["goals", "toggle", &id[..6]]).expect("toggle");
    assert!(toggled.ends_with("is complete.\n"));

    let listed = harness.run(&["goals", "list"]).expect("list");
    assert!(listed.contains("Read twelve books"));
    assert!(listed.contains("1/1 complete"));
}

#[test]
fn board_cards_move_between_columns() {
    let mut harness = Harness::signed_in();
    harness
        .run(&["board", "add", "Draft", "plan", "--priority", "high", "--due", "2026-10-20"])
        .expect("add");
    let id = harness.backend.rows(KANBAN_CARDS_TABLE)[0]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let moved = harness
        .run(&["board", "move", &id[..8], "in-progress"])
        .expect("move");
    assert!(moved.contains("to In Progress at position 0"));

    let board = harness.run(&["board"]).expect("show");
    assert!(board.contains("To Do (0)"));
    assert!(board.contains("In Progress (1)"));
    assert!(board.contains("2026-10-20"));

    harness.run(&["board", "archive", &id[..8]]).expect("archive");
    let archived = harness.run(&["board", "archived"]).expect("archived");
    assert!(archived.contains("Draft plan"));
}

#[test]
fn checklist_is_seeded_and_reorderable() {
    let mut harness = Harness::signed_in();
    let shown = harness.run(&["checklist"]).expect("show");
    assert!(shown.ends_with("0/12 done (0%)\n"));

    let moved = harness.run(&["checklist", "move", "0", "11"]).expect("move");
    assert!(moved.contains("0/12 done"));
    let unchanged = harness.run(&["checklist", "move", "40", "0"]).expect("move");
    assert!(unchanged.starts_with("Nothing changed"));
}

#[test]
fn checkin_save_keeps_unset_fields() {
    let mut harness = Harness::signed_in();
    harness
        .run(&["checkin", "save", "--week", "2026-10-14", "--body", "4", "--flag", "Late nights"])
        .expect("save");
    harness
        .run(&["checkin", "save", "--week", "2026-10-12", "--mind", "2"])
        .expect("second save");

    let shown = harness
        .run(&["checkin", "show", "--week", "2026-10-16"])
        .expect("show");
    assert!(shown.contains("week of Oct 12"));
    assert!(shown.contains("Late nights"));
    assert!(shown.contains("Body    4"));
    assert!(shown.contains("Mind    2"));
}

#[test]
fn footer_can_be_replaced() {
    let mut harness = Harness::signed_in();
    harness.run(&["footer", "set", "One", "thing", "at", "a", "time"]).expect("set");
    let shown = harness.run(&["footer"]).expect("show");
    assert_eq!(shown, "One thing at a time\n");
}

#[test]
fn auth_is_unavailable_in_local_mode() {
    let mut harness = Harness::signed_in();
    let status = harness.run(&["auth", "status"]).expect("status");
    assert!(status.starts_with("Local storage"));
    assert!(harness.run(&["auth", "login", "me@example.com"]).is_err());
}
