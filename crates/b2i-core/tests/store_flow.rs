use std::sync::Arc;

use b2i_core::backend::{Backend, Client, LocalBackend, MemoryBackend};
use b2i_core::stores::{
    BoardStore, ChecklistStore, GoalsStore, MetricsStore, SettingsStore, WeeklyCheckinStore,
};
use b2i_shared::board::CardDraft;
use b2i_shared::checkin::{Score, ScoreArea, WeeklyDraft};
use b2i_shared::checklist::DEFAULT_ITEMS;
use b2i_shared::model::{
    CHECKLIST_ITEMS_TABLE, ColumnId, DEFAULT_FOOTER_MESSAGE, KANBAN_CARDS_TABLE, USER_SETTINGS_TABLE,
    User, WEEKLY_CHECKINS_TABLE,
};
use b2i_shared::postgrest::{ApiError, ClientConfig, Method, Request, Response};
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use uuid::Uuid;

fn user() -> User {
    User {
        id: Uuid::new_v4(),
        email: Some("me@example.com".to_string()),
    }
}

fn client(backend: Arc<MemoryBackend>) -> Client {
    Client::new(backend, ClientConfig::new("local", ""), None)
}

/// Memory backend that fails requests of one method against one table
/// once armed.
struct Failing {
    inner: MemoryBackend,
    fail: Mutex<Option<(Method, String)>>,
}

impl Failing {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryBackend::new(),
            fail: Mutex::new(None),
        })
    }

    fn fail_on(&self, method: Method, table: &str) {
        *self.fail.lock() = Some((method, table.to_string()));
    }
}

impl Backend for Failing {
    fn execute(&self, request: &Request) -> Result<Response, ApiError> {
        let armed = self.fail.lock().clone();
        if let Some((method, table)) = armed {
            if request.method == method && request.table() == Some(table.as_str()) {
                return Err(ApiError::Transport("connection reset".to_string()));
            }
        }
        self.inner.execute(request)
    }
}

fn failing_client(backend: Arc<Failing>) -> Client {
    Client::new(backend, ClientConfig::new("local", ""), None)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn goals_round_trip_through_the_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let mut store = GoalsStore::new(client(backend.clone()), Some(owner.clone()));
    store.load().expect("load");

    let goal = store.add("  Run a half marathon ").expect("add").expect("goal");
    assert_eq!(goal.title, "Run a half marathon");
    assert_eq!(store.add("   ").expect("blank add"), None);

    assert!(store.toggle(goal.id).expect("toggle"));
    assert!(store.find(goal.id).expect("goal").is_completed);
    assert!(!store.toggle(Uuid::new_v4()).expect("unknown id"));

    let mut reloaded = GoalsStore::new(client(backend), Some(owner));
    reloaded.load().expect("reload");
    assert_eq!(reloaded.goals().len(), 1);
    assert!(reloaded.goals()[0].is_completed);
}

#[test]
fn stores_without_a_user_do_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let mut goals = GoalsStore::new(client(backend.clone()), None);
    goals.load().expect("load");
    assert!(!goals.is_loading());
    assert_eq!(goals.add("Anything").expect("add"), None);

    let mut checklist = ChecklistStore::new(client(backend.clone()), None);
    checklist.load().expect("load");
    assert!(checklist.items().is_empty());
    assert!(backend.table_names().is_empty());
}

#[test]
fn checklist_seeds_defaults_once() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let mut store = ChecklistStore::new(client(backend.clone()), Some(owner));

    store.load().expect("first load");
    let labels: Vec<&str> = store.items().iter().map(|item| item.label.as_str()).collect();
    assert_eq!(labels, DEFAULT_ITEMS.to_vec());
    assert_eq!(backend.rows(CHECKLIST_ITEMS_TABLE).len(), 12);

    for item in store.items().to_vec() {
        store.remove(item.id).expect("remove");
    }
    store.load().expect("second load");
    assert!(store.items().is_empty());
    assert!(backend.rows(CHECKLIST_ITEMS_TABLE).is_empty());
}

#[test]
fn checklist_reorder_and_reset_persist() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let mut store = ChecklistStore::new(client(backend.clone()), Some(owner.clone()));
    store.load().expect("load");

    let first = store.items()[0].id;
    assert!(store.toggle(first).expect("toggle"));
    assert_eq!(store.progress().completed, 1);

    assert!(store.reorder(0, 2).expect("reorder"));
    assert_eq!(store.items()[2].id, first);

    let mut reloaded = ChecklistStore::new(client(backend.clone()), Some(owner));
    reloaded.load().expect("reload");
    assert_eq!(reloaded.items()[2].id, first);
    assert!(reloaded.items()[2].is_checked);

    assert!(reloaded.reset_all().expect("reset"));
    assert_eq!(reloaded.progress().completed, 0);
    let stored_checked = backend
        .rows(CHECKLIST_ITEMS_TABLE)
        .iter()
        .filter(|row| row.get("is_checked") == Some(&serde_json::Value::Bool(true)))
        .count();
    assert_eq!(stored_checked, 0);
}

#[test]
fn board_moves_renumber_the_target_column() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let mut store = BoardStore::new(client(backend.clone()), Some(owner.clone()));
    store.load().expect("load");

    let a = store.add(CardDraft::new("A")).expect("add").expect("card");
    let b = store.add(CardDraft::new("B")).expect("add").expect("card");
    let c = store
        .add(CardDraft {
            column_id: ColumnId::InProgress,
            ..CardDraft::new("C")
        })
        .expect("add")
        .expect("card");
    assert_eq!((a.position, b.position, c.position), (0, 1, 0));

    assert!(store.move_card(b.id, ColumnId::InProgress, Some(0)).expect("move"));
    let in_progress: Vec<Uuid> = store
        .column_cards(ColumnId::InProgress)
        .iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(in_progress, vec![b.id, c.id]);

    let mut reloaded = BoardStore::new(client(backend.clone()), Some(owner));
    reloaded.load().expect("reload");
    let moved = reloaded.find(b.id).expect("moved card");
    assert_eq!(moved.column_id, ColumnId::InProgress);
    assert_eq!(moved.position, 0);
    assert_eq!(reloaded.find(c.id).expect("card").position, 1);

    assert!(reloaded.archive(a.id).expect("archive"));
    assert!(reloaded.column_cards(ColumnId::Todo).is_empty());
    assert_eq!(reloaded.archived_cards().len(), 1);
    assert!(reloaded.delete(a.id).expect("delete"));
    assert_eq!(backend.rows(KANBAN_CARDS_TABLE).len(), 2);
}

#[test]
fn weekly_save_upserts_one_row_per_week() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let week = date(2026, 10, 12);
    let mut store = WeeklyCheckinStore::new(client(backend.clone()), Some(owner.clone()), 4);
    store.load(week).expect("load");
    assert_eq!(store.current(), None);

    let mut draft = WeeklyDraft::default();
    draft.set_score(ScoreArea::Body, Score::new(4));
    draft.flag_note = "Skipped reading twice".to_string();
    store.save(draft, week).expect("save");

    let mut draft = store.draft();
    draft.click_score(ScoreArea::Body, Score::new(4).expect("score"));
    draft.set_score(ScoreArea::Mind, Score::new(5));
    store.save(draft, week).expect("second save");

    assert_eq!(backend.rows(WEEKLY_CHECKINS_TABLE).len(), 1);
    let current = store.current().expect("current");
    assert_eq!(current.score_body, None);
    assert_eq!(current.score_mind, Score::new(5));
    assert_eq!(current.flag_note, "Skipped reading twice");
    assert_eq!(store.recent().len(), 1);
}

#[test]
fn metrics_count_consecutive_weeks() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let mut weekly = WeeklyCheckinStore::new(client(backend.clone()), Some(owner.clone()), 4);
    for week in [date(2026, 9, 21), date(2026, 10, 5), date(2026, 10, 12)] {
        let mut draft = WeeklyDraft::default();
        draft.set_score(ScoreArea::Work, Score::new(3));
        weekly.save(draft, week).expect("save");
    }

    let mut metrics = MetricsStore::new(client(backend), Some(owner));
    metrics.load(None).expect("load");
    let metrics = metrics.metrics();
    assert_eq!(metrics.checkins.len(), 3);
    assert_eq!(metrics.checkins[0].week_of, date(2026, 10, 12));
    assert_eq!(metrics.streak, 2);
    assert_eq!(metrics.averages.work, Some(3.0));
    assert_eq!(metrics.averages.body, None);
}

#[test]
fn settings_row_is_created_on_first_load() {
    let backend = Arc::new(MemoryBackend::new());
    let owner = user();
    let mut store = SettingsStore::new(client(backend.clone()), Some(owner.clone()));
    store.load().expect("load");
    assert_eq!(store.footer_message(), DEFAULT_FOOTER_MESSAGE);
    assert_eq!(backend.rows(USER_SETTINGS_TABLE).len(), 1);

    assert!(!store.update_footer_message("   ", Utc::now()).expect("blank"));
    assert!(store
        .update_footer_message("Slow is smooth", Utc::now())
        .expect("update"));

    let mut reloaded = SettingsStore::new(client(backend.clone()), Some(owner));
    reloaded.load().expect("reload");
    assert_eq!(reloaded.footer_message(), "Slow is smooth");
    assert!(reloaded.settings().updated_at.is_some());
    assert_eq!(backend.rows(USER_SETTINGS_TABLE).len(), 1);
}

#[test]
fn local_backend_survives_a_reopen() {
    let temp = tempdir().expect("tempdir");
    let owner = user();
    {
        let backend = LocalBackend::open(temp.path()).expect("open");
        let client = Client::new(Arc::new(backend), ClientConfig::new("local", ""), None);
        let mut goals = GoalsStore::new(client, Some(owner.clone()));
        goals.load().expect("load");
        goals.add("Write every morning").expect("add");
    }

    let backend = LocalBackend::open(temp.path()).expect("reopen");
    let client = Client::new(Arc::new(backend), ClientConfig::new("local", ""), None);
    let mut goals = GoalsStore::new(client, Some(owner));
    goals.load().expect("load");
    assert_eq!(goals.goals().len(), 1);
    assert_eq!(goals.goals()[0].title, "Write every morning");
}

#[test]
fn failed_move_write_keeps_the_local_order() {
    let backend = Failing::new();
    let owner = user();
    let mut store = BoardStore::new(failing_client(backend.clone()), Some(owner.clone()));
    store.load().expect("load");
    let a = store.add(CardDraft::new("A")).expect("add").expect("card");
    let b = store.add(CardDraft::new("B")).expect("add").expect("card");

    backend.fail_on(Method::Patch, KANBAN_CARDS_TABLE);
    assert!(store.move_card(a.id, ColumnId::Complete, None).is_err());

    assert_eq!(store.find(a.id).expect("card").column_id, ColumnId::Complete);
    let todo: Vec<Uuid> = store
        .column_cards(ColumnId::Todo)
        .iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(todo, vec![b.id]);

    let mut reloaded = BoardStore::new(failing_client(backend), Some(owner));
    reloaded.load().expect("reload");
    assert_eq!(reloaded.find(a.id).expect("card").column_id, ColumnId::Todo);
}

#[test]
fn settings_fetch_error_keeps_the_defaults() {
    let backend = Failing::new();
    backend.fail_on(Method::Get, USER_SETTINGS_TABLE);
    let mut store = SettingsStore::new(failing_client(backend.clone()), Some(user()));

    store.load().expect("load");
    assert!(!store.is_loading());
    assert_eq!(store.footer_message(), DEFAULT_FOOTER_MESSAGE);
    assert!(backend.inner.rows(USER_SETTINGS_TABLE).is_empty());
}

#[test]
fn failed_reorder_write_keeps_the_local_splice() {
    let backend = Failing::new();
    let owner = user();
    let mut store = ChecklistStore::new(failing_client(backend.clone()), Some(owner));
    store.load().expect("load");
    let first = store.items()[0].id;

    backend.fail_on(Method::Patch, CHECKLIST_ITEMS_TABLE);
    assert!(store.reorder(0, 2).is_err());

    assert_eq!(store.items()[2].id, first);
    let positions: Vec<i32> = store.items().iter().map(|item| item.position).collect();
    let expected: Vec<i32> = (0..12).collect();
    assert_eq!(positions, expected);
}
