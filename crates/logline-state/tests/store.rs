use std::sync::{Arc, Mutex};

use logline_state::{
    Action, ActionKind, ChangeEvent, FileStorage, MemoryStorage, StateStore, Storage,
    StorageError, StoreOptions,
};
use serde_json::{json, Value};

type Log<T> = Arc<Mutex<Vec<T>>>;

fn recorder<T: Clone + Send + 'static>() -> (Log<T>, impl FnMut(&T) + Send + Sync + 'static) {
    let log: Log<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |item: &T| sink.lock().unwrap().push(item.clone()))
}

fn values(log: &Log<ChangeEvent>) -> Vec<(Option<Value>, String)> {
    log.lock()
        .unwrap()
        .iter()
        .map(|e| (e.value.clone(), e.path.clone()))
        .collect()
}

// ------------------------------------------------------------------ Reads and writes

#[test]
fn sets_and_gets_simple_values() {
    let mut store = StateStore::new();
    store.set_state("count", json!(42)).unwrap();
    assert_eq!(store.get_state("count"), Some(&json!(42)));
}

#[test]
fn sets_and_gets_nested_values() {
    let mut store = StateStore::new();
    store.set_state("user.profile.name", json!("João")).unwrap();
    assert_eq!(store.get_state("user.profile.name"), Some(&json!("João")));
    assert_eq!(
        store.get_state("user"),
        Some(&json!({"profile": {"name": "João"}}))
    );
    assert_eq!(store.get_state("user.profile.age"), None);
    assert_eq!(store.get_state("*"), Some(store.snapshot()));
}

#[test]
fn appends_to_arrays() {
    let mut store = StateStore::new();
    store.set_state("items", json!([])).unwrap();
    store.append_state("items", json!("a")).unwrap();
    store.append_state("items", json!("b")).unwrap();
    assert_eq!(store.get_state("items"), Some(&json!(["a", "b"])));
}

#[test]
fn append_creates_array_for_non_array() {
    let mut store = StateStore::new();
    store.append_state("newList", json!("first")).unwrap();
    assert_eq!(store.get_state("newList"), Some(&json!(["first"])));

    store.set_state("scalar", json!(7)).unwrap();
    store.append_state("scalar", json!(8)).unwrap();
    assert_eq!(store.get_state("scalar"), Some(&json!([8])));
}

// -------------------------------------------------------------------- Subscriptions

#[test]
fn notifies_observers() {
    let mut store = StateStore::new();
    let (log, listener) = recorder::<ChangeEvent>();
    store.subscribe("count", listener);
    assert!(log.lock().unwrap().is_empty());

    store.set_state("count", json!(42)).unwrap();
    assert_eq!(values(&log), vec![(Some(json!(42)), "count".to_string())]);
}

#[test]
fn notifies_ancestors_and_wildcard() {
    let mut store = StateStore::new();
    let order: Log<String> = Arc::new(Mutex::new(Vec::new()));
    for path in ["*", "user", "user.name"] {
        let order = Arc::clone(&order);
        store.subscribe(path, move |event: &ChangeEvent| {
            assert_eq!(event.changed, "user.name");
            order.lock().unwrap().push(event.path.clone());
        });
    }
    let (user_log, user_listener) = recorder::<ChangeEvent>();
    store.subscribe("user", user_listener);

    store.set_state("user.name", json!("Maria")).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["user.name", "user", "*"]);
    assert_eq!(
        values(&user_log),
        vec![(Some(json!({"name": "Maria"})), "user".to_string())]
    );
}

#[test]
fn sibling_and_descendant_writes_do_not_leak() {
    let mut store = StateStore::new();
    let (log, listener) = recorder::<ChangeEvent>();
    store.subscribe("user.name", listener);
    store.set_state("user.age", json!(3)).unwrap();
    store.set_state("username", json!("x")).unwrap();
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn unsubscribes_one_registration() {
    let mut store = StateStore::new();
    let (first, first_listener) = recorder::<ChangeEvent>();
    let (second, second_listener) = recorder::<ChangeEvent>();
    let id = store.subscribe("test", first_listener);
    store.subscribe("test", second_listener);

    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.set_state("test", json!("changed")).unwrap();

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(second.lock().unwrap().len(), 1);
    assert_eq!(store.subscription_count(), 1);
}

// ----------------------------------------------------------------------- Middleware

#[test]
fn runs_middleware_before_mutation() {
    let mut store = StateStore::new();
    let (log, middleware) = recorder::<Action>();
    store.add_middleware(middleware);

    store.set_state("test", json!("value")).unwrap();
    store.append_state("list", json!(1)).unwrap();
    store.reset_state();

    let actions = log.lock().unwrap().clone();
    assert_eq!(actions[0], Action::set_state("test", json!("value")));
    assert_eq!(actions[1].kind, ActionKind::SetState);
    assert_eq!(actions[1].value, json!([1]));
    assert_eq!(actions[2].kind, ActionKind::Reset);
}

// ---------------------------------------------------------------------------- Batch

#[test]
fn batch_update_applies_all_writes_before_notifying() {
    let mut store = StateStore::new();
    let seen: Log<(Option<Value>, Option<Value>)> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe("*", move |event: &ChangeEvent| {
        let root = event.value.clone().unwrap_or(Value::Null);
        sink.lock()
            .unwrap()
            .push((root.pointer("/user/name").cloned(), root.pointer("/settings/theme").cloned()));
    });
    let (name_log, name_listener) = recorder::<ChangeEvent>();
    store.subscribe("user.name", name_listener);

    store
        .batch_update([
            ("user.name", json!("João")),
            ("user.age", json!(30)),
            ("settings.theme", json!("dark")),
        ])
        .unwrap();

    assert_eq!(values(&name_log), vec![(Some(json!("João")), "user.name".to_string())]);
    assert_eq!(store.get_state("user.age"), Some(&json!(30)));
    assert_eq!(store.get_state("settings.theme"), Some(&json!("dark")));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen
        .iter()
        .all(|s| *s == (Some(json!("João")), Some(json!("dark")))));
}

#[test]
fn batch_update_checks_paths_first() {
    let mut store = StateStore::new();
    let result = store.batch_update([("ok", json!(1)), ("bad..path", json!(2))]);
    assert!(result.is_err());
    assert_eq!(store.get_state("ok"), None);
}

#[test]
fn failed_batch_changes_nothing() {
    let storage = MemoryStorage::new();
    let mut store = StateStore::with_storage(StoreOptions::default(), storage.clone());
    store.set_state("list", json!([])).unwrap();
    let (log, listener) = recorder::<ChangeEvent>();
    store.subscribe("*", listener);
    let (actions, middleware) = recorder::<Action>();
    store.add_middleware(middleware);

    let result = store.batch_update([("session.user", json!("ana")), ("list.5", json!(1))]);

    assert!(result.is_err());
    assert_eq!(store.get_state("session.user"), None);
    assert_eq!(store.get_state("list"), Some(&json!([])));
    assert!(log.lock().unwrap().is_empty());
    assert!(actions.lock().unwrap().is_empty());
    assert_eq!(storage.get_item("flipapp_session_default").unwrap(), None);

    store
        .batch_update([("session.user", json!("ana")), ("list.0", json!(1))])
        .unwrap();
    assert_eq!(store.get_state("list"), Some(&json!([1])));
    assert_eq!(log.lock().unwrap().len(), 2);
    assert_eq!(actions.lock().unwrap().len(), 2);
    assert!(storage.get_item("flipapp_session_default").unwrap().is_some());
}

// ---------------------------------------------------------------------------- Reset

#[test]
fn resets_state() {
    let mut store = StateStore::new();
    let (log, listener) = recorder::<ChangeEvent>();
    store.subscribe("*", listener);
    store.set_state("a", json!(1)).unwrap();
    store.set_state("b", json!(2)).unwrap();

    store.reset_state();

    assert_eq!(store.get_state("a"), None);
    assert_eq!(store.get_state("b"), None);
    assert_eq!(store.get_state("*"), Some(&json!({})));
    assert_eq!(log.lock().unwrap().len(), 2);

    store.set_state("c", json!(3)).unwrap();
    assert_eq!(log.lock().unwrap().len(), 3);
}

// ---------------------------------------------------------------------- Persistence

#[test]
fn persists_critical_state() {
    let storage = MemoryStorage::new();
    let mut store = StateStore::with_storage(StoreOptions::default(), storage.clone());

    store.set_state("session.id", json!("abc123")).unwrap();
    store
        .set_state("chat.history", json!([{"id": 1, "text": "Hello"}]))
        .unwrap();
    store.set_state("draft", json!("not persisted")).unwrap();

    assert_eq!(
        storage.keys(),
        vec!["flipapp_chat_history_default", "flipapp_session_default"]
    );
    let saved: Value =
        serde_json::from_str(&storage.get_item("flipapp_chat_history_default").unwrap().unwrap())
            .unwrap();
    assert_eq!(saved, json!([{"id": 1, "text": "Hello"}]));

    store.append_state("chat.history", json!({"id": 2})).unwrap();
    let saved = storage.get_item("flipapp_chat_history_default").unwrap().unwrap();
    assert!(saved.contains("\"id\":2"));

    // Writing an ancestor persists the subtree below it.
    store.set_state("chat", json!({})).unwrap();
    assert_eq!(storage.get_item("flipapp_chat_history_default").unwrap(), None);
}

#[test]
fn loads_persisted_state() {
    let storage = MemoryStorage::new();
    storage
        .set_item(
            "flipapp_chat_history_default",
            r#"[{"id":1,"text":"Saved message"}]"#,
        )
        .unwrap();
    storage.set_item("flipapp_session_default", "{not json").unwrap();

    let mut store = StateStore::with_storage(StoreOptions::default(), storage);
    let (log, listener) = recorder::<ChangeEvent>();
    store.subscribe("*", listener);

    assert_eq!(store.load_persisted_state(), 1);
    assert_eq!(
        store.get_state("chat.history"),
        Some(&json!([{"id": 1, "text": "Saved message"}]))
    );
    assert_eq!(store.get_state("session"), None);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn custom_options_change_keys() {
    let storage = MemoryStorage::new();
    let options = StoreOptions {
        storage_prefix: "app:".into(),
        storage_suffix: String::new(),
        persisted_paths: vec!["prefs".into()],
    };
    let mut store = StateStore::with_storage(options, storage.clone());
    store.set_state("prefs.theme.mode", json!("dark")).unwrap();
    store.set_state("session.id", json!(1)).unwrap();
    assert_eq!(storage.keys(), vec!["app:prefs"]);
}

struct BrokenStorage;

impl Storage for BrokenStorage {
    fn get_item(&self, _: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }
    fn set_item(&self, _: &str, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }
    fn remove_item(&self, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }
    fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("offline".into()))
    }
}

#[test]
fn storage_failures_are_swallowed() {
    let mut store = StateStore::with_storage(StoreOptions::default(), BrokenStorage);
    store.set_state("session.id", json!("abc")).unwrap();
    assert_eq!(store.get_state("session.id"), Some(&json!("abc")));
    assert_eq!(store.load_persisted_state(), 0);
}

#[test]
fn file_storage_survives_restart() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    {
        let mut store =
            StateStore::with_storage(StoreOptions::default(), FileStorage::new(temp_dir.path()));
        store.set_state("session.user", json!({"id": 7})).unwrap();
    }
    let mut store =
        StateStore::with_storage(StoreOptions::default(), FileStorage::new(temp_dir.path()));
    assert_eq!(store.load_persisted_state(), 1);
    assert_eq!(store.get_state("session.user.id"), Some(&json!(7)));
}
