use std::collections::BTreeMap;

use logline_path::{ancestors, get, is_root_str, parse_path, set, validate_path, ROOT, SEPARATOR};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StateError;
use crate::events::{Action, ChangeEvent};
use crate::storage::{MemoryStorage, Storage};

type Listener = Box<dyn FnMut(&ChangeEvent) + Send + Sync>;
type Middleware = Box<dyn FnMut(&Action) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub storage_prefix: String,
    pub storage_suffix: String,
    /// Subtrees written to storage whenever a mutation touches them.
    pub persisted_paths: Vec<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_prefix: "flipapp_".to_string(),
            storage_suffix: "_default".to_string(),
            persisted_paths: vec!["session".to_string(), "chat.history".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    path: String,
    listener: Listener,
}

/// Observable JSON state tree addressed by dotted paths.
///
/// A write at `a.b.c` notifies subscribers of `a.b.c`, then of `a.b` and
/// `a`, then of `*`. Subscribers on one path are called in registration
/// order.
///
/// # Example
///
/// ```
/// use logline_state::StateStore;
/// use serde_json::json;
///
/// let mut store = StateStore::new();
/// store.set_state("user.profile.name", json!("João")).unwrap();
/// assert_eq!(store.get_state("user"), Some(&json!({"profile": {"name": "João"}})));
///
/// store.append_state("items", json!("a")).unwrap();
/// assert_eq!(store.get_state("items"), Some(&json!(["a"])));
/// ```
pub struct StateStore {
    state: Value,
    options: StoreOptions,
    storage: Box<dyn Storage>,
    next_subscription_id: u64,
    subscriptions: BTreeMap<u64, Subscription>,
    middleware: Vec<Middleware>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Store with default options backed by [`MemoryStorage`].
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self::with_storage(options, MemoryStorage::new())
    }

    pub fn with_storage(options: StoreOptions, storage: impl Storage + 'static) -> Self {
        Self {
            state: Value::Object(Map::new()),
            options,
            storage: Box::new(storage),
            next_subscription_id: 1,
            subscriptions: BTreeMap::new(),
            middleware: Vec::new(),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// The whole tree.
    pub fn snapshot(&self) -> &Value {
        &self.state
    }

    /// Value at `path`; `*` and `""` return the whole tree.
    pub fn get_state(&self, path: &str) -> Option<&Value> {
        get(&self.state, &parse_path(path))
    }

    /// Write `value` at `path`, creating intermediate objects.
    pub fn set_state(&mut self, path: &str, value: Value) -> Result<(), StateError> {
        let path = canonical(path);
        check_write(path, &value)?;
        self.apply(path, value)?;
        self.notify(path);
        self.persist(&[path]);
        Ok(())
    }

    /// Push `value` onto the sequence at `path`. Anything else at `path`,
    /// including nothing, is replaced by `[value]`.
    pub fn append_state(&mut self, path: &str, value: Value) -> Result<(), StateError> {
        let items = match self.get_state(path) {
            Some(Value::Array(items)) => {
                let mut items = items.clone();
                items.push(value);
                items
            }
            _ => vec![value],
        };
        self.set_state(path, Value::Array(items))
    }

    /// Apply several writes, then notify for each, then persist.
    ///
    /// The writes are staged on a copy of the tree, which replaces the
    /// state only once every write has succeeded. A failed batch changes
    /// nothing and notifies no one.
    pub fn batch_update<I, K>(&mut self, updates: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let updates: Vec<(String, Value)> = updates
            .into_iter()
            .map(|(path, value)| (canonical(&path.into()).to_string(), value))
            .collect();
        for (path, value) in &updates {
            check_write(path, value)?;
        }
        let mut staged = self.state.clone();
        for (path, value) in &updates {
            set(&mut staged, &parse_path(path), value.clone())
                .map_err(|err| StateError::invalid_path(path, err))?;
        }
        let paths: Vec<String> = updates.iter().map(|(path, _)| path.clone()).collect();
        for (path, value) in updates {
            self.dispatch(&Action::set_state(path, value));
        }
        self.state = staged;
        tracing::trace!(writes = paths.len(), "batch applied");
        for path in &paths {
            self.notify(path);
        }
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        self.persist(&paths);
        Ok(())
    }

    /// Clear the tree. Subscriptions stay registered and are not called;
    /// storage is left alone.
    pub fn reset_state(&mut self) {
        self.dispatch(&Action::reset());
        self.state = Value::Object(Map::new());
        tracing::debug!("state reset");
    }

    /// Register a listener for writes at or below `path` (`*` for every
    /// write). The listener is not called on registration.
    pub fn subscribe<F>(&mut self, path: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.next_subscription_id;
        self.next_subscription_id = self.next_subscription_id.saturating_add(1);
        let path = canonical(&path.into()).to_string();
        self.subscriptions.insert(
            id,
            Subscription {
                path,
                listener: Box::new(listener),
            },
        );
        SubscriptionId(id)
    }

    /// Remove exactly one registration.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id.0).is_some()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Register an inspection hook that sees every action before it is
    /// applied.
    pub fn add_middleware<F>(&mut self, middleware: F)
    where
        F: FnMut(&Action) + Send + Sync + 'static,
    {
        self.middleware.push(Box::new(middleware));
    }

    /// Storage key for a persisted path: `session` becomes
    /// `flipapp_session_default` with the default options.
    pub fn storage_key(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.options.storage_prefix,
            path.replace(SEPARATOR, "_"),
            self.options.storage_suffix
        )
    }

    /// Seed persisted paths from storage without notifying. Returns how
    /// many paths were loaded.
    pub fn load_persisted_state(&mut self) -> usize {
        let mut loaded = 0;
        for path in self.options.persisted_paths.clone() {
            let key = self.storage_key(&path);
            let text = match self.storage.get_item(&key) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "failed to read persisted state");
                    continue;
                }
            };
            let value: Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "skipping malformed persisted state");
                    continue;
                }
            };
            match set(&mut self.state, &parse_path(&path), value) {
                Ok(()) => loaded += 1,
                Err(err) => tracing::warn!(path = %path, error = %err, "cannot seed persisted state"),
            }
        }
        tracing::debug!(loaded, "persisted state loaded");
        loaded
    }

    fn apply(&mut self, path: &str, value: Value) -> Result<(), StateError> {
        let action = Action::set_state(path, value);
        self.dispatch(&action);
        set(&mut self.state, &parse_path(path), action.value)
            .map_err(|err| StateError::invalid_path(path, err))?;
        tracing::trace!(path, "state updated");
        Ok(())
    }

    fn dispatch(&mut self, action: &Action) {
        for middleware in &mut self.middleware {
            middleware(action);
        }
    }

    fn notify(&mut self, changed: &str) {
        if self.subscriptions.is_empty() {
            return;
        }
        let mut targets = Vec::new();
        if !is_root_str(changed) {
            targets.push(changed.to_string());
            targets.extend(ancestors(changed));
        }
        targets.push(ROOT.to_string());

        let state = &self.state;
        for target in targets {
            if !self.subscriptions.values().any(|s| s.path == target) {
                continue;
            }
            let event = ChangeEvent {
                value: get(state, &parse_path(&target)).cloned(),
                path: target,
                changed: changed.to_string(),
            };
            for subscription in self.subscriptions.values_mut() {
                if subscription.path == event.path {
                    (subscription.listener)(&event);
                }
            }
        }
    }

    /// Write every persisted subtree related to one of `changed`.
    fn persist(&self, changed: &[&str]) {
        for persisted in &self.options.persisted_paths {
            if !changed.iter().any(|path| related(path, persisted)) {
                continue;
            }
            let key = self.storage_key(persisted);
            let result = match self.get_state(persisted) {
                Some(value) => self.storage.set_item(&key, &value.to_string()),
                None => self.storage.remove_item(&key),
            };
            if let Err(err) = result {
                tracing::warn!(key = %key, error = %err, "failed to persist state");
            }
        }
    }
}

fn canonical(path: &str) -> &str {
    if is_root_str(path) {
        ROOT
    } else {
        path
    }
}

fn check_write(path: &str, value: &Value) -> Result<(), StateError> {
    validate_path(path).map_err(|err| StateError::invalid_path(path, err))?;
    if is_root_str(path) && !value.is_object() {
        return Err(StateError::RootNotObject);
    }
    Ok(())
}

/// Same path, or one is an ancestor of the other.
fn related(a: &str, b: &str) -> bool {
    if is_root_str(a) || is_root_str(b) {
        return true;
    }
    let nested = |outer: &str, inner: &str| {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(SEPARATOR))
    };
    nested(a, b) || nested(b, a)
}
