//! Durable storage of the [`Store`] aggregate in a key-value medium.
//!
//! Every mutating operation builds the next store from the caller's, writes it
//! in full, and only then hands it back through the `&mut Store`. A failed
//! write therefore leaves the caller's store exactly as it was.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    category::{Category, CategoryId, CategoryPatch, NewCategory},
    clock::{Clock, SystemClock},
    storage::KeyValueStorage,
    store::{default_categories, seed_todos, Store},
    todo::{NewTodo, Todo, TodoId, TodoPatch},
};
use crate::error::{PersistenceError, Result, StorageError};

pub const STORAGE_KEY: &str = "taskflow-store";
pub const MIGRATION_KEY: &str = "taskflow-migrated";
pub const LEGACY_TODOS_KEY: &str = "taskflow-todos";
pub const LEGACY_CATEGORIES_KEY: &str = "taskflow-categories";

const ID_SUFFIX_LEN: usize = 7;
const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub struct Persistence<S, C = SystemClock> {
    storage: S,
    clock: C,
}

impl<S: KeyValueStorage> Persistence<S, SystemClock> {
    pub fn new(storage: S) -> Self { Self { storage, clock: SystemClock } }
}

impl<S: KeyValueStorage, C: Clock> Persistence<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self { Self { storage, clock } }

    pub fn storage(&self) -> &S { &self.storage }

    pub fn clock(&self) -> &C { &self.clock }

    fn seed(&self) -> Store { Store::seed(self.clock.now()) }

    /// Returns the persisted store, running the one-time legacy migration first
    /// if it has never run against this medium. Never fails: an unusable medium,
    /// a missing blob, or a blob that does not decode all yield the seed store.
    pub fn load(&self) -> Store {
        match self.storage.probe() {
            Ok(()) => {}
            // Same outcome as a disabled medium: the next successful save replaces
            // whatever blob is stored with the seed-based store.
            Err(StorageError::QuotaExceeded(reason)) => {
                warn!(code = "QUOTA_EXCEEDED", %reason, "storage is full, probe write rejected; using seed data");
                return self.seed();
            }
            Err(err) => {
                warn!(code = "STORAGE_UNAVAILABLE", error = %err, "storage unavailable; using seed data");
                return self.seed();
            }
        }

        match self.storage.get_item(MIGRATION_KEY) {
            Ok(None) => {
                if let Some(migrated) = self.migrate_legacy() {
                    return migrated;
                }
            }
            Ok(Some(_)) => {}
            Err(err) => warn!(error = %err, "failed to read migration sentinel"),
        }

        let raw = match self.storage.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.seed(),
            Err(err) => {
                warn!(error = %err, "failed to read store; using seed data");
                return self.seed();
            }
        };
        match Store::decode(&raw) {
            Ok(store) => store,
            Err(err) => {
                warn!(code = "PARSE_ERROR", error = %err, "stored data is malformed; using seed data");
                self.seed()
            }
        }
    }

    /// Folds the two legacy keys into the unified blob. The sentinel is written
    /// whether or not legacy data existed, except when the unified write itself
    /// fails: then legacy keys and sentinel are left untouched so the next
    /// session retries.
    fn migrate_legacy(&self) -> Option<Store> {
        let migrated = match self.read_legacy() {
            Ok(found) => found,
            Err(err) => {
                warn!(code = err.code(), error = %err, "legacy data could not be read; skipping migration");
                None
            }
        };

        if let Some(store) = &migrated {
            if let Err(err) = self.persist_migrated(store) {
                warn!(code = err.code(), error = %err, "failed to persist migrated store");
                return migrated;
            }
            self.remove_legacy_keys();
            info!(todos = store.todos.len(), categories = store.categories.len(), "migrated legacy data");
        }

        if let Err(err) = self.storage.set_item(MIGRATION_KEY, "true") {
            warn!(error = %err, "failed to write migration sentinel");
        }
        migrated
    }

    /// Legacy and unified copies may not fit side by side. On a quota failure the
    /// legacy keys are dropped and the write retried; if that still fails they
    /// are put back.
    fn persist_migrated(&self, store: &Store) -> Result<()> {
        match self.save(store) {
            Err(PersistenceError::QuotaExceeded) => {}
            other => return other,
        }
        let legacy: Vec<(&str, String)> = [LEGACY_TODOS_KEY, LEGACY_CATEGORIES_KEY]
            .into_iter()
            .filter_map(|key| self.storage.get_item(key).ok().flatten().map(|raw| (key, raw)))
            .collect();
        debug!("migrated store does not fit next to legacy data; retrying without it");
        self.remove_legacy_keys();
        if let Err(err) = self.save(store) {
            for (key, raw) in &legacy {
                if let Err(restore) = self.storage.set_item(key, raw) {
                    warn!(key, error = %restore, "failed to restore legacy key");
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn remove_legacy_keys(&self) {
        for key in [LEGACY_TODOS_KEY, LEGACY_CATEGORIES_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                warn!(key, error = %err, "failed to remove legacy key");
            }
        }
    }

    fn read_legacy(&self) -> Result<Option<Store>> {
        let todos = self.storage.get_item(LEGACY_TODOS_KEY)?;
        let categories = self.storage.get_item(LEGACY_CATEGORIES_KEY)?;
        if todos.is_none() && categories.is_none() {
            return Ok(None);
        }
        let now = self.clock.now();
        let todos = match todos {
            Some(raw) => serde_json::from_str(&raw)?,
            None => seed_todos(now),
        };
        let categories = match categories {
            Some(raw) => serde_json::from_str(&raw)?,
            None => default_categories(now),
        };
        let store = Store { todos, categories };
        store.check_unique_ids()?;
        Ok(Some(store))
    }

    /// Writes the full store, replacing whatever was there.
    pub fn save(&self, store: &Store) -> Result<()> {
        let encoded = store.encode()?;
        self.storage.set_item(STORAGE_KEY, &encoded)?;
        debug!(bytes = encoded.len(), todos = store.todos.len(), categories = store.categories.len(), "store saved");
        Ok(())
    }

    fn commit(&self, store: &mut Store, next: Store) -> Result<()> {
        self.save(&next)?;
        *store = next;
        Ok(())
    }

    fn fresh_id(&self, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = generate_id(now);
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn create_todo(&self, store: &mut Store, input: NewTodo) -> Result<Todo> {
        let now = self.clock.now();
        let id = self.fresh_id(now, |id| store.todos.iter().any(|t| t.id.as_str() == id));
        let todo = Todo {
            id: TodoId(id),
            title: input.title,
            description: input.description,
            priority: input.priority,
            category_id: input.category_id,
            due_date: input.due_date,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        };
        let mut next = store.clone();
        next.todos.push(todo.clone());
        self.commit(store, next)?;
        Ok(todo)
    }

    /// Merges `patch` over the task with `id`. `Ok(None)` when no such task exists.
    pub fn update_todo(&self, store: &mut Store, id: &TodoId, patch: TodoPatch) -> Result<Option<Todo>> {
        let Some(index) = store.todos.iter().position(|t| &t.id == id) else { return Ok(None) };
        let mut next = store.clone();
        let todo = &mut next.todos[index];
        patch.apply_to(todo);
        todo.updated_at = self.clock.now();
        let updated = todo.clone();
        self.commit(store, next)?;
        Ok(Some(updated))
    }

    pub fn delete_todo(&self, store: &mut Store, id: &TodoId) -> Result<bool> {
        if store.find_todo(id).is_none() {
            return Ok(false);
        }
        let mut next = store.clone();
        next.todos.retain(|t| &t.id != id);
        self.commit(store, next)?;
        Ok(true)
    }

    pub fn toggle_todo_completion(&self, store: &mut Store, id: &TodoId) -> Result<Option<Todo>> {
        let Some(todo) = store.find_todo(id) else { return Ok(None) };
        let patch = TodoPatch::completed(!todo.completed);
        self.update_todo(store, id, patch)
    }

    pub fn create_category(&self, store: &mut Store, input: NewCategory) -> Result<Category> {
        let now = self.clock.now();
        let id = self.fresh_id(now, |id| store.categories.iter().any(|c| c.id.as_str() == id));
        let category = Category { id: CategoryId(id), name: input.name, color: input.color, created_at: now };
        let mut next = store.clone();
        next.categories.push(category.clone());
        self.commit(store, next)?;
        Ok(category)
    }

    pub fn update_category(&self, store: &mut Store, id: &CategoryId, patch: CategoryPatch) -> Result<Option<Category>> {
        let Some(index) = store.categories.iter().position(|c| &c.id == id) else { return Ok(None) };
        let mut next = store.clone();
        patch.apply_to(&mut next.categories[index]);
        let updated = next.categories[index].clone();
        self.commit(store, next)?;
        Ok(Some(updated))
    }

    /// Removes the category and detaches every task that pointed at it, in one write.
    pub fn delete_category(&self, store: &mut Store, id: &CategoryId) -> Result<bool> {
        if store.find_category(id).is_none() {
            return Ok(false);
        }
        let now = self.clock.now();
        let mut next = store.clone();
        next.categories.retain(|c| &c.id != id);
        for todo in next.todos.iter_mut().filter(|t| t.category_id.as_ref() == Some(id)) {
            todo.category_id = None;
            todo.updated_at = now;
        }
        self.commit(store, next)?;
        Ok(true)
    }

    /// Drops the persisted blob. The migration sentinel stays, so the next
    /// [`load`](Self::load) hands back seed data.
    pub fn clear_all_data(&self) -> Result<()> {
        self.storage.remove_item(STORAGE_KEY)?;
        info!("stored data cleared");
        Ok(())
    }

    pub fn export_store(&self, store: &Store) -> Result<String> {
        Ok(serde_json::to_string_pretty(store)?)
    }

    /// Replaces the whole store with a decoded export. Malformed input fails with
    /// `PARSE_ERROR` before anything is written.
    pub fn import_store(&self, store: &mut Store, raw: &str) -> Result<()> {
        let imported = Store::decode(raw)?;
        self.commit(store, imported)?;
        info!(todos = store.todos.len(), categories = store.categories.len(), "store imported");
        Ok(())
    }
}

/// `<unix millis>-<7 base-36 chars>`; the random part comes from a v4 UUID.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
    for _ in 0..ID_SUFFIX_LEN {
        suffix.push(ID_ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("{}-{}", now.timestamp_millis(), suffix)
}
