use tracing::debug;

use crate::application::persistence::Persistence;
use crate::domain::{
    category::{Category, CategoryId, CategoryPatch, NewCategory},
    clock::{Clock, SystemClock},
    storage::KeyValueStorage,
    store::Store,
    theme::Theme,
    todo::{NewTodo, Todo, TodoId, TodoPatch},
};
use crate::error::Result;

type Listener = Box<dyn Fn(&Store) + Send + Sync>;

/// Single-writer, in-memory mirror of the persisted store for one session.
///
/// Every mutation goes through [`Persistence`] first; the mirror only moves and
/// listeners only fire once the write has landed.
pub struct TaskStore<S, C = SystemClock> {
    persistence: Persistence<S, C>,
    store: Store,
    listeners: Vec<Listener>,
}

impl<S: KeyValueStorage, C: Clock> TaskStore<S, C> {
    /// Loads the store once; this is the only `load` of the session.
    pub fn open(persistence: Persistence<S, C>) -> Self {
        let store = persistence.load();
        debug!(todos = store.todos.len(), categories = store.categories.len(), "store opened");
        Self { persistence, store, listeners: Vec::new() }
    }

    pub fn snapshot(&self) -> &Store { &self.store }

    pub fn todos(&self) -> &[Todo] { &self.store.todos }

    pub fn categories(&self) -> &[Category] { &self.store.categories }

    pub fn persistence(&self) -> &Persistence<S, C> { &self.persistence }

    /// Registers a callback run with the new store after each successful mutation.
    pub fn subscribe(&mut self, listener: impl Fn(&Store) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.store);
        }
    }

    pub fn add_todo(&mut self, input: NewTodo) -> Result<Todo> {
        let todo = self.persistence.create_todo(&mut self.store, input)?;
        self.notify();
        Ok(todo)
    }

    pub fn update_todo(&mut self, id: &TodoId, patch: TodoPatch) -> Result<Option<Todo>> {
        let updated = self.persistence.update_todo(&mut self.store, id, patch)?;
        if updated.is_some() { self.notify(); }
        Ok(updated)
    }

    pub fn toggle_todo_completion(&mut self, id: &TodoId) -> Result<Option<Todo>> {
        let toggled = self.persistence.toggle_todo_completion(&mut self.store, id)?;
        if toggled.is_some() { self.notify(); }
        Ok(toggled)
    }

    pub fn remove_todo(&mut self, id: &TodoId) -> Result<bool> {
        let removed = self.persistence.delete_todo(&mut self.store, id)?;
        if removed { self.notify(); }
        Ok(removed)
    }

    pub fn add_category(&mut self, input: NewCategory) -> Result<Category> {
        let category = self.persistence.create_category(&mut self.store, input)?;
        self.notify();
        Ok(category)
    }

    pub fn update_category(&mut self, id: &CategoryId, patch: CategoryPatch) -> Result<Option<Category>> {
        let updated = self.persistence.update_category(&mut self.store, id, patch)?;
        if updated.is_some() { self.notify(); }
        Ok(updated)
    }

    pub fn remove_category(&mut self, id: &CategoryId) -> Result<bool> {
        let removed = self.persistence.delete_category(&mut self.store, id)?;
        if removed { self.notify(); }
        Ok(removed)
    }

    /// Wipes persisted data and resets the mirror to what a fresh load returns.
    pub fn clear_all_data(&mut self) -> Result<()> {
        self.persistence.clear_all_data()?;
        self.store = self.persistence.load();
        self.notify();
        Ok(())
    }

    pub fn export(&self) -> Result<String> {
        self.persistence.export_store(&self.store)
    }

    pub fn import(&mut self, raw: &str) -> Result<()> {
        self.persistence.import_store(&mut self.store, raw)?;
        self.notify();
        Ok(())
    }

    pub fn theme(&self) -> Theme { self.persistence.load_theme() }

    pub fn set_theme(&self, theme: Theme) -> Result<()> { self.persistence.save_theme(theme) }
}
