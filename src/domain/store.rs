use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{de::Error as _, Deserialize, Serialize};

use super::category::{Category, CategoryId};
use super::todo::{Priority, Todo, TodoId};

/// The aggregate root: every task and category, persisted as one blob.
///
/// Task order is insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub todos: Vec<Todo>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Store {
    /// Demo content shown when nothing has been persisted yet.
    pub fn seed(now: DateTime<Utc>) -> Self {
        Self { todos: seed_todos(now), categories: default_categories(now) }
    }

    /// Decodes a serialized store. Anything that is not a JSON object with
    /// `todos` and `categories` lists of well-formed entries with distinct ids
    /// is rejected.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        let store: Self = serde_json::from_str(raw)?;
        store.check_unique_ids()?;
        Ok(store)
    }

    pub fn check_unique_ids(&self) -> serde_json::Result<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = self.todos.iter().find(|t| !seen.insert(t.id.as_str())) {
            return Err(serde_json::Error::custom(format!("duplicate todo id `{}`", dup.id)));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.categories.iter().find(|c| !seen.insert(c.id.as_str())) {
            return Err(serde_json::Error::custom(format!("duplicate category id `{}`", dup.id)));
        }
        Ok(())
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn find_todo(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    pub fn find_category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn todos_in_category<'a>(&'a self, id: &'a CategoryId) -> impl Iterator<Item = &'a Todo> + 'a {
        self.todos.iter().filter(move |t| t.category_id.as_ref() == Some(id))
    }

    pub fn uncategorized(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(|t| t.category_id.is_none())
    }

    pub fn stats(&self) -> StoreStats {
        let completed = self.todos.iter().filter(|t| t.completed).count();
        StoreStats { total: self.todos.len(), completed, pending: self.todos.len() - completed }
    }
}

pub fn default_categories(now: DateTime<Utc>) -> Vec<Category> {
    [
        ("work", "Work", "oklch(0.6 0.15 200)"),
        ("personal", "Personal", "oklch(0.65 0.15 320)"),
        ("shopping", "Shopping", "oklch(0.55 0.15 120)"),
        ("health", "Health", "oklch(0.6 0.15 140)"),
        ("projects", "Projects", "oklch(0.7 0.15 60)"),
    ]
    .into_iter()
    .map(|(id, name, color)| Category {
        id: CategoryId::from(id),
        name: name.to_string(),
        color: color.to_string(),
        created_at: now,
    })
    .collect()
}

pub fn seed_todos(now: DateTime<Utc>) -> Vec<Todo> {
    let todo = |id: &str, title: &str, description: &str, priority: Priority| Todo {
        id: TodoId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        category_id: None,
        due_date: None,
        completed: false,
        created_at: now,
        updated_at: now,
    };
    let mut welcome = todo(
        "todo-1",
        "Welcome to TaskFlow!",
        "This is your first task. Feel free to edit or delete it.",
        Priority::Medium,
    );
    welcome.due_date = Some((now + Duration::days(1)).date_naive());
    vec![
        welcome,
        todo("todo-2", "Try creating a new task", "Click the 'Add Task' button to create your first task.", Priority::Low),
        todo("todo-3", "Explore categories", "Organize your tasks by categories for better management.", Priority::Medium),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() }

    #[test]
    fn seed_has_three_todos_and_five_categories() {
        let store = Store::seed(now());
        assert_eq!(store.todos.len(), 3);
        assert_eq!(store.categories.len(), 5);
        assert_eq!(store.todos[0].due_date, chrono::NaiveDate::from_ymd_opt(2024, 5, 2));
        assert!(store.todos.iter().all(|t| t.created_at == t.updated_at));
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        assert!(Store::decode("not json").is_err());
        assert!(Store::decode(r#"{"todos": {}, "categories": []}"#).is_err());
        assert!(Store::decode(r#"{"todos": []}"#).is_err());
        assert_eq!(Store::decode(r#"{"todos": [], "categories": []}"#).unwrap(), Store::default());
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let mut store = Store::seed(now());
        store.todos.push(store.todos[0].clone());
        let err = Store::decode(&store.encode().unwrap()).unwrap_err();
        assert!(err.to_string().contains("duplicate todo id `todo-1`"));

        let mut store = Store::seed(now());
        store.categories.push(store.categories[4].clone());
        let err = Store::decode(&store.encode().unwrap()).unwrap_err();
        assert!(err.to_string().contains("duplicate category id `projects`"));
    }

    #[test]
    fn queries_filter_by_category() {
        let mut store = Store::seed(now());
        let work = CategoryId::from("work");
        store.todos[1].category_id = Some(work.clone());
        store.todos[2].completed = true;

        let in_work: Vec<_> = store.todos_in_category(&work).map(|t| t.id.as_str()).collect();
        assert_eq!(in_work, vec!["todo-2"]);
        assert_eq!(store.uncategorized().count(), 2);
        assert_eq!(store.stats(), StoreStats { total: 3, completed: 1, pending: 2 });
        assert!(store.find_category(&work).is_some());
        assert!(store.find_todo(&TodoId::from("missing")).is_none());
    }
}
