use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::category::CategoryId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a caller supplies when creating a task; id and timestamps are assigned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
}

impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }
}

/// Partial update merged over an existing task.
///
/// `category_id` and `due_date` are doubly optional: an absent field leaves the
/// value alone, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(default, deserialize_with = "due_date::present")]
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self { completed: Some(completed), ..Self::default() }
    }

    pub fn apply_to(self, todo: &mut Todo) {
        if let Some(t) = self.title { todo.title = t; }
        if let Some(d) = self.description { todo.description = d; }
        if let Some(p) = self.priority { todo.priority = p; }
        if let Some(c) = self.category_id { todo.category_id = c; }
        if let Some(d) = self.due_date { todo.due_date = d; }
        if let Some(c) = self.completed { todo.completed = c; }
    }
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Due dates are written as `YYYY-MM-DD`. Full RFC 3339 timestamps are accepted
/// on the way in and reduced to their UTC calendar date.
pub(crate) mod due_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(raw.trim()).map(Some).ok_or_else(|| D::Error::custom(format!("invalid due date `{raw}`"))),
        }
    }

    pub fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error> {
        deserialize(deserializer).map(Some)
    }

    fn parse(raw: &str) -> Option<NaiveDate> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc).date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn due_date_accepts_timestamp_and_writes_plain_date() {
        let todo: Todo = serde_json::from_value(json!({
            "id": "todo-1",
            "title": "Welcome",
            "description": "",
            "priority": "high",
            "categoryId": null,
            "dueDate": "2024-03-09T23:30:00.000Z",
            "completed": false,
            "createdAt": "2024-03-08T10:00:00.000Z",
            "updatedAt": "2024-03-08T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(todo.due_date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(todo.priority, Priority::High);

        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["dueDate"], "2024-03-09");
        assert_eq!(value["categoryId"], serde_json::Value::Null);
    }

    #[test]
    fn patch_distinguishes_missing_from_null() {
        let keep: TodoPatch = serde_json::from_value(json!({ "title": "x" })).unwrap();
        assert!(keep.category_id.is_none());
        assert!(keep.due_date.is_none());

        let clear: TodoPatch = serde_json::from_value(json!({ "categoryId": null, "dueDate": null })).unwrap();
        assert_eq!(clear.category_id, Some(None));
        assert_eq!(clear.due_date, Some(None));

        let set: TodoPatch = serde_json::from_value(json!({ "categoryId": "work", "dueDate": "2025-01-02" })).unwrap();
        assert_eq!(set.category_id, Some(Some(CategoryId::from("work"))));
        assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2025, 1, 2)));
    }

    #[test]
    fn rejects_unknown_priority() {
        let err = serde_json::from_value::<NewTodo>(json!({ "title": "x", "priority": "urgent" }));
        assert!(err.is_err());
    }
}
