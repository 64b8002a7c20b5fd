use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Opaque record key. Generated ids are UUID v4 strings, but any string read
/// back from the table or taken from a request path is accepted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for TodoId {
    fn default() -> Self { Self::generate() }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self { Self(value) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub is_complete: bool,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_complete && self.due_date < now
    }
}

/// Body of a create (POST) or full replacement (PUT). Every field is optional
/// at the wire level so presence is checked by the service, not the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "due_date_opt")]
    pub due_date: Option<DateTime<Utc>>,
}

pub type ReplaceTodo = CreateTodo;

/// Body of a partial update (PATCH).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "due_date_opt")]
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTodo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_complete.is_none() && self.due_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised due date `{0}`; expected RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]")]
pub struct InvalidDueDate(pub String);

/// Parses a due date. Offset-less datetimes are taken as UTC and a bare date
/// as midnight UTC.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, InvalidDueDate> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| InvalidDueDate(raw.to_string()))
}

fn due_date_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_due_date(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Validated field deltas handed to the store. `updated_at` is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_complete: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TodoChanges {
    pub fn apply_to(&self, todo: &mut Todo) {
        if let Some(t) = &self.title { todo.title = t.clone(); }
        if let Some(d) = &self.description { todo.description = d.clone(); }
        if let Some(c) = self.is_complete { todo.is_complete = c; }
        if let Some(due) = self.due_date { todo.due_date = due; }
        todo.updated_at = self.updated_at;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TodoStats {
    pub fn tally<'a>(todos: impl IntoIterator<Item = &'a Todo>, now: DateTime<Utc>) -> Self {
        todos.into_iter().fold(Self::default(), |mut stats, todo| {
            stats.total += 1;
            if todo.is_complete {
                stats.completed += 1;
            } else {
                stats.pending += 1;
                if todo.is_overdue(now) { stats.overdue += 1; }
            }
            stats
        })
    }
}

/// Latest due date first; equal due dates fall back to id order so listings are stable.
pub fn by_due_date_desc(a: &Todo, b: &Todo) -> Ordering {
    b.due_date.cmp(&a.due_date).then_with(|| a.id.cmp(&b.id))
}
