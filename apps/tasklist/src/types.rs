//! Domain types for the task list.
//!
//! Tasks live in a normalized collection: an ordered id list plus an
//! id → record map. [`TodoState`] keeps the two in a 1:1 relation for every
//! action sequence the reducer accepts.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tasklist_core::http::HttpError;

/// Server-assigned task identifier
///
/// The collection endpoint may answer with string or numeric ids; both
/// are kept as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a `TaskId` from its textual form
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Integer(id) => Self(id.to_string()),
        })
    }
}

/// A single task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// What needs to be done
    pub text: String,
    /// Whether the task is done
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Creates a task
    #[must_use]
    pub fn new(id: impl Into<TaskId>, text: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed,
        }
    }
}

/// Trim `text` and reject it when nothing is left
fn non_blank(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Payload of a create request: the text of a task the server has not seen yet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNewTask")]
pub struct NewTask {
    text: String,
}

#[derive(Deserialize)]
struct RawNewTask {
    text: String,
}

impl TryFrom<RawNewTask> for NewTask {
    type Error = ValidationError;

    fn try_from(raw: RawNewTask) -> Result<Self, Self::Error> {
        Self::new(&raw.text)
    }
}

impl NewTask {
    /// Creates a new task from user input, trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyText`] if the text is empty or
    /// whitespace only.
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            text: non_blank(text)?,
        })
    }

    /// The trimmed text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Body of the create call; new tasks always start open
    #[must_use]
    pub fn body(&self) -> Value {
        serde_json::json!({
            "completed": false,
            "text": self.text,
        })
    }
}

/// Payload of an update request: the task id and only the changed fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// Task to change
    pub id: TaskId,
    /// New text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New completion flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch renaming a task, with the text trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyText`] if the text is empty or
    /// whitespace only.
    pub fn rename(id: TaskId, text: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            text: Some(non_blank(text)?),
            completed: None,
        })
    }

    /// Patch setting the completion flag
    #[must_use]
    pub const fn completed(id: TaskId, completed: bool) -> Self {
        Self {
            id,
            text: None,
            completed: Some(completed),
        }
    }

    /// Body of the update call: the changed fields, without the id
    #[must_use]
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        if let Some(text) = &self.text {
            body.insert("text".to_string(), Value::String(text.clone()));
        }
        if let Some(completed) = self.completed {
            body.insert("completed".to_string(), Value::Bool(completed));
        }
        Value::Object(body)
    }
}

/// `{id}` payload of remove requests and remove successes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    /// Task id
    pub id: TaskId,
}

impl TaskRef {
    /// Reference a task by id
    #[must_use]
    pub const fn new(id: TaskId) -> Self {
        Self { id }
    }
}

/// A list of tasks as an ordered id list plus an id → record map
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTasks {
    /// Ids in server order
    pub all_ids: Vec<TaskId>,
    /// Records by id
    pub by_id: HashMap<TaskId, Task>,
}

impl NormalizedTasks {
    /// Normalize a list of tasks.
    ///
    /// A repeated id keeps its first position and its last record.
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut normalized = Self::default();
        for task in tasks {
            if !normalized.by_id.contains_key(&task.id) {
                normalized.all_ids.push(task.id.clone());
            }
            normalized.by_id.insert(task.id.clone(), task);
        }
        normalized
    }

    /// Drop repeated ids, ids without a record and records without an id
    #[must_use]
    pub fn into_consistent(mut self) -> Self {
        let mut seen = HashSet::with_capacity(self.all_ids.len());
        let by_id = &self.by_id;
        self.all_ids
            .retain(|id| by_id.contains_key(id) && seen.insert(id.clone()));
        self.by_id.retain(|id, _| seen.contains(id));
        self
    }
}

/// Kind of a failed network call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection or I/O failure
    Transport,
    /// Non-2xx answer
    Status,
    /// Body did not match the expected shape
    Decode,
    /// The API base URL cannot address the request
    InvalidUrl,
    /// No answer in time
    Timeout,
}

/// The last failed call, as kept in state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// What failed
    pub kind: ErrorKind,
    /// Human readable description
    pub message: String,
    /// HTTP status, for [`ErrorKind::Status`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// When the failure was observed
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    /// Describe an HTTP error observed at `occurred_at`
    #[must_use]
    pub fn from_http(error: &HttpError, occurred_at: DateTime<Utc>) -> Self {
        let kind = match error {
            HttpError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            HttpError::Transport { .. } => ErrorKind::Transport,
            HttpError::Timeout => ErrorKind::Timeout,
            HttpError::Status { .. } => ErrorKind::Status,
            HttpError::Decode { .. } => ErrorKind::Decode,
        };

        Self {
            kind,
            message: error.to_string(),
            status: error.status(),
            occurred_at,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// State of the task list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoState {
    /// Ids in insertion order
    pub all_ids: Vec<TaskId>,
    /// Records by id
    pub by_id: HashMap<TaskId, Task>,
    /// A list load is in flight
    pub loading: bool,
    /// Last failed call
    pub error: Option<ErrorInfo>,
}

impl TodoState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    /// Returns true if there are no tasks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    /// Returns a task by id
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.by_id.get(id)
    }

    /// Checks if a task exists
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of completed tasks
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.by_id.values().filter(|task| task.completed).count()
    }

    /// Tasks newest first, the order views list them in
    pub fn display_order(&self) -> impl Iterator<Item = &Task> {
        self.all_ids.iter().rev().filter_map(|id| self.by_id.get(id))
    }

    /// Every id has exactly one record, every record is listed once
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let unique: HashSet<&TaskId> = self.all_ids.iter().collect();
        unique.len() == self.all_ids.len()
            && unique.len() == self.by_id.len()
            && unique.iter().all(|id| self.by_id.contains_key(*id))
    }

    /// Replace the collection with a loaded list
    pub fn replace_all(&mut self, tasks: NormalizedTasks) {
        let NormalizedTasks { all_ids, by_id } = tasks.into_consistent();
        self.all_ids = all_ids;
        self.by_id = by_id;
    }

    /// Append a created task; an id already present keeps its position
    pub fn append(&mut self, task: Task) {
        if !self.by_id.contains_key(&task.id) {
            self.all_ids.push(task.id.clone());
        }
        self.by_id.insert(task.id.clone(), task);
    }

    /// Replace the record of a known task. Returns false for an unknown id.
    pub fn replace(&mut self, task: Task) -> bool {
        match self.by_id.get_mut(&task.id) {
            Some(existing) => {
                *existing = task;
                true
            }
            None => false,
        }
    }

    /// Remove a task. Returns the record if it was present.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let removed = self.by_id.remove(id)?;
        self.all_ids.retain(|existing| existing != id);
        Some(removed)
    }
}
