//! Action lifecycles and the action factory.
//!
//! Every asynchronous operation moves through four stages:
//!
//! ```text
//! request ──► success
//!    │   └──► failure
//!    └──────► discard   (outcome of in-flight calls is dropped)
//! ```
//!
//! Typed action enums wrap one [`Lifecycle`] per operation. The untyped side
//! of this module ([`create_actions`], [`ActionRecord`]) builds plain
//! `{type, payload?, meta?}` records whose type strings are derived from
//! verb + entity + stage, e.g. `CREATE_TODO.REQUEST`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the operation part of a type string and its stage.
pub const STAGE_SEPARATOR: char = '.';

/// The phase of an asynchronous action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Intent to start the operation
    Request,
    /// Cancellation of in-flight calls of the operation
    Discard,
    /// The operation completed
    Success,
    /// The operation failed
    Failure,
}

impl Stage {
    /// All stages in lifecycle order
    pub const ALL: [Self; 4] = [Self::Request, Self::Discard, Self::Success, Self::Failure];

    /// Uppercase suffix used in type strings
    #[must_use]
    pub const fn as_suffix(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Discard => "DISCARD",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_suffix())
    }
}

impl FromStr for Stage {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_suffix().eq_ignore_ascii_case(s))
            .ok_or_else(|| RecordError::InvalidType(s.to_string()))
    }
}

/// One operation's action, tagged by lifecycle stage.
///
/// # Type Parameters
///
/// - `Req`: payload of the request (what the user asked for)
/// - `Res`: payload of the success (what the server answered, transformed)
/// - `Err`: payload of the failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "payload", rename_all = "snake_case")]
pub enum Lifecycle<Req, Res, Err> {
    /// Start the operation
    Request(Req),
    /// Drop the outcome of every in-flight call of the operation
    Discard,
    /// The operation completed
    Success(Res),
    /// The operation failed
    Failure(Err),
}

impl<Req, Res, Err> Lifecycle<Req, Res, Err> {
    /// The stage of this action
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Request(_) => Stage::Request,
            Self::Discard => Stage::Discard,
            Self::Success(_) => Stage::Success,
            Self::Failure(_) => Stage::Failure,
        }
    }

    /// Returns true for success and failure
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failure(_))
    }

    /// Build the settled action from a result
    pub fn settle(result: Result<Res, Err>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

/// Dispatch key of an action: operation name plus optional stage.
///
/// # Examples
///
/// ```
/// use tasklist_core::action::{ActionType, Stage};
///
/// let ty = ActionType::new(Some("obtain"), "todoList", Some(Stage::Request));
/// assert_eq!(ty.to_string(), "OBTAIN_TODO_LIST.REQUEST");
/// assert_eq!(ty.operation(), "OBTAIN_TODO_LIST");
///
/// let parsed: ActionType = "OBTAIN_TODO_LIST.REQUEST".parse().unwrap();
/// assert_eq!(parsed, ty);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionType {
    operation: String,
    stage: Option<Stage>,
}

impl ActionType {
    /// Build a type from verb, entity and stage.
    ///
    /// The verb is uppercased, the entity converted to `SCREAMING_SNAKE_CASE`.
    #[must_use]
    pub fn new(verb: Option<&str>, entity: &str, stage: Option<Stage>) -> Self {
        let entity = screaming_snake_case(entity);
        let operation = match verb {
            Some(verb) => format!("{}_{entity}", verb.to_uppercase()),
            None => entity,
        };
        Self { operation, stage }
    }

    /// Build a type from an already formatted operation name.
    #[must_use]
    pub fn from_operation(operation: impl Into<String>, stage: Option<Stage>) -> Self {
        Self {
            operation: operation.into(),
            stage,
        }
    }

    /// The operation part, e.g. `CREATE_TODO`
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The stage part, if any
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// The same operation at another stage
    #[must_use]
    pub fn with_stage(&self, stage: Stage) -> Self {
        Self {
            operation: self.operation.clone(),
            stage: Some(stage),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{}{STAGE_SEPARATOR}{stage}", self.operation),
            None => f.write_str(&self.operation),
        }
    }
}

impl FromStr for ActionType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (operation, stage) = match s.rsplit_once(STAGE_SEPARATOR) {
            Some((operation, stage)) => (operation, Some(stage.parse()?)),
            None => (s, None),
        };
        if operation.is_empty() {
            return Err(RecordError::InvalidType(s.to_string()));
        }
        Ok(Self::from_operation(operation, stage))
    }
}

impl TryFrom<String> for ActionType {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.to_string()
    }
}

/// Errors converting between untyped records and typed actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The type string is malformed
    #[error("Invalid action type: {0}")]
    InvalidType(String),

    /// No typed action corresponds to this type string
    #[error("Unknown action type: {0}")]
    UnknownType(String),

    /// The record has no payload but the action needs one
    #[error("Action {0} requires a payload")]
    MissingPayload(String),

    /// The payload does not match the action's payload type
    #[error("Invalid payload for {action_type}: {message}")]
    InvalidPayload {
        /// Type string of the offending record
        action_type: String,
        /// Deserialization error
        message: String,
    },
}

/// A plain action record: `{type, payload?, meta?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Dispatch key
    #[serde(rename = "type")]
    pub action_type: ActionType,

    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Optional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ActionRecord {
    /// Deserialize the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingPayload`] when there is no payload and
    /// [`RecordError::InvalidPayload`] when it does not deserialize.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, RecordError> {
        let payload = self
            .payload
            .clone()
            .ok_or_else(|| RecordError::MissingPayload(self.action_type.to_string()))?;
        serde_json::from_value(payload).map_err(|e| RecordError::InvalidPayload {
            action_type: self.action_type.to_string(),
            message: e.to_string(),
        })
    }
}

/// Builds records of one action type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionCreator {
    action_type: ActionType,
}

impl ActionCreator {
    /// Create a creator for the given type
    #[must_use]
    pub const fn new(action_type: ActionType) -> Self {
        Self { action_type }
    }

    /// The type of the records this creator builds
    #[must_use]
    pub const fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    /// Build a record. `None` and JSON `null` are left out of the record.
    #[must_use]
    pub fn create(&self, payload: Option<Value>, meta: Option<Value>) -> ActionRecord {
        ActionRecord {
            action_type: self.action_type.clone(),
            payload: payload.filter(|v| !v.is_null()),
            meta: meta.filter(|v| !v.is_null()),
        }
    }

    /// Returns true if the record was built by this creator
    #[must_use]
    pub fn matches(&self, record: &ActionRecord) -> bool {
        record.action_type == self.action_type
    }
}

/// The four stage creators of one operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleActions {
    /// `*.REQUEST`
    pub request: ActionCreator,
    /// `*.DISCARD`
    pub discard: ActionCreator,
    /// `*.SUCCESS`
    pub success: ActionCreator,
    /// `*.FAILURE`
    pub failure: ActionCreator,
}

impl LifecycleActions {
    /// Build the four creators for `verb` + `entity`
    #[must_use]
    pub fn new(verb: Option<&str>, entity: &str) -> Self {
        let creator = |stage| ActionCreator::new(ActionType::new(verb, entity, Some(stage)));
        Self {
            request: creator(Stage::Request),
            discard: creator(Stage::Discard),
            success: creator(Stage::Success),
            failure: creator(Stage::Failure),
        }
    }

    /// The creator for a stage
    #[must_use]
    pub const fn get(&self, stage: Stage) -> &ActionCreator {
        match stage {
            Stage::Request => &self.request,
            Stage::Discard => &self.discard,
            Stage::Success => &self.success,
            Stage::Failure => &self.failure,
        }
    }

    /// The operation name shared by the four creators
    #[must_use]
    pub fn operation(&self) -> &str {
        self.request.action_type().operation()
    }
}

/// How an entity is registered with [`create_actions`].
#[derive(Clone, Copy, Debug)]
pub enum EntitySpec<'a> {
    /// One lifecycle per verb, keyed `verb + UpperFirst(entity)`
    Verbs(&'a [&'a str]),
    /// One lifecycle without verb prefix, keyed by the entity
    Lifecycle,
    /// A single stage-less creator, keyed by the entity
    Plain,
}

/// Creators registered under one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityActions {
    /// Stage-less action
    Plain(ActionCreator),
    /// Four-stage lifecycle
    Lifecycle(LifecycleActions),
}

/// Registry produced by [`create_actions`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionCreators {
    entries: BTreeMap<String, EntityActions>,
}

impl ActionCreators {
    /// Look up the creators registered under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EntityActions> {
        self.entries.get(key)
    }

    /// Look up a lifecycle registered under `key`
    #[must_use]
    pub fn lifecycle(&self, key: &str) -> Option<&LifecycleActions> {
        match self.entries.get(key)? {
            EntityActions::Lifecycle(actions) => Some(actions),
            EntityActions::Plain(_) => None,
        }
    }

    /// Find the key and stage that produce `action_type`
    #[must_use]
    pub fn resolve(&self, action_type: &ActionType) -> Option<(&str, Option<Stage>)> {
        self.entries.iter().find_map(|(key, actions)| {
            let found = match actions {
                EntityActions::Plain(creator) => creator.action_type() == action_type,
                EntityActions::Lifecycle(lifecycle) => action_type
                    .stage()
                    .is_some_and(|stage| lifecycle.get(stage).action_type() == action_type),
            };
            found.then_some((key.as_str(), action_type.stage()))
        })
    }

    /// All registered keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build action creators for a set of entities.
///
/// # Examples
///
/// ```
/// use tasklist_core::action::{create_actions, EntitySpec, Stage};
///
/// let actions = create_actions(&[
///     ("todo", EntitySpec::Verbs(&["create", "update", "remove"])),
///     ("todoList", EntitySpec::Verbs(&["obtain"])),
/// ]);
///
/// let create = actions.lifecycle("createTodo").unwrap();
/// assert_eq!(create.request.action_type().to_string(), "CREATE_TODO.REQUEST");
///
/// let obtain = actions.lifecycle("obtainTodoList").unwrap();
/// assert_eq!(obtain.get(Stage::Success).action_type().to_string(), "OBTAIN_TODO_LIST.SUCCESS");
/// ```
#[must_use]
pub fn create_actions(entities: &[(&str, EntitySpec<'_>)]) -> ActionCreators {
    let mut entries = BTreeMap::new();

    for (entity, spec) in entities {
        match spec {
            EntitySpec::Verbs(verbs) => {
                for verb in *verbs {
                    entries.insert(
                        format!("{verb}{}", upper_first(entity)),
                        EntityActions::Lifecycle(LifecycleActions::new(Some(verb), entity)),
                    );
                }
            }
            EntitySpec::Lifecycle => {
                entries.insert(
                    (*entity).to_string(),
                    EntityActions::Lifecycle(LifecycleActions::new(None, entity)),
                );
            }
            EntitySpec::Plain => {
                entries.insert(
                    (*entity).to_string(),
                    EntityActions::Plain(ActionCreator::new(ActionType::new(None, entity, None))),
                );
            }
        }
    }

    ActionCreators { entries }
}

/// Convert `todoList`, `TodoList`, `todo-list` or `todo list` to `TODO_LIST`.
#[must_use]
pub fn screaming_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let opens_word = i
            .checked_sub(1)
            .and_then(|p| chars.get(p))
            .is_some_and(|&prev| starts_word(prev, c, chars.get(i + 1).copied()));
        if opens_word && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| word.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Whether `c` opens a new word after `prev`. Digit runs are words of
/// their own: `todo2List` -> todo | 2 | List.
fn starts_word(prev: char, c: char, next: Option<char>) -> bool {
    if prev.is_numeric() != c.is_numeric() {
        return true;
    }
    c.is_uppercase()
        && (prev.is_lowercase()
            // End of an acronym: "HTTPRequest" -> HTTP | Request
            || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)))
}

fn upper_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)] // Test code

    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn screaming_snake_handles_common_spellings() {
        assert_eq!(screaming_snake_case("todo"), "TODO");
        assert_eq!(screaming_snake_case("todoList"), "TODO_LIST");
        assert_eq!(screaming_snake_case("TodoList"), "TODO_LIST");
        assert_eq!(screaming_snake_case("todo-list"), "TODO_LIST");
        assert_eq!(screaming_snake_case("todo list"), "TODO_LIST");
        assert_eq!(screaming_snake_case("HTTPRequest"), "HTTP_REQUEST");
        assert_eq!(screaming_snake_case(""), "");
    }

    #[test]
    fn digits_split_into_their_own_word() {
        assert_eq!(screaming_snake_case("todo2List"), "TODO_2_LIST");
        assert_eq!(screaming_snake_case("Todo2List"), "TODO_2_LIST");
        assert_eq!(screaming_snake_case("todo-2-list"), "TODO_2_LIST");
        assert_eq!(screaming_snake_case("v10"), "V_10");
        assert_eq!(screaming_snake_case("HTTP2Request"), "HTTP_2_REQUEST");

        let ty = ActionType::new(Some("create"), "todo2List", Some(Stage::Request));
        assert_eq!(ty.to_string(), "CREATE_TODO_2_LIST.REQUEST");

        let creators = create_actions(&[("todo2List", EntitySpec::Verbs(&["obtain"]))]);
        let obtain = creators.lifecycle("obtainTodo2List").unwrap();
        assert_eq!(obtain.request.action_type().to_string(), "OBTAIN_TODO_2_LIST.REQUEST");
    }

    #[test]
    fn verbs_produce_four_stage_creators_each() {
        let actions = create_actions(&[("todo", EntitySpec::Verbs(&["create", "update", "remove"]))]);

        assert_eq!(
            actions.keys().collect::<Vec<_>>(),
            vec!["createTodo", "removeTodo", "updateTodo"]
        );

        let update = actions.lifecycle("updateTodo").unwrap();
        let types: Vec<String> = Stage::ALL
            .iter()
            .map(|stage| update.get(*stage).action_type().to_string())
            .collect();
        assert_eq!(
            types,
            vec![
                "UPDATE_TODO.REQUEST",
                "UPDATE_TODO.DISCARD",
                "UPDATE_TODO.SUCCESS",
                "UPDATE_TODO.FAILURE"
            ]
        );
        assert_eq!(update.operation(), "UPDATE_TODO");
    }

    #[test]
    fn entity_without_verbs() {
        let actions = create_actions(&[
            ("session", EntitySpec::Lifecycle),
            ("reset", EntitySpec::Plain),
        ]);

        let session = actions.lifecycle("session").unwrap();
        assert_eq!(session.request.action_type().to_string(), "SESSION.REQUEST");

        match actions.get("reset").unwrap() {
            EntityActions::Plain(creator) => {
                assert_eq!(creator.action_type().to_string(), "RESET");
            }
            EntityActions::Lifecycle(_) => panic!("expected a plain creator"),
        }
        assert!(actions.lifecycle("reset").is_none());
    }

    #[test]
    fn creator_omits_absent_payload_and_meta() {
        let creator = ActionCreator::new(ActionType::new(Some("remove"), "todo", Some(Stage::Request)));

        let bare = creator.create(None, Some(Value::Null));
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({ "type": "REMOVE_TODO.REQUEST" })
        );

        let full = creator.create(Some(json!({ "id": "1" })), Some(json!({ "source": "cli" })));
        assert_eq!(
            serde_json::to_value(&full).unwrap(),
            json!({
                "type": "REMOVE_TODO.REQUEST",
                "payload": { "id": "1" },
                "meta": { "source": "cli" }
            })
        );
        assert!(creator.matches(&full));
    }

    #[test]
    fn resolve_finds_key_and_stage() {
        let actions = create_actions(&[("todoList", EntitySpec::Verbs(&["obtain"]))]);
        let ty: ActionType = "OBTAIN_TODO_LIST.DISCARD".parse().unwrap();

        assert_eq!(actions.resolve(&ty), Some(("obtainTodoList", Some(Stage::Discard))));
        assert_eq!(actions.resolve(&"OBTAIN_TODO.DISCARD".parse().unwrap()), None);
    }

    #[test]
    fn action_type_rejects_unknown_stage() {
        assert!("CREATE_TODO.LATER".parse::<ActionType>().is_err());
        assert!(".REQUEST".parse::<ActionType>().is_err());
        assert_eq!(
            "RESET".parse::<ActionType>().unwrap(),
            ActionType::from_operation("RESET", None)
        );
    }

    #[test]
    fn record_payload_as_reports_missing_and_invalid() {
        let creator = ActionCreator::new(ActionType::new(Some("create"), "todo", Some(Stage::Request)));

        let missing = creator.create(None, None);
        assert!(matches!(
            missing.payload_as::<String>(),
            Err(RecordError::MissingPayload(_))
        ));

        let invalid = creator.create(Some(json!(42)), None);
        assert!(matches!(
            invalid.payload_as::<String>(),
            Err(RecordError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn lifecycle_settle_and_stage() {
        let ok: Lifecycle<(), u8, String> = Lifecycle::settle(Ok(1));
        let err: Lifecycle<(), u8, String> = Lifecycle::settle(Err("boom".to_string()));

        assert_eq!(ok.stage(), Stage::Success);
        assert_eq!(err.stage(), Stage::Failure);
        assert!(ok.is_settled());
        assert!(!Lifecycle::<(), u8, String>::Discard.is_settled());
    }

    proptest! {
        #[test]
        fn type_strings_parse_back(words in proptest::collection::vec("[a-z]{1,8}", 1..4), stage_idx in 0usize..4) {
            let entity = words.join("-");
            let ty = ActionType::new(Some("obtain"), &entity, Some(Stage::ALL[stage_idx]));
            let parsed: ActionType = ty.to_string().parse().unwrap();
            prop_assert_eq!(parsed, ty);
        }
    }
}
