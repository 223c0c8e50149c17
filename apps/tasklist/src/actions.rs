//! Actions of the task list.
//!
//! One [`Lifecycle`] per operation against the `/todos` collection. The
//! derived type strings (`CREATE_TODO.REQUEST`, `OBTAIN_TODO_LIST.SUCCESS`,
//! ...) are the same the untyped factory in [`action_creators`] builds, so
//! typed actions and plain records convert into each other.

use crate::types::{ErrorInfo, NewTask, NormalizedTasks, Task, TaskPatch, TaskRef};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tasklist_core::action::{
    ActionCreator, ActionCreators, ActionRecord, EntitySpec, Lifecycle, RecordError, Stage,
    create_actions,
};
use tasklist_macros::Action;

/// Every input of the task list reducer
#[derive(Action, Clone, Debug, PartialEq)]
pub enum TodoAction {
    /// Load the whole collection
    ObtainTodoList(Lifecycle<(), NormalizedTasks, ErrorInfo>),
    /// Create a task; the server assigns its id
    CreateTodo(Lifecycle<NewTask, Task, ErrorInfo>),
    /// Change fields of a task
    UpdateTodo(Lifecycle<TaskPatch, Task, ErrorInfo>),
    /// Delete a task
    RemoveTodo(Lifecycle<TaskRef, TaskRef, ErrorInfo>),
}

/// An operation whose in-flight calls can be discarded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List load
    ObtainTodoList,
    /// Task creation
    CreateTodo,
    /// Task update
    UpdateTodo,
    /// Task deletion
    RemoveTodo,
}

impl Operation {
    /// The discard action of this operation
    #[must_use]
    pub const fn discard(self) -> TodoAction {
        match self {
            Self::ObtainTodoList => TodoAction::ObtainTodoList(Lifecycle::Discard),
            Self::CreateTodo => TodoAction::CreateTodo(Lifecycle::Discard),
            Self::UpdateTodo => TodoAction::UpdateTodo(Lifecycle::Discard),
            Self::RemoveTodo => TodoAction::RemoveTodo(Lifecycle::Discard),
        }
    }
}

/// Untyped creators for the task list, keyed `createTodo`, `obtainTodoList`, ...
#[must_use]
pub fn action_creators() -> ActionCreators {
    create_actions(&[
        ("todo", EntitySpec::Verbs(&["create", "update", "remove"])),
        ("todoList", EntitySpec::Verbs(&["obtain"])),
    ])
}

impl TodoAction {
    /// Convert into a plain `{type, payload?}` record.
    ///
    /// Typed actions have no metadata, so the record never has `meta`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidPayload`] if the payload does not
    /// serialize to JSON.
    pub fn into_record(self) -> Result<ActionRecord, RecordError> {
        let creator = ActionCreator::new(self.action_type());
        let payload = match self {
            Self::ObtainTodoList(lifecycle) => payload_of(lifecycle),
            Self::CreateTodo(lifecycle) => payload_of(lifecycle),
            Self::UpdateTodo(lifecycle) => payload_of(lifecycle),
            Self::RemoveTodo(lifecycle) => payload_of(lifecycle),
        }
        .map_err(|e| RecordError::InvalidPayload {
            action_type: creator.action_type().to_string(),
            message: e.to_string(),
        })?;

        Ok(creator.create(payload, None))
    }

    /// Build a typed action from a plain record.
    ///
    /// `meta` is not read. A list request accepts any payload.
    ///
    /// # Errors
    ///
    /// - [`RecordError::InvalidType`]: the type has no lifecycle stage
    /// - [`RecordError::UnknownType`]: no operation of the task list matches
    /// - [`RecordError::MissingPayload`] / [`RecordError::InvalidPayload`]:
    ///   the payload does not fit the stage
    pub fn try_from_record(record: &ActionRecord) -> Result<Self, RecordError> {
        let Some(stage) = record.action_type.stage() else {
            return Err(RecordError::InvalidType(record.action_type.to_string()));
        };

        match record.action_type.operation() {
            // The list request takes no input; whatever payload it carries is ignored.
            "OBTAIN_TODO_LIST" if stage == Stage::Request => {
                Ok(Self::ObtainTodoList(Lifecycle::Request(())))
            }
            "OBTAIN_TODO_LIST" => lifecycle(record, stage).map(Self::ObtainTodoList),
            "CREATE_TODO" => lifecycle(record, stage).map(Self::CreateTodo),
            "UPDATE_TODO" => lifecycle(record, stage).map(Self::UpdateTodo),
            "REMOVE_TODO" => lifecycle(record, stage).map(Self::RemoveTodo),
            _ => Err(RecordError::UnknownType(record.action_type.to_string())),
        }
    }
}

impl TryFrom<&ActionRecord> for TodoAction {
    type Error = RecordError;

    fn try_from(record: &ActionRecord) -> Result<Self, Self::Error> {
        Self::try_from_record(record)
    }
}

fn payload_of<Req, Res, Err>(lifecycle: Lifecycle<Req, Res, Err>) -> serde_json::Result<Option<Value>>
where
    Req: Serialize,
    Res: Serialize,
    Err: Serialize,
{
    match lifecycle {
        Lifecycle::Request(payload) => serde_json::to_value(payload).map(Some),
        Lifecycle::Discard => Ok(None),
        Lifecycle::Success(payload) => serde_json::to_value(payload).map(Some),
        Lifecycle::Failure(error) => serde_json::to_value(error).map(Some),
    }
}

fn lifecycle<Req, Res, Err>(record: &ActionRecord, stage: Stage) -> Result<Lifecycle<Req, Res, Err>, RecordError>
where
    Req: DeserializeOwned,
    Res: DeserializeOwned,
    Err: DeserializeOwned,
{
    Ok(match stage {
        Stage::Request => Lifecycle::Request(payload(record)?),
        Stage::Discard => Lifecycle::Discard,
        Stage::Success => Lifecycle::Success(payload(record)?),
        Stage::Failure => Lifecycle::Failure(payload(record)?),
    })
}

/// Deserialize the payload; an absent payload reads as `null`, which only
/// payload-less requests accept.
fn payload<T: DeserializeOwned>(record: &ActionRecord) -> Result<T, RecordError> {
    if record.payload.is_some() {
        return record.payload_as();
    }
    serde_json::from_value(Value::Null)
        .map_err(|_| RecordError::MissingPayload(record.action_type.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::types::TaskId;
    use serde_json::json;
    use tasklist_core::action::ActionType;

    #[test]
    fn operations_match_the_factory() {
        let creators = action_creators();

        assert_eq!(creators.len(), TodoAction::OPERATIONS.len());
        for key in ["obtainTodoList", "createTodo", "updateTodo", "removeTodo"] {
            let operation = creators.lifecycle(key).unwrap().operation();
            assert!(TodoAction::OPERATIONS.contains(&operation), "{operation}");
        }
    }

    #[test]
    fn list_request_record_has_no_payload() {
        let record = TodoAction::ObtainTodoList(Lifecycle::Request(()))
            .into_record()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"type": "OBTAIN_TODO_LIST.REQUEST"})
        );
        assert_eq!(
            TodoAction::try_from_record(&record).unwrap(),
            TodoAction::ObtainTodoList(Lifecycle::Request(()))
        );
    }

    #[test]
    fn list_request_ignores_any_payload() {
        let record: ActionRecord = serde_json::from_value(json!({
            "type": "OBTAIN_TODO_LIST.REQUEST",
            "payload": {"page": 2}
        }))
        .unwrap();

        assert_eq!(
            TodoAction::try_from_record(&record).unwrap(),
            TodoAction::ObtainTodoList(Lifecycle::Request(()))
        );
    }

    #[test]
    fn create_request_from_view_record() {
        let record: ActionRecord = serde_json::from_value(json!({
            "type": "CREATE_TODO.REQUEST",
            "payload": {"text": " Buy milk "}
        }))
        .unwrap();

        let action = TodoAction::try_from(&record).unwrap();

        assert_eq!(
            action,
            TodoAction::CreateTodo(Lifecycle::Request(NewTask::new("Buy milk").unwrap()))
        );
    }

    #[test]
    fn record_meta_does_not_reach_typed_actions() {
        let record = action_creators()
            .lifecycle("removeTodo")
            .unwrap()
            .request
            .create(Some(json!({"id": "3"})), Some(json!({"source": "cli"})));

        let action = TodoAction::try_from_record(&record).unwrap();
        assert_eq!(action, TodoAction::RemoveTodo(Lifecycle::Request(TaskRef::new(TaskId::from("3")))));

        let back = action.into_record().unwrap();
        assert_eq!(back.meta, None);
        assert_eq!(back.payload, record.payload);
    }

    #[test]
    fn remove_success_record_carries_id() {
        let record = TodoAction::RemoveTodo(Lifecycle::Success(TaskRef::new(TaskId::from("3"))))
            .into_record()
            .unwrap();

        assert_eq!(record.action_type.to_string(), "REMOVE_TODO.SUCCESS");
        assert_eq!(record.payload, Some(json!({"id": "3"})));
    }

    #[test]
    fn records_that_do_not_fit_are_rejected() {
        let creators = action_creators();
        let plain = ActionRecord {
            action_type: ActionType::from_operation("CREATE_TODO", None),
            payload: None,
            meta: None,
        };
        assert!(matches!(
            TodoAction::try_from_record(&plain),
            Err(RecordError::InvalidType(_))
        ));

        let other = ActionCreator::new("RENAME_TODO.REQUEST".parse().unwrap()).create(None, None);
        assert!(matches!(
            TodoAction::try_from_record(&other),
            Err(RecordError::UnknownType(_))
        ));

        let missing = creators.lifecycle("createTodo").unwrap().request.create(None, None);
        assert!(matches!(
            TodoAction::try_from_record(&missing),
            Err(RecordError::MissingPayload(_))
        ));

        let blank = creators
            .lifecycle("createTodo")
            .unwrap()
            .request
            .create(Some(json!({"text": "  "})), None);
        assert!(matches!(
            TodoAction::try_from_record(&blank),
            Err(RecordError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn discard_actions_share_the_operation_id() {
        for operation in [
            Operation::ObtainTodoList,
            Operation::CreateTodo,
            Operation::UpdateTodo,
            Operation::RemoveTodo,
        ] {
            let discard = operation.discard();
            assert!(discard.is_discard());
            assert_eq!(discard.effect_id().as_str(), discard.operation());
        }
    }
}
