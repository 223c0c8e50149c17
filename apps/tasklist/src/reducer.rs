//! Reducer logic for the task list.
//!
//! Requests start a cancellable network effect, discards cancel every
//! in-flight call of their operation, and settled outcomes update the
//! normalized collection.

use crate::actions::TodoAction;
use crate::config::ApiConfig;
use crate::effects;
use crate::types::TodoState;
use std::sync::Arc;
use tasklist_core::action::Lifecycle;
use tasklist_core::effect::Effect;
use tasklist_core::environment::{Clock, HttpClient};
use tasklist_core::reducer::Reducer;
use tasklist_core::{SmallVec, smallvec};

/// Environment dependencies for the task list reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Transport for the `/todos` calls
    pub http: Arc<dyn HttpClient>,
    /// Clock for failure timestamps
    pub clock: Arc<dyn Clock>,
    /// Where the collection lives
    pub api: ApiConfig,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>, api: ApiConfig) -> Self {
        Self { http, clock, api }
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Reducer for the task list
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per operation and stage
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let id = action.effect_id();

        match action {
            // ========== List ==========
            TodoAction::ObtainTodoList(Lifecycle::Request(())) => {
                state.error = None;
                state.loading = true;
                smallvec![effects::obtain_todo_list(id, env)]
            }
            TodoAction::ObtainTodoList(Lifecycle::Discard) => {
                state.loading = false;
                smallvec![Effect::Cancel(id)]
            }
            TodoAction::ObtainTodoList(Lifecycle::Success(tasks)) => {
                state.replace_all(tasks);
                state.loading = false;
                SmallVec::new()
            }
            TodoAction::ObtainTodoList(Lifecycle::Failure(error)) => {
                state.error = Some(error);
                state.loading = false;
                SmallVec::new()
            }

            // ========== Create ==========
            TodoAction::CreateTodo(Lifecycle::Request(task)) => {
                smallvec![effects::create_todo(id, env, &task)]
            }
            TodoAction::CreateTodo(Lifecycle::Discard) => smallvec![Effect::Cancel(id)],
            TodoAction::CreateTodo(Lifecycle::Success(task)) => {
                state.append(task);
                state.error = None;
                SmallVec::new()
            }
            TodoAction::CreateTodo(Lifecycle::Failure(error)) => {
                state.error = Some(error);
                SmallVec::new()
            }

            // ========== Update ==========
            TodoAction::UpdateTodo(Lifecycle::Request(patch)) => {
                smallvec![effects::update_todo(id, env, &patch)]
            }
            TodoAction::UpdateTodo(Lifecycle::Discard) => smallvec![Effect::Cancel(id)],
            TodoAction::UpdateTodo(Lifecycle::Success(task)) => {
                let task_id = task.id.clone();
                if !state.replace(task) {
                    tracing::debug!(%task_id, "Updated task is not in the list");
                }
                state.error = None;
                SmallVec::new()
            }
            TodoAction::UpdateTodo(Lifecycle::Failure(error)) => {
                state.error = Some(error);
                SmallVec::new()
            }

            // ========== Remove ==========
            TodoAction::RemoveTodo(Lifecycle::Request(task)) => {
                smallvec![effects::remove_todo(id, env, &task)]
            }
            TodoAction::RemoveTodo(Lifecycle::Discard) => smallvec![Effect::Cancel(id)],
            TodoAction::RemoveTodo(Lifecycle::Success(task)) => {
                if state.remove(&task.id).is_none() {
                    tracing::debug!(task_id = %task.id, "Removed task is not in the list");
                }
                state.error = None;
                SmallVec::new()
            }
            TodoAction::RemoveTodo(Lifecycle::Failure(error)) => {
                state.error = Some(error);
                SmallVec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::types::{ErrorInfo, ErrorKind, NewTask, NormalizedTasks, Task, TaskId, TaskPatch, TaskRef};
    use tasklist_core::http::HttpError;
    use tasklist_testing::{assertions, test_clock, MockHttpClient, ReducerTest};

    fn create_test_env() -> TodoEnvironment {
        TodoEnvironment::new(
            Arc::new(MockHttpClient::new()),
            Arc::new(test_clock()),
            ApiConfig::new("http://localhost:3000"),
        )
    }

    fn failure() -> ErrorInfo {
        ErrorInfo::from_http(&HttpError::Timeout, test_clock().now())
    }

    fn state_with(tasks: &[Task]) -> TodoState {
        let mut state = TodoState::new();
        for task in tasks {
            state.append(task.clone());
        }
        state
    }

    fn ids(values: &[&str]) -> Vec<TaskId> {
        values.iter().map(|id| TaskId::from(*id)).collect()
    }

    #[test]
    fn list_request_sets_loading_and_clears_error() {
        let mut given = TodoState::new();
        given.error = Some(failure());

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(given)
            .when_action(TodoAction::ObtainTodoList(Lifecycle::Request(())))
            .then_state(|state| {
                assert!(state.loading);
                assert!(state.error.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_cancellable(effects, "OBTAIN_TODO_LIST");
            })
            .run();
    }

    #[test]
    fn list_success_replaces_collection() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[Task::new("9", "stale", false)]))
            .when_actions([
                TodoAction::ObtainTodoList(Lifecycle::Request(())),
                TodoAction::ObtainTodoList(Lifecycle::Success(NormalizedTasks::from_tasks([
                    Task::new("1", "Buy milk", false),
                    Task::new("2", "Walk dog", true),
                ]))),
            ])
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1", "2"]));
                assert_eq!(state.by_id.len(), 2);
                assert_eq!(state.get(&TaskId::from("2")).unwrap().text, "Walk dog");
                assert!(!state.loading);
                assert!(state.error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn list_success_with_repeated_ids_stays_consistent() {
        let mut by_id = std::collections::HashMap::new();
        by_id.insert(TaskId::from("1"), Task::new("1", "a", false));

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::ObtainTodoList(Lifecycle::Success(NormalizedTasks {
                all_ids: ids(&["1", "1", "2"]),
                by_id,
            })))
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1"]));
                assert!(state.is_consistent());
            })
            .run();
    }

    #[test]
    fn list_discard_stops_loading_and_cancels() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_actions([
                TodoAction::ObtainTodoList(Lifecycle::Request(())),
                TodoAction::ObtainTodoList(Lifecycle::Discard),
            ])
            .then_state(|state| assert!(!state.loading))
            .then_effects(|effects| assertions::assert_has_cancel(effects, "OBTAIN_TODO_LIST"))
            .run();
    }

    #[test]
    fn list_failure_keeps_collection() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[Task::new("1", "a", false)]))
            .when_actions([
                TodoAction::ObtainTodoList(Lifecycle::Request(())),
                TodoAction::ObtainTodoList(Lifecycle::Failure(failure())),
            ])
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1"]));
                assert!(!state.loading);
                assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::Timeout);
            })
            .run();
    }

    #[test]
    fn create_request_only_starts_effect() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[Task::new("1", "a", false)]))
            .when_action(TodoAction::CreateTodo(Lifecycle::Request(NewTask::new("b").unwrap())))
            .then_state_unchanged()
            .then_effects(|effects| assertions::assert_has_cancellable(effects, "CREATE_TODO"))
            .run();
    }

    #[test]
    fn create_success_appends_in_order() {
        let mut given = state_with(&[Task::new("1", "a", false), Task::new("2", "b", false)]);
        given.error = Some(failure());

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(given)
            .when_action(TodoAction::CreateTodo(Lifecycle::Success(Task::new("3", "c", false))))
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1", "2", "3"]));
                assert_eq!(state.get(&TaskId::from("3")).unwrap().text, "c");
                assert!(state.error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn create_success_for_known_id_replaces_record() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[Task::new("1", "a", false), Task::new("2", "b", false)]))
            .when_action(TodoAction::CreateTodo(Lifecycle::Success(Task::new("1", "a2", true))))
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1", "2"]));
                assert_eq!(state.get(&TaskId::from("1")).unwrap().text, "a2");
            })
            .run();
    }

    #[test]
    fn update_success_replaces_record_in_place() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[Task::new("1", "a", false), Task::new("2", "b", false)]))
            .when_actions([
                TodoAction::UpdateTodo(Lifecycle::Request(TaskPatch::completed(TaskId::from("1"), true))),
                TodoAction::UpdateTodo(Lifecycle::Success(Task::new("1", "a", true))),
            ])
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1", "2"]));
                assert!(state.get(&TaskId::from("1")).unwrap().completed);
            })
            .run();
    }

    #[test]
    fn update_success_for_absent_id_only_clears_error() {
        let mut given = state_with(&[Task::new("1", "a", false)]);
        given.error = Some(failure());

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(given)
            .when_action(TodoAction::UpdateTodo(Lifecycle::Success(Task::new("7", "ghost", false))))
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1"]));
                assert!(!state.contains(&TaskId::from("7")));
                assert!(state.error.is_none());
            })
            .run();
    }

    #[test]
    fn remove_success_removes_exactly_that_id() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[
                Task::new("1", "a", false),
                Task::new("2", "b", false),
                Task::new("3", "c", false),
            ]))
            .when_action(TodoAction::RemoveTodo(Lifecycle::Success(TaskRef::new(TaskId::from("2")))))
            .then_state(|state| {
                assert_eq!(state.all_ids, ids(&["1", "3"]));
                assert!(!state.contains(&TaskId::from("2")));
                assert!(state.is_consistent());
            })
            .run();
    }

    #[test]
    fn remove_success_for_absent_id_keeps_collection() {
        let given = state_with(&[Task::new("1", "a", false)]);
        let expected = given.clone();

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(given)
            .when_action(TodoAction::RemoveTodo(Lifecycle::Success(TaskRef::new(TaskId::from("5")))))
            .then_state(move |state| {
                assert_eq!(state.all_ids, expected.all_ids);
                assert_eq!(state.by_id, expected.by_id);
            })
            .run();
    }

    #[test]
    fn failures_overwrite_last_error() {
        let status = ErrorInfo::from_http(
            &HttpError::Status {
                status: 500,
                body: String::new(),
            },
            test_clock().now(),
        );

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(&[Task::new("1", "a", false)]))
            .when_actions([
                TodoAction::CreateTodo(Lifecycle::Failure(failure())),
                TodoAction::UpdateTodo(Lifecycle::Failure(failure())),
                TodoAction::RemoveTodo(Lifecycle::Failure(status)),
            ])
            .then_state(|state| {
                assert_eq!(state.error.as_ref().unwrap().status, Some(500));
                assert_eq!(state.all_ids, ids(&["1"]));
            })
            .run();
    }

    #[test]
    fn discards_leave_state_unchanged() {
        for action in [
            TodoAction::CreateTodo(Lifecycle::Discard),
            TodoAction::UpdateTodo(Lifecycle::Discard),
            TodoAction::RemoveTodo(Lifecycle::Discard),
        ] {
            let operation = action.operation();
            ReducerTest::new(TodoReducer::new())
                .with_env(create_test_env())
                .given_state(state_with(&[Task::new("1", "a", false)]))
                .when_action(action)
                .then_state_unchanged()
                .then_effects(move |effects| assertions::assert_has_cancel(effects, operation))
                .run();
        }
    }
}
