//! Intent facade for views.
//!
//! [`TodoApp`] owns the store and turns user intent into request and
//! discard actions. Input is trimmed and validated here, before anything
//! is dispatched.

use crate::actions::{Operation, TodoAction};
use crate::error::AppError;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{NewTask, TaskId, TaskPatch, TaskRef, TodoState};
use tasklist_core::action::Lifecycle;
use tasklist_runtime::{EffectHandle, Store, StoreConfig, StoreError};
use tokio::sync::{broadcast, watch};

/// Store type of the task list
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// The task list as views use it
///
/// Every intent returns the [`EffectHandle`] of its request, so callers
/// can wait until the outcome is reduced.
#[derive(Clone)]
pub struct TodoApp {
    store: TodoStore,
}

impl TodoApp {
    /// Create the app with an empty list and default store configuration
    #[must_use]
    pub fn new(env: TodoEnvironment) -> Self {
        Self::with_config(env, StoreConfig::default())
    }

    /// Create the app with a custom store configuration
    #[must_use]
    pub fn with_config(env: TodoEnvironment, config: StoreConfig) -> Self {
        Self {
            store: Store::with_config(TodoState::new(), TodoReducer::new(), env, config),
        }
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore {
        &self.store
    }

    /// Dispatch an action as is
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shutting down.
    pub async fn dispatch(&self, action: TodoAction) -> Result<EffectHandle, AppError> {
        tracing::debug!(action_type = %action.action_type(), "Dispatching");
        Ok(self.store.send(action).await?)
    }

    /// Load the whole list
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shutting down.
    pub async fn load(&self) -> Result<EffectHandle, AppError> {
        self.dispatch(TodoAction::ObtainTodoList(Lifecycle::Request(())))
            .await
    }

    /// Create a task from user input
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`]: the text is empty or whitespace only
    /// - [`AppError::Store`]: the store is shutting down
    pub async fn add(&self, text: &str) -> Result<EffectHandle, AppError> {
        let task = NewTask::new(text)?;
        self.dispatch(TodoAction::CreateTodo(Lifecycle::Request(task)))
            .await
    }

    /// Change the text of a task.
    ///
    /// Nothing is sent when the trimmed text equals the current one; the
    /// returned handle is then already complete.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`]: the text is empty or whitespace only
    /// - [`AppError::Store`]: the store is shutting down
    pub async fn rename(&self, id: &TaskId, text: &str) -> Result<EffectHandle, AppError> {
        let patch = TaskPatch::rename(id.clone(), text)?;

        let unchanged = self
            .store
            .state(|state| state.get(id).map(|task| Some(&task.text) == patch.text.as_ref()))
            .await
            .unwrap_or(false);
        if unchanged {
            tracing::debug!(task_id = %id, "Text unchanged, nothing to send");
            return Ok(EffectHandle::completed());
        }

        self.dispatch(TodoAction::UpdateTodo(Lifecycle::Request(patch)))
            .await
    }

    /// Mark a task done or open
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shutting down.
    pub async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<EffectHandle, AppError> {
        self.dispatch(TodoAction::UpdateTodo(Lifecycle::Request(TaskPatch::completed(
            id.clone(),
            completed,
        ))))
        .await
    }

    /// Delete a task
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shutting down.
    pub async fn remove(&self, id: &TaskId) -> Result<EffectHandle, AppError> {
        self.dispatch(TodoAction::RemoveTodo(Lifecycle::Request(TaskRef::new(id.clone()))))
            .await
    }

    /// Discard every in-flight list load
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shutting down.
    pub async fn cancel_load(&self) -> Result<EffectHandle, AppError> {
        self.cancel(Operation::ObtainTodoList).await
    }

    /// Discard every in-flight call of `operation`
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shutting down.
    pub async fn cancel(&self, operation: Operation) -> Result<EffectHandle, AppError> {
        self.dispatch(operation.discard()).await
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    /// Revision counter bumped after every reduced action
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe_state()
    }

    /// Outcome actions, after they are reduced
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting intents and wait for in-flight calls, up to the
    /// configured shutdown timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if calls are still running
    /// when the timeout expires.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.store
            .shutdown(self.store.config().default_shutdown_timeout)
            .await
    }
}

impl std::fmt::Debug for TodoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoApp")
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}
