//! Network effects of the task list.
//!
//! Each operation has a request transformer (payload → [`HttpRequest`]) and
//! a response transformer ([`HttpResponse`] → success payload). [`call`]
//! ties the two together into a cancellable effect tagged with the
//! operation's id, so a discard drops the outcome of every in-flight call.

use crate::actions::TodoAction;
use crate::config::ApiConfig;
use crate::reducer::TodoEnvironment;
use crate::types::{ErrorInfo, NewTask, NormalizedTasks, Task, TaskPatch, TaskRef};
use std::sync::Arc;
use tasklist_core::action::Lifecycle;
use tasklist_core::cancellable_effect;
use tasklist_core::effect::{Effect, EffectId};
use tasklist_core::environment::HttpClient;
use tasklist_core::http::{HttpError, HttpMethod, HttpRequest, HttpResponse};
use tracing::Instrument;

/// `GET /todos`
#[must_use]
pub fn list_request(api: &ApiConfig) -> HttpRequest {
    HttpRequest::get(api.todos_url())
}

/// `POST /todos` with `{completed: false, text}`
#[must_use]
pub fn create_request(api: &ApiConfig, task: &NewTask) -> HttpRequest {
    HttpRequest::new(HttpMethod::Post, api.todos_url()).json(task.body())
}

/// `PATCH /todos/{id}` with the changed fields
#[must_use]
pub fn update_request(api: &ApiConfig, patch: &TaskPatch) -> HttpRequest {
    HttpRequest::new(HttpMethod::Patch, api.todo_url(&patch.id)).json(patch.body())
}

/// `DELETE /todos/{id}`
#[must_use]
pub fn remove_request(api: &ApiConfig, task: &TaskRef) -> HttpRequest {
    HttpRequest::new(HttpMethod::Delete, api.todo_url(&task.id))
}

/// Decode a task list and normalize it.
///
/// # Errors
///
/// Returns [`HttpError::Decode`] if the body is not a list of tasks.
pub fn list_response(response: &HttpResponse) -> Result<NormalizedTasks, HttpError> {
    response.json::<Vec<Task>>().map(NormalizedTasks::from_tasks)
}

/// Decode the task the server answered with.
///
/// # Errors
///
/// Returns [`HttpError::Decode`] if the body is not a task.
pub fn task_response(response: &HttpResponse) -> Result<Task, HttpError> {
    response.json()
}

/// Load the collection
pub fn obtain_todo_list(id: EffectId, env: &TodoEnvironment) -> Effect<TodoAction> {
    call(
        id,
        env,
        list_request(&env.api),
        |response| list_response(&response),
        |outcome| TodoAction::ObtainTodoList(Lifecycle::settle(outcome)),
    )
}

/// Create a task
pub fn create_todo(id: EffectId, env: &TodoEnvironment, task: &NewTask) -> Effect<TodoAction> {
    call(
        id,
        env,
        create_request(&env.api, task),
        |response| task_response(&response),
        |outcome| TodoAction::CreateTodo(Lifecycle::settle(outcome)),
    )
}

/// Update a task
pub fn update_todo(id: EffectId, env: &TodoEnvironment, patch: &TaskPatch) -> Effect<TodoAction> {
    call(
        id,
        env,
        update_request(&env.api, patch),
        |response| task_response(&response),
        |outcome| TodoAction::UpdateTodo(Lifecycle::settle(outcome)),
    )
}

/// Remove a task; the success payload echoes the requested id
pub fn remove_todo(id: EffectId, env: &TodoEnvironment, task: &TaskRef) -> Effect<TodoAction> {
    let removed = task.clone();
    call(
        id,
        env,
        remove_request(&env.api, task),
        move |_| Ok(removed),
        |outcome| TodoAction::RemoveTodo(Lifecycle::settle(outcome)),
    )
}

/// Send `request`, transform the response and settle the lifecycle.
///
/// Any transport, status or decode error becomes the failure payload,
/// stamped by the environment clock.
fn call<Res, Decode, Settle>(
    id: EffectId,
    env: &TodoEnvironment,
    request: HttpRequest,
    decode: Decode,
    settle: Settle,
) -> Effect<TodoAction>
where
    Res: Send + 'static,
    Decode: FnOnce(HttpResponse) -> Result<Res, HttpError> + Send + 'static,
    Settle: FnOnce(Result<Res, ErrorInfo>) -> TodoAction + Send + 'static,
{
    let http = Arc::clone(&env.http);
    let clock = Arc::clone(&env.clock);

    cancellable_effect! {
        id: id,
        async {
            let outcome = send(http.as_ref(), request).await.and_then(decode);
            if let Err(error) = &outcome {
                tracing::warn!(kind = error.kind(), error = %error, "Request failed");
            }
            Some(settle(outcome.map_err(|error| ErrorInfo::from_http(&error, clock.now()))))
        }
    }
}

async fn send(http: &dyn HttpClient, request: HttpRequest) -> Result<HttpResponse, HttpError> {
    let span = tracing::info_span!(
        "http_request",
        method = %request.method,
        url = %request.url,
        status = tracing::field::Empty,
    );
    let response = http.send(request).instrument(span.clone()).await;

    let status = match &response {
        Ok(response) => Some(response.status),
        Err(error) => error.status(),
    };
    if let Some(status) = status {
        span.record("status", status);
    }
    span.in_scope(|| tracing::debug!(ok = response.is_ok(), "Request settled"));

    response
}
