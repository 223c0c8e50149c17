//! Task list client synchronized with a remote `/todos` collection.
//!
//! Tasks are kept as a normalized collection (ordered ids plus an id map).
//! Every change goes through a request / discard / success / failure
//! lifecycle: the request starts a network call, a discard drops the
//! outcome of in-flight calls, and the settled outcome updates the list.
//!
//! - [`types`]: tasks, payloads and [`TodoState`]
//! - [`actions`]: the typed [`TodoAction`] enum and its record conversion
//! - [`effects`]: request and response transformers
//! - [`reducer`]: [`TodoReducer`] and its environment
//! - [`app`]: the [`TodoApp`] intent facade
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasklist::{ApiConfig, TodoApp, TodoEnvironment};
//! use tasklist_core::environment::SystemClock;
//! use tasklist_runtime::ReqwestHttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiConfig::from_env()?;
//! let http = ReqwestHttpClient::new(api.request_timeout)?;
//! let app = TodoApp::new(TodoEnvironment::new(Arc::new(http), Arc::new(SystemClock), api));
//!
//! app.load().await?.wait().await;
//! app.add("Buy milk").await?.wait().await;
//!
//! for task in app.snapshot().await.display_order() {
//!     println!("{} {}", task.id, task.text);
//! }
//!
//! app.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod app;
pub mod config;
pub mod effects;
pub mod error;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use actions::{action_creators, Operation, TodoAction};
pub use app::{TodoApp, TodoStore};
pub use config::ApiConfig;
pub use error::{AppError, ConfigError, ValidationError};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use types::{ErrorInfo, ErrorKind, NewTask, NormalizedTasks, Task, TaskId, TaskPatch, TaskRef, TodoState};
