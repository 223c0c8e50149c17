//! Error types of the task list.

use tasklist_runtime::StoreError;
use thiserror::Error;

/// User input rejected before anything is dispatched
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The text is empty or whitespace only
    #[error("Task text cannot be empty")]
    EmptyText,
}

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable does not parse
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Errors of the [`TodoApp`](crate::TodoApp) intent methods
#[derive(Error, Debug)]
pub enum AppError {
    /// The input was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store refused the action
    #[error(transparent)]
    Store(#[from] StoreError),
}
