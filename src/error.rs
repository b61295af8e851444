//! Error types shared by the interpreters.

use std::error::Error as StdError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InterpreterError>;

#[derive(Debug, Error)]
pub enum InterpreterError {
    /// Backend URL is malformed or the backend is unreachable
    #[error("{0}")]
    Connect(String),

    /// Statement was rejected by the query backend
    #[error("{0}")]
    Query(String),

    /// Backend rejected a stream/job create call
    #[error("failed to create {name}: {message}")]
    ResourceCreate { name: String, message: String },

    /// Backend rejected a stream/job destroy call
    #[error("failed to destroy {name}: {message}")]
    ResourceDestroy { name: String, message: String },

    #[error("completion failed: {0}")]
    Completion(String),

    /// Operation attempted before `open` succeeded
    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

/// Message of the innermost error in the `source` chain.
pub fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

impl InterpreterError {
    /// What the user should see: the root cause, without wrapper noise.
    pub fn user_message(&self) -> String {
        match self {
            InterpreterError::ResourceCreate { message, .. }
            | InterpreterError::ResourceDestroy { message, .. } => message.clone(),
            InterpreterError::Postgres(e) => match e.as_db_error() {
                Some(db) => db.message().to_string(),
                None => root_cause(e),
            },
            other => root_cause(other),
        }
    }
}
