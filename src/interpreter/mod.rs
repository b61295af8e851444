//! Host plugin contract shared by the PostgreSQL and SpringXD interpreters.

use std::fmt;

use async_trait::async_trait;

pub mod group;

pub use group::{InterpreterGroup, InterpreterProperty, RegisteredInterpreter};

/// Identifies the notebook paragraph a call is made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterpreterContext {
    pub note_id: String,
    pub paragraph_id: String,
}

impl InterpreterContext {
    pub fn new(note_id: impl Into<String>, paragraph_id: impl Into<String>) -> Self {
        Self { note_id: note_id.into(), paragraph_id: paragraph_id.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Text,
    Table,
    Angular,
}

impl ResultType {
    fn magic(self) -> &'static str {
        match self {
            ResultType::Text => "%text ",
            ResultType::Table => "%table ",
            ResultType::Angular => "%angular ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    Native,
    Simple,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterResult {
    pub code: Code,
    pub kind: ResultType,
    pub message: String,
}

impl InterpreterResult {
    /// Builds a result from a message that may carry a leading display magic
    /// (`%table `, `%angular `, `%text `). The magic selects the type and is stripped.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        let message = message.into();
        for kind in [ResultType::Table, ResultType::Angular, ResultType::Text] {
            if let Some(rest) = message.strip_prefix(kind.magic()) {
                return Self { code, kind, message: rest.to_string() };
            }
        }
        Self { code, kind: ResultType::Text, message }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Code::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { code: Code::Error, kind: ResultType::Text, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

impl fmt::Display for InterpreterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ResultType::Text => f.write_str(&self.message),
            kind => write!(f, "{}{}", kind.magic(), self.message),
        }
    }
}

/// Lifecycle every interpreter exposes to the notebook host.
///
/// The host calls `open`/`interpret`/`completion`/`close` one at a time per instance.
/// `cancel` is the exception: it may arrive while `interpret` is still running.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn open(&self);

    async fn close(&self);

    async fn interpret(&self, text: &str, ctx: &InterpreterContext) -> InterpreterResult;

    async fn cancel(&self, ctx: &InterpreterContext);

    /// `None` means the backend gave no answer, `Some(vec![])` an empty one.
    async fn completion(&self, buffer: &str, cursor: usize) -> Option<Vec<String>>;

    fn progress(&self, _ctx: &InterpreterContext) -> u8 {
        0
    }

    fn form_type(&self) -> FormType;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_magic_is_stripped() {
        let r = InterpreterResult::new(Code::Success, "%table a\tb\n1\t2\n");
        assert_eq!(r.kind, ResultType::Table);
        assert_eq!(r.message, "a\tb\n1\t2\n");
        assert_eq!(r.to_string(), "%table a\tb\n1\t2\n");
    }

    #[test]
    fn test_plain_message_is_text() {
        let r = InterpreterResult::new(Code::Error, "boom");
        assert_eq!(r.kind, ResultType::Text);
        assert_eq!(r.to_string(), "boom");
    }

    #[test]
    fn test_error_keeps_magic_literal() {
        let r = InterpreterResult::error("%table not a table");
        assert_eq!(r.kind, ResultType::Text);
        assert_eq!(r.message, "%table not a table");
    }
}
