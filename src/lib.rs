//! Notebook interpreters for PostgreSQL and SpringXD.
//!
//! Each interpreter takes the text of a notebook paragraph and answers with an
//! [`InterpreterResult`] whose message carries a display magic (`%table`,
//! `%angular`, `%text`). The PostgreSQL interpreter runs SQL over one shared
//! connection. The SpringXD interpreters deploy `name = definition` lines as
//! streams or jobs and track them per notebook and paragraph.

pub mod completion;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod postgresql;
pub mod springxd;
pub mod testing;

pub use config::Config;
pub use error::{InterpreterError, Result};
pub use interpreter::{
    Code, FormType, Interpreter, InterpreterContext, InterpreterGroup, InterpreterResult,
    ResultType,
};
pub use postgresql::PostgreSqlInterpreter;
pub use springxd::SpringXdInterpreter;
