//! PostgreSQL interpreter: runs a paragraph as SQL and renders the result set.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    completion::prefix_at,
    config::{
        Config, DEFAULT_JDBC_DRIVER_NAME, DEFAULT_JDBC_URL, DEFAULT_JDBC_USER_NAME,
        DEFAULT_JDBC_USER_PASSWORD, DEFAULT_MAX_RESULT, POSTGRESQL_SERVER_DRIVER_NAME,
        POSTGRESQL_SERVER_MAX_RESULT, POSTGRESQL_SERVER_PASSWORD, POSTGRESQL_SERVER_URL,
        POSTGRESQL_SERVER_USER,
    },
    interpreter::{FormType, Interpreter, InterpreterContext, InterpreterResult},
};

pub mod backend;
pub mod completer;
pub mod format;

pub use backend::{Connector, PgBackend, PgConnector, PgSettings, QueryBackend, QueryOutcome};
pub use format::TabularResult;

const EXPLAIN_PREDICATE: &str = "explain";

enum ConnectionState {
    Disconnected,
    Connected(Arc<dyn QueryBackend>),
    ConnectFailed(String),
}

pub struct PostgreSqlInterpreter {
    settings: PgSettings,
    connector: Box<dyn Connector>,
    state: Mutex<ConnectionState>,
}

impl PostgreSqlInterpreter {
    pub fn new(cfg: &Config) -> Self {
        Self::with_connector(cfg, Box::new(PgConnector))
    }

    pub fn with_connector(cfg: &Config, connector: Box<dyn Connector>) -> Self {
        let max_result = cfg
            .get_usize(POSTGRESQL_SERVER_MAX_RESULT)
            .or_else(|| DEFAULT_MAX_RESULT.parse().ok())
            .unwrap_or(1000);
        let settings = PgSettings {
            url: cfg.get_or(POSTGRESQL_SERVER_URL, DEFAULT_JDBC_URL),
            user: cfg.get_or(POSTGRESQL_SERVER_USER, DEFAULT_JDBC_USER_NAME),
            password: cfg.get_or(POSTGRESQL_SERVER_PASSWORD, DEFAULT_JDBC_USER_PASSWORD),
            driver_name: cfg.get_or(POSTGRESQL_SERVER_DRIVER_NAME, DEFAULT_JDBC_DRIVER_NAME),
            max_result,
        };
        Self { settings, connector, state: Mutex::new(ConnectionState::Disconnected) }
    }

    pub fn settings(&self) -> &PgSettings {
        &self.settings
    }

    /// The open backend, if any.
    pub fn connection(&self) -> Option<Arc<dyn QueryBackend>> {
        match &*self.state.lock() {
            ConnectionState::Connected(backend) => Some(Arc::clone(backend)),
            _ => None,
        }
    }

    /// Opens on first use; a failed open is reported until the next successful one.
    async fn acquire(&self) -> Result<Arc<dyn QueryBackend>, String> {
        {
            let state = self.state.lock();
            match &*state {
                ConnectionState::Connected(backend) if !backend.is_closed() => {
                    return Ok(Arc::clone(backend));
                }
                ConnectionState::ConnectFailed(reason) => return Err(reason.clone()),
                _ => {}
            }
        }
        self.open().await;
        match &*self.state.lock() {
            ConnectionState::Connected(backend) => Ok(Arc::clone(backend)),
            ConnectionState::ConnectFailed(reason) => Err(reason.clone()),
            ConnectionState::Disconnected => Err("not connected".to_string()),
        }
    }

    fn render(&self, sql: &str, outcome: QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Rows(result) if is_explain(sql) && result.column_count() == 1 => {
                format::format_text(&result, self.settings.max_result)
            }
            QueryOutcome::Rows(result) => format::format_table(&result, self.settings.max_result),
            QueryOutcome::UpdateCount(count) => format::format_update_count(count),
        }
    }
}

/// `explain` as a whole leading word, any case.
fn is_explain(sql: &str) -> bool {
    let sql = sql.trim_start();
    let Some(head) = sql.get(..EXPLAIN_PREDICATE.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(EXPLAIN_PREDICATE)
        && sql[EXPLAIN_PREDICATE.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

#[async_trait]
impl Interpreter for PostgreSqlInterpreter {
    async fn open(&self) {
        if let Some(backend) = self.connection() {
            if !backend.is_closed() {
                return;
            }
        }

        let next = match self.connector.connect(&self.settings).await {
            Ok(backend) => ConnectionState::Connected(backend),
            Err(e) => {
                tracing::error!(url = %self.settings.url, error = %e, "failed to connect to PostgreSQL");
                ConnectionState::ConnectFailed(e.user_message())
            }
        };
        *self.state.lock() = next;
    }

    async fn close(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Disconnected);
        if let ConnectionState::Connected(backend) = previous {
            backend.close().await;
            tracing::info!("PostgreSQL connection closed");
        }
    }

    async fn interpret(&self, sql: &str, _ctx: &InterpreterContext) -> InterpreterResult {
        tracing::info!(sql = %sql, "run SQL query");

        let backend = match self.acquire().await {
            Ok(backend) => backend,
            Err(reason) => return InterpreterResult::error(reason),
        };

        match backend.execute(sql, self.settings.max_result).await {
            Ok(outcome) => InterpreterResult::success(self.render(sql, outcome)),
            Err(e) => {
                tracing::error!(error = %e, "cannot run {}", sql);
                InterpreterResult::error(e.user_message())
            }
        }
    }

    async fn cancel(&self, _ctx: &InterpreterContext) {
        let Some(backend) = self.connection() else {
            return;
        };
        tracing::info!("cancel current query statement");
        if let Err(e) = backend.cancel().await {
            tracing::error!(error = %e, "failed to cancel query");
        }
    }

    async fn completion(&self, buffer: &str, cursor: usize) -> Option<Vec<String>> {
        Some(completer::complete(prefix_at(buffer, cursor)))
    }

    fn form_type(&self) -> FormType {
        FormType::Native
    }
}
