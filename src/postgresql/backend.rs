//! Query backend seam and its tokio-postgres implementation.

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use futures_util::{pin_mut, TryStreamExt};
use tokio::task::JoinHandle;
use tokio_postgres::{CancelToken, Client, NoTls, SimpleQueryMessage};

use super::format::TabularResult;
use crate::error::{root_cause, InterpreterError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rows(TabularResult),
    /// Statement produced no result set, only an affected-row count.
    UpdateCount(u64),
}

/// A live connection able to run one statement at a time.
///
/// `cancel` may be called from another task while `execute` is pending and must not
/// close the connection.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn execute(&self, sql: &str, max_rows: usize) -> Result<QueryOutcome>;

    async fn cancel(&self) -> Result<()>;

    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Opens backends. Swapped out in tests.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &PgSettings) -> Result<Arc<dyn QueryBackend>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgSettings {
    pub url: String,
    pub user: String,
    pub password: String,
    pub driver_name: String,
    pub max_result: usize,
}

impl PgSettings {
    /// Accepts `postgres://`, `postgresql://` and JDBC-style `jdbc:postgresql://` URLs.
    /// User and password apply only when the URL does not carry its own.
    pub fn connection_config(&self) -> Result<tokio_postgres::Config> {
        let url = self.url.trim();
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        let mut config = tokio_postgres::Config::from_str(url)
            .map_err(|e| InterpreterError::Connect(format!("invalid PostgreSQL URL {url}: {}", root_cause(&e))))?;
        if config.get_user().is_none() && !self.user.is_empty() {
            config.user(&self.user);
        }
        if config.get_password().is_none() && !self.password.is_empty() {
            config.password(&self.password);
        }
        Ok(config)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, settings: &PgSettings) -> Result<Arc<dyn QueryBackend>> {
        let config = settings.connection_config()?;
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| InterpreterError::Connect(format!("PostgreSQL connect: {}", root_cause(&e))))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        tracing::info!(url = %settings.url, driver = %settings.driver_name, "connected to PostgreSQL");
        let cancel_token = client.cancel_token();
        Ok(Arc::new(PgBackend { client, cancel_token, connection: handle }))
    }
}

pub struct PgBackend {
    client: Client,
    cancel_token: CancelToken,
    connection: JoinHandle<()>,
}

#[async_trait]
impl QueryBackend for PgBackend {
    async fn execute(&self, sql: &str, max_rows: usize) -> Result<QueryOutcome> {
        let stream = self.client.simple_query_raw(sql).await?;
        pin_mut!(stream);

        let mut collector = FirstResult::new(max_rows);
        while let Some(message) = stream.try_next().await? {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    collector.header(columns.iter().map(|c| c.name().to_string()).collect());
                }
                SimpleQueryMessage::Row(row) => {
                    if !collector.has_header() {
                        collector.header(row.columns().iter().map(|c| c.name().to_string()).collect());
                    }
                    // NULL renders as an empty cell
                    let cells = (0..row.len()).map(|i| row.get(i).unwrap_or("").to_string()).collect();
                    if !collector.row(cells) {
                        // Rest of the response is discarded by the connection once the stream drops
                        tracing::debug!(max_rows, "row cap reached, dropping remaining rows");
                        return Ok(collector.finish());
                    }
                }
                SimpleQueryMessage::CommandComplete(count) => return Ok(collector.complete(count)),
                _ => {}
            }
        }
        Ok(collector.finish())
    }

    async fn cancel(&self) -> Result<()> {
        self.cancel_token.cancel_query(NoTls).await?;
        Ok(())
    }

    async fn close(&self) {
        self.connection.abort();
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed() || self.connection.is_finished()
    }
}

/// Outcome of the first statement of a response, holding at most `max_rows` rows.
#[derive(Debug)]
struct FirstResult {
    max_rows: usize,
    names: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl FirstResult {
    fn new(max_rows: usize) -> Self {
        Self { max_rows, names: None, rows: Vec::new() }
    }

    /// Column names; only the first description counts.
    fn header(&mut self, names: Vec<String>) {
        if self.names.is_none() {
            self.names = Some(names);
        }
    }

    fn has_header(&self) -> bool {
        self.names.is_some()
    }

    /// Keeps the row if there is room. Returns false once the cap is reached.
    fn row(&mut self, cells: Vec<String>) -> bool {
        if self.rows.len() < self.max_rows {
            self.rows.push(cells);
        }
        self.rows.len() < self.max_rows
    }

    fn complete(self, count: u64) -> QueryOutcome {
        match self.names {
            Some(names) => QueryOutcome::Rows(TabularResult::from_rows(names, self.rows)),
            None => QueryOutcome::UpdateCount(count),
        }
    }

    fn finish(self) -> QueryOutcome {
        self.complete(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> PgSettings {
        PgSettings {
            url: url.into(),
            user: "gpadmin".into(),
            password: "secret".into(),
            driver_name: "org.postgresql.Driver".into(),
            max_result: 1000,
        }
    }

    #[test]
    fn test_jdbc_url_is_accepted() {
        let cfg = settings("jdbc:postgresql://db.local:5433/analytics")
            .connection_config()
            .unwrap();
        assert_eq!(cfg.get_dbname(), Some("analytics"));
        assert_eq!(cfg.get_user(), Some("gpadmin"));
        assert_eq!(cfg.get_password(), Some(&b"secret"[..]));
        assert_eq!(cfg.get_ports(), &[5433]);
    }

    #[test]
    fn test_url_credentials_win() {
        let cfg = settings("postgres://alice:pw@localhost:5432/").connection_config().unwrap();
        assert_eq!(cfg.get_user(), Some("alice"));
        assert_eq!(cfg.get_password(), Some(&b"pw"[..]));
    }

    #[test]
    fn test_malformed_url_is_connect_error() {
        let err = settings("postgres://localhost:notaport/").connection_config().unwrap_err();
        assert!(matches!(err, InterpreterError::Connect(_)));
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_messages_is_zero_update_count() {
        assert_eq!(FirstResult::new(10).finish(), QueryOutcome::UpdateCount(0));
        assert_eq!(FirstResult::new(10).complete(7), QueryOutcome::UpdateCount(7));
    }

    #[test]
    fn test_row_cap_stops_collection() {
        let mut result = FirstResult::new(2);
        result.header(names(&["n"]));
        assert!(result.row(names(&["1"])));
        assert!(!result.row(names(&["2"])));
        // extra rows after the cap are not kept
        assert!(!result.row(names(&["3"])));

        let mut expected = TabularResult::new();
        expected.add_column("n", ["1", "2"]);
        assert_eq!(result.finish(), QueryOutcome::Rows(expected));
    }

    #[test]
    fn test_zero_cap_keeps_header() {
        let mut result = FirstResult::new(0);
        result.header(names(&["a", "b"]));
        assert!(!result.row(names(&["1", "2"])));
        match result.complete(1) {
            QueryOutcome::Rows(rows) => {
                assert_eq!(rows.column_count(), 2);
                assert_eq!(rows.row_count(), 0);
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn test_first_description_wins() {
        let mut result = FirstResult::new(5);
        assert!(!result.has_header());
        result.header(names(&["first"]));
        assert!(result.has_header());
        result.header(names(&["second"]));
        let mut expected = TabularResult::new();
        expected.add_column("first", Vec::<String>::new());
        assert_eq!(result.complete(0), QueryOutcome::Rows(expected));
    }
}
