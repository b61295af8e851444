//! In-memory backends for exercising the interpreters without a database or cluster.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    error::{InterpreterError, Result},
    postgresql::{Connector, PgSettings, QueryBackend, QueryOutcome, TabularResult},
    springxd::{OperationsFactory, ResourceKind, ResourceOperations},
};

/// Query backend answering every statement with a prepared outcome.
#[derive(Default)]
pub struct FakePg {
    outcome: Mutex<Option<std::result::Result<QueryOutcome, String>>>,
    executed: Mutex<Vec<String>>,
    hang: AtomicBool,
    cancelled: Notify,
    cancel_calls: AtomicUsize,
    closed: AtomicBool,
}

impl FakePg {
    pub fn with_result(result: TabularResult) -> Self {
        let fake = Self::default();
        fake.set_outcome(Ok(QueryOutcome::Rows(result)));
        fake
    }

    pub fn set_outcome(&self, outcome: std::result::Result<QueryOutcome, String>) {
        *self.outcome.lock() = Some(outcome);
    }

    /// Makes `execute` block until `cancel` is called.
    pub fn hang_until_cancelled(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryBackend for FakePg {
    async fn execute(&self, sql: &str, max_rows: usize) -> Result<QueryOutcome> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(InterpreterError::NotConnected);
        }
        self.executed.lock().push(sql.to_string());

        if self.hang.load(Ordering::SeqCst) {
            self.cancelled.notified().await;
            return Err(InterpreterError::Query(
                "canceling statement due to user request".into(),
            ));
        }

        let outcome = self.outcome.lock().clone();
        match outcome {
            Some(Ok(QueryOutcome::Rows(mut result))) => {
                for column in &mut result.columns {
                    column.cells.truncate(max_rows);
                }
                Ok(QueryOutcome::Rows(result))
            }
            Some(Ok(other)) => Ok(other),
            Some(Err(message)) => Err(InterpreterError::Query(message)),
            None => Ok(QueryOutcome::UpdateCount(0)),
        }
    }

    async fn cancel(&self) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.cancelled.notify_one();
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Connector handing out one shared [`FakePg`], or failing.
pub struct FakePgConnector {
    backend: Arc<FakePg>,
    failure: Mutex<Option<String>>,
    connects: AtomicUsize,
}

impl FakePgConnector {
    pub fn new(backend: Arc<FakePg>) -> Self {
        Self { backend, failure: Mutex::new(None), connects: AtomicUsize::new(0) }
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for Arc<FakePgConnector> {
    async fn connect(&self, _settings: &PgSettings) -> Result<Arc<dyn QueryBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().clone() {
            return Err(InterpreterError::Connect(message));
        }
        self.backend.closed.store(false, Ordering::SeqCst);
        Ok(Arc::clone(&self.backend) as Arc<dyn QueryBackend>)
    }
}

/// SpringXD cluster kept in memory. Names are unique per kind, as on a real cluster.
#[derive(Default)]
pub struct FakeXd {
    live: Mutex<BTreeSet<(ResourceKind, String)>>,
    history: Mutex<Vec<String>>,
    failing_creates: Mutex<HashSet<String>>,
    failing_destroys: Mutex<HashSet<String>>,
    completions: Mutex<HashMap<String, Option<Vec<String>>>>,
    destroyed: AtomicUsize,
}

impl FakeXd {
    pub fn fail_create(&self, name: &str) {
        self.failing_creates.lock().insert(name.to_string());
    }

    pub fn fail_destroy(&self, name: &str) {
        self.failing_destroys.lock().insert(name.to_string());
    }

    pub fn allow_destroy(&self, name: &str) {
        self.failing_destroys.lock().remove(name);
    }

    pub fn answer_completion(&self, prefix: &str, suggestions: Option<Vec<String>>) {
        self.completions.lock().insert(prefix.to_string(), suggestions);
    }

    /// Deployed names, sorted.
    pub fn live(&self) -> Vec<String> {
        self.live.lock().iter().map(|(_, name)| name.clone()).collect()
    }

    /// `create:<name>` / `destroy:<name>` in call order, successful calls only.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceOperations for FakeXd {
    async fn create(&self, kind: ResourceKind, name: &str, _definition: &str) -> Result<()> {
        if self.failing_creates.lock().contains(name) {
            return Err(InterpreterError::ResourceCreate {
                name: name.to_string(),
                message: format!("XD100E: invalid definition for '{name}'"),
            });
        }
        if !self.live.lock().insert((kind, name.to_string())) {
            return Err(InterpreterError::ResourceCreate {
                name: name.to_string(),
                message: format!("There is already a {} named '{name}'", kind.as_str()),
            });
        }
        self.history.lock().push(format!("create:{name}"));
        Ok(())
    }

    async fn destroy(&self, kind: ResourceKind, name: &str) -> Result<()> {
        if self.failing_destroys.lock().contains(name) {
            return Err(InterpreterError::ResourceDestroy {
                name: name.to_string(),
                message: "undeploy timed out".into(),
            });
        }
        self.live.lock().remove(&(kind, name.to_string()));
        self.history.lock().push(format!("destroy:{name}"));
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn completions(
        &self,
        _kind: ResourceKind,
        prefix: &str,
        _detail_level: u32,
    ) -> Result<Option<Vec<String>>> {
        match self.completions.lock().get(prefix) {
            Some(answer) => Ok(answer.clone()),
            None => Err(InterpreterError::Completion(format!("no completions for '{prefix}'"))),
        }
    }
}

/// Factory handing out one shared [`FakeXd`].
pub struct FakeXdFactory {
    xd: Arc<FakeXd>,
}

impl FakeXdFactory {
    pub fn new(xd: Arc<FakeXd>) -> Self {
        Self { xd }
    }
}

impl OperationsFactory for FakeXdFactory {
    fn connect(&self, base_url: &str, _timeout: Duration) -> Result<Arc<dyn ResourceOperations>> {
        if !base_url.starts_with("http") {
            return Err(InterpreterError::Connect(format!("relative URI: {base_url}")));
        }
        Ok(Arc::clone(&self.xd) as Arc<dyn ResourceOperations>)
    }
}
