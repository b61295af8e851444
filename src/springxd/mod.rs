//! SpringXD interpreter: deploys the `name = definition` lines of a paragraph as
//! streams or jobs, replacing whatever the paragraph deployed before.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::{
    completion::{prefix_at, strip_echo, SINGLE_LEVEL_OF_DETAILS},
    config::{Config, DEFAULT_SPRINGXD_URL, SPRINGXD_TIMEOUT, SPRINGXD_URL},
    interpreter::{FormType, Interpreter, InterpreterContext, InterpreterResult},
};

pub mod client;
pub mod definition;
pub mod registry;
pub mod status;

pub use client::{OperationsFactory, ResourceKind, ResourceOperations, SpringXdClient, SpringXdConnector};
pub use definition::{parse_block, parse_line, NamedDefinition};
pub use registry::ResourceRegistry;
pub use status::{ResourceStatus, StatusEvent, StatusHandle};

enum SessionState {
    Disconnected,
    Connected(ResourceRegistry),
    ConnectFailed(String),
}

type Bindings = Arc<parking_lot::Mutex<HashMap<InterpreterContext, ResourceStatus>>>;

pub struct SpringXdInterpreter {
    kind: ResourceKind,
    base_url: String,
    timeout: Duration,
    factory: Box<dyn OperationsFactory>,
    session: Arc<Mutex<SessionState>>,
    bindings: Bindings,
    status_tx: mpsc::UnboundedSender<StatusEvent>,
    status_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<StatusEvent>>>,
}

impl SpringXdInterpreter {
    pub fn stream(cfg: &Config) -> Self {
        Self::with_factory(ResourceKind::Stream, cfg, Box::new(SpringXdConnector))
    }

    pub fn job(cfg: &Config) -> Self {
        Self::with_factory(ResourceKind::Job, cfg, Box::new(SpringXdConnector))
    }

    pub fn with_factory(kind: ResourceKind, cfg: &Config, factory: Box<dyn OperationsFactory>) -> Self {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        Self {
            kind,
            base_url: cfg.get_or(SPRINGXD_URL, DEFAULT_SPRINGXD_URL),
            timeout: Duration::from_secs(cfg.get_u64(SPRINGXD_TIMEOUT).unwrap_or(60)),
            factory,
            session: Arc::new(Mutex::new(SessionState::Disconnected)),
            bindings: Arc::new(parking_lot::Mutex::new(HashMap::new())),
            status_tx,
            status_rx: parking_lot::Mutex::new(Some(status_rx)),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Channel for the host to report status toggles from the notebook UI.
    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle::new(self.status_tx.clone())
    }

    /// Last status bound for the paragraph.
    pub fn status(&self, ctx: &InterpreterContext) -> Option<ResourceStatus> {
        self.bindings.lock().get(ctx).copied()
    }

    /// Resources the paragraph currently has deployed.
    pub async fn deployed(&self, ctx: &InterpreterContext) -> Vec<String> {
        match &*self.session.lock().await {
            SessionState::Connected(registry) => registry.list_for(&ctx.note_id, &ctx.paragraph_id),
            _ => Vec::new(),
        }
    }

    /// Starts the status watcher the first time the interpreter is opened.
    fn spawn_status_watcher(&self) {
        let Some(mut rx) = self.status_rx.lock().take() else {
            return;
        };
        let session = Arc::clone(&self.session);
        let bindings = Arc::clone(&self.bindings);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                bindings.lock().insert(event.ctx.clone(), event.status);
                if event.status != ResourceStatus::Destroyed {
                    continue;
                }
                tracing::info!(
                    note = %event.ctx.note_id,
                    paragraph = %event.ctx.paragraph_id,
                    "destroy requested from notebook"
                );
                if let SessionState::Connected(registry) = &mut *session.lock().await {
                    registry.destroy_for(&event.ctx.note_id, &event.ctx.paragraph_id).await;
                }
            }
        });
    }
}

#[async_trait]
impl Interpreter for SpringXdInterpreter {
    async fn open(&self) {
        // Whatever an earlier session deployed goes first
        self.close().await;

        let next = match self.factory.connect(&self.base_url, self.timeout) {
            Ok(operations) => SessionState::Connected(ResourceRegistry::new(self.kind, operations)),
            Err(e) => {
                tracing::error!(url = %self.base_url, error = %e, "failed to connect to the SpringXD cluster");
                SessionState::ConnectFailed(e.user_message())
            }
        };
        *self.session.lock().await = next;
        self.spawn_status_watcher();
    }

    async fn close(&self) {
        let mut session = self.session.lock().await;
        if let SessionState::Connected(registry) = &mut *session {
            registry.destroy_all().await;
        }
        *session = SessionState::Disconnected;
        drop(session);

        self.bindings.lock().clear();
    }

    async fn interpret(&self, text: &str, ctx: &InterpreterContext) -> InterpreterResult {
        let disconnected = matches!(*self.session.lock().await, SessionState::Disconnected);
        if disconnected {
            self.open().await;
        }

        let mut session = self.session.lock().await;
        let registry = match &mut *session {
            SessionState::Connected(registry) => registry,
            SessionState::ConnectFailed(reason) => return InterpreterResult::error(reason.clone()),
            SessionState::Disconnected => {
                return InterpreterResult::error("SpringXD interpreter is not open")
            }
        };

        // Re-running a paragraph replaces what it deployed before
        registry.destroy_for(&ctx.note_id, &ctx.paragraph_id).await;

        for def in parse_block(text) {
            if let Err(e) = registry
                .deploy(&ctx.note_id, &ctx.paragraph_id, &def.name, &def.definition)
                .await
            {
                tracing::error!(resource = %def.name, error = %e, "failed to deploy xd resource");
                registry.destroy_for(&ctx.note_id, &ctx.paragraph_id).await;
                return InterpreterResult::error(format!(
                    "Failed to deploy XD resource: {}",
                    e.user_message()
                ));
            }
            tracing::info!(
                kind = self.kind.as_str(),
                resource = %def.name,
                definition = %def.definition,
                "deployed"
            );
        }

        let deployed = registry.list_for(&ctx.note_id, &ctx.paragraph_id);
        drop(session);

        self.bindings.lock().insert(ctx.clone(), ResourceStatus::Deployed);
        InterpreterResult::success(status::destroy_button(&ctx.paragraph_id, &deployed))
    }

    async fn cancel(&self, _ctx: &InterpreterContext) {}

    async fn completion(&self, buffer: &str, cursor: usize) -> Option<Vec<String>> {
        if buffer.trim().is_empty() {
            return None;
        }

        let operations = match &*self.session.lock().await {
            SessionState::Connected(registry) => registry.operations(),
            _ => return None,
        };

        let prefix = prefix_at(buffer, cursor);
        tracing::debug!(buffer = %buffer, cursor, prefix = %prefix, "completion request");

        match operations.completions(self.kind, prefix, SINGLE_LEVEL_OF_DETAILS).await {
            Ok(suggestions) => strip_echo(suggestions, prefix),
            Err(e) => {
                tracing::error!(error = %e, "completion error");
                None
            }
        }
    }

    fn form_type(&self) -> FormType {
        FormType::Simple
    }
}
