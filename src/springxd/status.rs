//! Per-paragraph deployment status shown in the notebook, and the channel the host
//! uses to report that the user flipped it.

use tokio::sync::mpsc;

use crate::interpreter::InterpreterContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Deployed,
    Destroyed,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Deployed => "DEPLOYED",
            ResourceStatus::Destroyed => "DESTROYED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DEPLOYED" => Some(ResourceStatus::Deployed),
            "DESTROYED" => Some(ResourceStatus::Destroyed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub ctx: InterpreterContext,
    pub status: ResourceStatus,
}

/// Sender half handed to the host.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl StatusHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<StatusEvent>) -> Self {
        Self { tx }
    }

    /// Returns false once the interpreter is gone.
    pub fn set(&self, ctx: &InterpreterContext, status: ResourceStatus) -> bool {
        self.tx
            .send(StatusEvent { ctx: ctx.clone(), status })
            .is_ok()
    }
}

/// Variable the status is bound to: `resourceStatus_` plus the paragraph id with `-` as `_`.
pub fn status_id(paragraph_id: &str) -> String {
    format!("resourceStatus_{}", paragraph_id.replace('-', "_"))
}

/// `%angular` toggle that flips the paragraph status to DESTROYED, labelled with the
/// paragraph's deployed resources.
pub fn destroy_button(paragraph_id: &str, deployed: &[String]) -> String {
    let id = status_id(paragraph_id);
    format!(
        "%angular <button ng-click='{id} = \"{}\"'>  [{}] : {{{{{id}}}}} </button>",
        ResourceStatus::Destroyed.as_str(),
        deployed.join(", "),
    )
}
