//! Streams/jobs deployed by each notebook paragraph.
//!
//! Re-running a paragraph destroys what it deployed before, so a name only ever sits in
//! one (note, paragraph) bucket. Buckets are created on the first successful deploy and
//! pruned as their resources are destroyed. A resource whose destroy fails stays
//! registered and is retried by the next cascade.

use std::{collections::HashMap, sync::Arc};

use super::client::{ResourceKind, ResourceOperations};
use crate::error::Result;

pub struct ResourceRegistry {
    kind: ResourceKind,
    operations: Arc<dyn ResourceOperations>,
    note2paragraph2resources: HashMap<String, HashMap<String, Vec<String>>>,
}

impl ResourceRegistry {
    pub fn new(kind: ResourceKind, operations: Arc<dyn ResourceOperations>) -> Self {
        Self { kind, operations, note2paragraph2resources: HashMap::new() }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn operations(&self) -> Arc<dyn ResourceOperations> {
        Arc::clone(&self.operations)
    }

    /// Creates the resource on the cluster, then records it. Blank input is a no-op.
    pub async fn deploy(
        &mut self,
        note_id: &str,
        paragraph_id: &str,
        name: &str,
        definition: &str,
    ) -> Result<()> {
        if name.trim().is_empty() || definition.trim().is_empty() {
            return Ok(());
        }

        self.operations.create(self.kind, name, definition).await?;

        self.note2paragraph2resources
            .entry(note_id.to_string())
            .or_default()
            .entry(paragraph_id.to_string())
            .or_default()
            .push(name.to_string());
        Ok(())
    }

    pub fn list_for(&self, note_id: &str, paragraph_id: &str) -> Vec<String> {
        self.note2paragraph2resources
            .get(note_id)
            .and_then(|paragraphs| paragraphs.get(paragraph_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.note2paragraph2resources.is_empty()
    }

    /// Number of registered resources across all notebooks.
    pub fn len(&self) -> usize {
        self.note2paragraph2resources
            .values()
            .flat_map(|paragraphs| paragraphs.values())
            .map(Vec::len)
            .sum()
    }

    /// Destroys every resource of the paragraph. Failures are logged and skipped.
    pub async fn destroy_for(&mut self, note_id: &str, paragraph_id: &str) {
        let Some(names) = self
            .note2paragraph2resources
            .get_mut(note_id)
            .and_then(|paragraphs| paragraphs.remove(paragraph_id))
        else {
            return;
        };

        let mut remaining = Vec::new();
        for name in names {
            match self.operations.destroy(self.kind, &name).await {
                Ok(()) => {
                    tracing::info!(
                        kind = self.kind.as_str(),
                        resource = %name,
                        note = %note_id,
                        paragraph = %paragraph_id,
                        "destroyed"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        kind = self.kind.as_str(),
                        resource = %name,
                        error = %e.user_message(),
                        "failed to destroy resource"
                    );
                    remaining.push(name);
                }
            }
        }

        if let Some(paragraphs) = self.note2paragraph2resources.get_mut(note_id) {
            if !remaining.is_empty() {
                paragraphs.insert(paragraph_id.to_string(), remaining);
            }
            if paragraphs.is_empty() {
                self.note2paragraph2resources.remove(note_id);
            }
        }
    }

    pub async fn destroy_for_notebook(&mut self, note_id: &str) {
        let paragraph_ids: Vec<String> = self
            .note2paragraph2resources
            .get(note_id)
            .map(|paragraphs| paragraphs.keys().cloned().collect())
            .unwrap_or_default();
        for paragraph_id in paragraph_ids {
            self.destroy_for(note_id, &paragraph_id).await;
        }
    }

    pub async fn destroy_all(&mut self) {
        let note_ids: Vec<String> = self.note2paragraph2resources.keys().cloned().collect();
        for note_id in note_ids {
            self.destroy_for_notebook(&note_id).await;
        }
    }
}
