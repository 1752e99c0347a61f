//! In-memory conversation source for tests and dry runs.
//!
//! Conversations live in insertion order per label. Read and discard failures can be
//! injected per conversation id.

use crate::domain::{ConversationRef, DomainError, MailMessage};
use crate::ports::ConversationSource;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    /// label -> conversation ids, in listing order.
    labels: HashMap<String, Vec<String>>,
    threads: HashMap<String, Vec<MailMessage>>,
    read_failures: HashMap<String, String>,
    discard_failures: HashMap<String, String>,
    discarded: Vec<String>,
}

/// Mailbox held in memory. Cheap to build in tests; no I/O.
#[derive(Default)]
pub struct MemoryConversationSource {
    inner: Mutex<Inner>,
}

impl MemoryConversationSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty label. Listing a label that was never created is `LabelNotFound`.
    pub fn create_label(&self, label: &str) {
        self.lock().labels.entry(label.to_string()).or_default();
    }

    /// Add a conversation under `label` (created on demand).
    pub fn add(&self, label: &str, id: &str, messages: Vec<MailMessage>) {
        let mut inner = self.lock();
        inner
            .labels
            .entry(label.to_string())
            .or_default()
            .push(id.to_string());
        inner.threads.insert(id.to_string(), messages);
    }

    /// Make `first_message` fail for `id` with `message`.
    pub fn fail_reads(&self, id: &str, message: &str) {
        self.lock()
            .read_failures
            .insert(id.to_string(), message.to_string());
    }

    /// Make `discard` fail for `id` with `message`.
    pub fn fail_discard(&self, id: &str, message: &str) {
        self.lock()
            .discard_failures
            .insert(id.to_string(), message.to_string());
    }

    /// Ids discarded so far, in discard order.
    pub fn discarded(&self) -> Vec<String> {
        self.lock().discarded.clone()
    }
}

#[async_trait::async_trait]
impl ConversationSource for MemoryConversationSource {
    async fn conversations_by_label(
        &self,
        label: &str,
    ) -> Result<Vec<ConversationRef>, DomainError> {
        let inner = self.lock();
        let ids = inner
            .labels
            .get(label)
            .ok_or_else(|| DomainError::LabelNotFound(label.to_string()))?;
        Ok(ids
            .iter()
            .map(|id| ConversationRef {
                id: id.clone(),
                label: label.to_string(),
            })
            .collect())
    }

    async fn first_message(
        &self,
        conversation: &ConversationRef,
    ) -> Result<MailMessage, DomainError> {
        let inner = self.lock();
        if let Some(msg) = inner.read_failures.get(&conversation.id) {
            return Err(DomainError::Mailbox(msg.clone()));
        }
        inner
            .threads
            .get(&conversation.id)
            .ok_or_else(|| {
                DomainError::Mailbox(format!("conversation {} not found", conversation.id))
            })?
            .first()
            .cloned()
            .ok_or_else(|| {
                DomainError::Mailbox(format!("conversation {} has no messages", conversation.id))
            })
    }

    async fn discard(&self, conversation: &ConversationRef) -> Result<(), DomainError> {
        let mut inner = self.lock();
        if let Some(msg) = inner.discard_failures.get(&conversation.id) {
            return Err(DomainError::Mailbox(msg.clone()));
        }
        if let Some(ids) = inner.labels.get_mut(&conversation.label) {
            ids.retain(|id| id != &conversation.id);
        }
        inner.threads.remove(&conversation.id);
        inner.discarded.push(conversation.id.clone());
        Ok(())
    }
}
