//! Implements ConversationSource over a directory tree.
//!
//! Layout: `{root}/{label}/{conversation}.json`, one JSON document per conversation:
//! `{"messages": [{"subject": "...", "body": "..."}]}`. Conversations are listed in file
//! name order. Discarding moves the file to `{root}/Trash/` rather than deleting it.

use crate::domain::{ConversationRef, DomainError, MailMessage};
use crate::ports::ConversationSource;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Directory receiving discarded conversations.
pub const TRASH_DIR: &str = "Trash";

const CONVERSATION_EXT: &str = "json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredConversation {
    #[serde(default)]
    messages: Vec<MailMessage>,
}

/// File-system mailbox. One directory per label, one JSON file per conversation.
pub struct LabelDirSource {
    root: PathBuf,
}

impl LabelDirSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn label_dir(&self, label: &str) -> Result<PathBuf, DomainError> {
        if label.is_empty()
            || label == "."
            || label == ".."
            || label.contains(['/', '\\'])
        {
            return Err(DomainError::Mailbox(format!("invalid label name: {:?}", label)));
        }
        Ok(self.root.join(label))
    }

    fn conversation_path(&self, conversation: &ConversationRef) -> Result<PathBuf, DomainError> {
        Ok(self.label_dir(&conversation.label)?.join(&conversation.id))
    }

    /// Write a conversation file under `label`. Used to seed a mailbox (imports, tests).
    pub async fn store(
        &self,
        label: &str,
        id: &str,
        messages: &[MailMessage],
    ) -> Result<PathBuf, DomainError> {
        let dir = self.label_dir(label)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Mailbox(e.to_string()))?;
        let path = dir.join(format!("{}.{}", id, CONVERSATION_EXT));
        let doc = StoredConversation {
            messages: messages.to_vec(),
        };
        let json =
            serde_json::to_string_pretty(&doc).map_err(|e| DomainError::Mailbox(e.to_string()))?;
        fs::write(&path, json)
            .await
            .map_err(|e| DomainError::Mailbox(e.to_string()))?;
        Ok(path)
    }

    /// Free destination in the trash; never overwrites an earlier discard.
    async fn trash_destination(&self, file_name: &str) -> Result<PathBuf, DomainError> {
        let trash = self.root.join(TRASH_DIR);
        fs::create_dir_all(&trash)
            .await
            .map_err(|e| DomainError::Mailbox(format!("create trash dir: {}", e)))?;
        let mut dest = trash.join(file_name);
        let mut n = 1u32;
        while fs::try_exists(&dest)
            .await
            .map_err(|e| DomainError::Mailbox(format!("check trash slot: {}", e)))?
        {
            dest = trash.join(format!("{}.{}", n, file_name));
            n += 1;
        }
        Ok(dest)
    }
}

#[async_trait::async_trait]
impl ConversationSource for LabelDirSource {
    async fn conversations_by_label(
        &self,
        label: &str,
    ) -> Result<Vec<ConversationRef>, DomainError> {
        let dir = self.label_dir(label)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DomainError::LabelNotFound(label.to_string()));
            }
            Err(e) => return Err(DomainError::Mailbox(e.to_string())),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::Mailbox(e.to_string()))?
        {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file || path.extension().and_then(|e| e.to_str()) != Some(CONVERSATION_EXT) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();

        debug!(path = %dir.display(), count = names.len(), "listed label directory");
        Ok(names
            .into_iter()
            .map(|id| ConversationRef {
                id,
                label: label.to_string(),
            })
            .collect())
    }

    async fn first_message(
        &self,
        conversation: &ConversationRef,
    ) -> Result<MailMessage, DomainError> {
        let path = self.conversation_path(conversation)?;
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::Mailbox(format!("{}: {}", conversation.id, e)))?;
        let doc: StoredConversation = serde_json::from_str(&raw)
            .map_err(|e| DomainError::Mailbox(format!("{}: {}", conversation.id, e)))?;
        doc.messages.into_iter().next().ok_or_else(|| {
            DomainError::Mailbox(format!("conversation {} has no messages", conversation.id))
        })
    }

    async fn discard(&self, conversation: &ConversationRef) -> Result<(), DomainError> {
        let path = self.conversation_path(conversation)?;
        let dest = self.trash_destination(&conversation.id).await?;
        fs::rename(&path, &dest)
            .await
            .map_err(|e| DomainError::Mailbox(format!("move to trash: {}", e)))?;
        info!(
            conversation = %conversation.id,
            path = %dest.display(),
            "conversation moved to trash"
        );
        Ok(())
    }
}
