//! Sweep use case: ensure audit header -> list labelled conversations -> per conversation
//! extract link, dispatch, audit, discard.
//!
//! Conversations are handled strictly one after another. A failure inside one conversation
//! is recorded as a "Failed" row and never aborts the batch; setup failures (header, label
//! lookup) abort the run.

use crate::domain::{
    AUDIT_HEADER, AuditRecord, ConversationRef, DispatchOutcome, DomainError, SweepReport, extract,
};
use crate::ports::{AuditLogPort, ConversationSource, DispatchPort, TriggerHandler};
use crate::shared::config::{RUN_HANDLER_NAME, SweepConfig};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sweep service. Wires the link extractor and dispatcher to the mailbox and audit log.
pub struct SweepService {
    source: Arc<dyn ConversationSource>,
    audit: Arc<dyn AuditLogPort>,
    dispatcher: Arc<dyn DispatchPort>,
    config: SweepConfig,
}

impl SweepService {
    pub fn new(
        source: Arc<dyn ConversationSource>,
        audit: Arc<dyn AuditLogPort>,
        dispatcher: Arc<dyn DispatchPort>,
        config: SweepConfig,
    ) -> Self {
        Self {
            source,
            audit,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// One full pass over the watched label.
    pub async fn run(&self) -> Result<SweepReport, DomainError> {
        if self.audit.ensure_header(&AUDIT_HEADER).await? {
            info!("Headers added to the audit log");
        } else {
            debug!("Audit log already set up");
        }

        let label = self.config.label_to_watch.as_str();
        let conversations = self.source.conversations_by_label(label).await?;
        info!(
            label,
            count = conversations.len(),
            "Processing {} conversations",
            conversations.len()
        );

        let mut report = SweepReport {
            conversations: conversations.len(),
            ..Default::default()
        };

        for conversation in &conversations {
            match self.process_conversation(conversation).await {
                Ok(outcome) => {
                    match outcome {
                        DispatchOutcome::NoLinkFound => report.no_link += 1,
                        _ => report.attempted += 1,
                    }
                    report.discarded += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(conversation = %conversation.id, error = %e, "Conversation failed");
                    let record = AuditRecord::failure(Utc::now(), e.to_string());
                    if let Err(log_err) = self.audit.append(&record).await {
                        warn!(
                            conversation = %conversation.id,
                            error = %log_err,
                            "Failed to record failure in audit log"
                        );
                    }
                }
            }
        }

        info!(
            label,
            attempted = report.attempted,
            no_link = report.no_link,
            failed = report.failed,
            discarded = report.discarded,
            "Sweep complete"
        );
        Ok(report)
    }

    /// Read, extract, dispatch, audit, discard. Any error here is a per-conversation failure.
    async fn process_conversation(
        &self,
        conversation: &ConversationRef,
    ) -> Result<DispatchOutcome, DomainError> {
        let message = self.source.first_message(conversation).await?;

        let link = extract(&message.body);
        let outcome = self.dispatcher.dispatch(link.as_ref()).await;

        let detail = match &outcome {
            DispatchOutcome::LinkFailed { reason } if self.config.record_dispatch_failures => {
                reason.clone()
            }
            _ => String::new(),
        };
        let record = AuditRecord::new(
            Utc::now(),
            message.subject,
            outcome.audit_status(),
            detail,
        );
        self.audit.append(&record).await?;

        self.source.discard(conversation).await?;
        debug!(conversation = %conversation.id, status = %record.status, "Conversation discarded");

        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl TriggerHandler for SweepService {
    fn name(&self) -> &str {
        RUN_HANDLER_NAME
    }

    async fn on_trigger(&self) -> Result<(), DomainError> {
        self.run().await.map(|_| ())
    }
}
