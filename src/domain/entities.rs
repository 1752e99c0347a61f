//! Domain entities. Pure data structures for the core business.
//!
//! No mailbox/HTTP/storage types here; adapters map into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column titles of the audit log, in row order.
pub const AUDIT_HEADER: [&str; 4] = ["Timestamp", "Email Subject", "Status", "Detail"];

/// Subject written on the audit row when a conversation could not be processed.
pub const FAILED_SUBJECT: &str = "Error processing email";

/// Handle to a conversation (thread) held by a conversation source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationRef {
    /// Opaque id chosen by the adapter, e.g. a file name or thread id.
    pub id: String,
    /// Label the conversation was listed under.
    pub label: String,
}

/// The first message of a conversation: everything the sweep reads from the mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailMessage {
    pub subject: String,
    /// Raw markup. May be empty or contain no links at all.
    pub body: String,
}

/// A single unsubscribe URL, already trimmed. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeLink(String);

impl UnsubscribeLink {
    /// Trims `raw`; returns None if nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnsubscribeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of trying to follow an unsubscribe link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The remote answered. `status` is observational only (4xx/5xx still count).
    LinkFollowed { status: u16 },
    /// Transport failure: timeout, DNS, refused connection, malformed URL.
    LinkFailed { reason: String },
    NoLinkFound,
}

impl DispatchOutcome {
    /// Audit status for this outcome. Followed and failed links share one status.
    pub fn audit_status(&self) -> AuditStatus {
        match self {
            DispatchOutcome::LinkFollowed { .. } | DispatchOutcome::LinkFailed { .. } => {
                AuditStatus::AttemptedToUnsubscribe
            }
            DispatchOutcome::NoLinkFound => AuditStatus::NoUnsubscribeLinkFound,
        }
    }
}

/// Value of the "Status" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    AttemptedToUnsubscribe,
    NoUnsubscribeLinkFound,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::AttemptedToUnsubscribe => "Attempted to Unsubscribe",
            AuditStatus::NoUnsubscribeLinkFound => "No Unsubscribe Link Found",
            AuditStatus::Failed => "Failed",
        }
    }

    /// Inverse of [`AuditStatus::as_str`], used when reading rows back.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Attempted to Unsubscribe" => Some(AuditStatus::AttemptedToUnsubscribe),
            "No Unsubscribe Link Found" => Some(AuditStatus::NoUnsubscribeLinkFound),
            "Failed" => Some(AuditStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the audit log. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub status: AuditStatus,
    pub detail: String,
}

impl AuditRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        subject: impl Into<String>,
        status: AuditStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            subject: subject.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Row written when a conversation fails anywhere between reading and discarding.
    pub fn failure(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::new(timestamp, FAILED_SUBJECT, AuditStatus::Failed, message)
    }

    /// Cells in [`AUDIT_HEADER`] order. Timestamp is RFC 3339 (UTC).
    pub fn to_row(&self) -> [String; 4] {
        [
            self.timestamp.to_rfc3339(),
            self.subject.clone(),
            self.status.as_str().to_string(),
            self.detail.clone(),
        ]
    }
}

/// Counters for one sweep run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Conversations listed under the label.
    pub conversations: usize,
    /// Link found; request sent or failed.
    pub attempted: usize,
    pub no_link: usize,
    /// Conversations that ended with a "Failed" row.
    pub failed: usize,
    pub discarded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_is_trimmed() {
        let link = UnsubscribeLink::new("  https://x.test/u \n").unwrap();
        assert_eq!(link.as_str(), "https://x.test/u");
    }

    #[test]
    fn test_blank_link_is_rejected() {
        assert!(UnsubscribeLink::new("").is_none());
        assert!(UnsubscribeLink::new("   \t").is_none());
    }

    #[test]
    fn test_followed_and_failed_share_status() {
        let followed = DispatchOutcome::LinkFollowed { status: 404 };
        let failed = DispatchOutcome::LinkFailed {
            reason: "timed out".into(),
        };
        assert_eq!(followed.audit_status(), AuditStatus::AttemptedToUnsubscribe);
        assert_eq!(failed.audit_status(), AuditStatus::AttemptedToUnsubscribe);
        assert_eq!(
            DispatchOutcome::NoLinkFound.audit_status().as_str(),
            "No Unsubscribe Link Found"
        );
    }

    #[test]
    fn test_status_parse_inverts_as_str() {
        for s in [
            AuditStatus::AttemptedToUnsubscribe,
            AuditStatus::NoUnsubscribeLinkFound,
            AuditStatus::Failed,
        ] {
            assert_eq!(AuditStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AuditStatus::parse("Unknown"), None);
    }

    #[test]
    fn test_failure_row() {
        let ts = DateTime::<Utc>::from_timestamp(1704067200, 0).unwrap();
        let row = AuditRecord::failure(ts, "boom").to_row();
        assert_eq!(row[0], "2024-01-01T00:00:00+00:00");
        assert_eq!(row[1], "Error processing email");
        assert_eq!(row[2], "Failed");
        assert_eq!(row[3], "boom");
    }
}
