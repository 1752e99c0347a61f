//! Dispatcher stub: never touches the network, returns a fixed outcome for every link.
//!
//! Records the URLs it was asked to follow so tests can assert on them.

use crate::domain::{DispatchOutcome, UnsubscribeLink};
use crate::ports::DispatchPort;
use std::sync::{Mutex, PoisonError};
use tracing::info;

pub struct StaticDispatcher {
    outcome: DispatchOutcome,
    calls: Mutex<Vec<String>>,
}

impl StaticDispatcher {
    /// Every link is "followed" with the given HTTP status.
    pub fn followed(status: u16) -> Self {
        Self::with_outcome(DispatchOutcome::LinkFollowed { status })
    }

    /// Every link fails with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self::with_outcome(DispatchOutcome::LinkFailed {
            reason: reason.to_string(),
        })
    }

    fn with_outcome(outcome: DispatchOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// URLs dispatched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl DispatchPort for StaticDispatcher {
    async fn dispatch(&self, link: Option<&UnsubscribeLink>) -> DispatchOutcome {
        let Some(link) = link else {
            return DispatchOutcome::NoLinkFound;
        };
        info!(url = %link, "[STATIC] Skipping unsubscribe request");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(link.as_str().to_string());
        self.outcome.clone()
    }
}
