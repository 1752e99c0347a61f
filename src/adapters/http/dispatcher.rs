//! reqwest-backed unsubscribe dispatcher. Implements DispatchPort.
//!
//! One GET per link, bounded by the configured timeout. Any HTTP response counts as
//! followed; transport errors are classified into a short reason and returned as
//! `LinkFailed`. No retries.

use crate::domain::{DispatchOutcome, DomainError, UnsubscribeLink};
use crate::ports::DispatchPort;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub struct HttpDispatcher {
    client: Client,
    timeout: Duration,
}

impl HttpDispatcher {
    /// Build a dispatcher whose requests are abandoned after `timeout`.
    ///
    /// # Errors
    /// Returns `DomainError::Config` if the HTTP client cannot be built (TLS backend init).
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        Self::build(Client::builder(), timeout)
    }

    /// Like [`HttpDispatcher::new`], but ignores `HTTP_PROXY`/`HTTPS_PROXY` and connects
    /// directly. Needed when links point at loopback or otherwise unproxied hosts.
    pub fn direct(timeout: Duration) -> Result<Self, DomainError> {
        Self::build(Client::builder().no_proxy(), timeout)
    }

    fn build(builder: reqwest::ClientBuilder, timeout: Duration) -> Result<Self, DomainError> {
        let client = builder
            .timeout(timeout)
            .user_agent(concat!("mailsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn failure_reason(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs_f32())
        } else if e.is_builder() {
            format!("invalid URL: {}", e)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else if e.is_redirect() {
            format!("redirect error: {}", e)
        } else {
            format!("request failed: {}", e)
        }
    }
}

#[async_trait::async_trait]
impl DispatchPort for HttpDispatcher {
    async fn dispatch(&self, link: Option<&UnsubscribeLink>) -> DispatchOutcome {
        let Some(link) = link else {
            info!("No unsubscribe link found");
            return DispatchOutcome::NoLinkFound;
        };
        info!(url = %link, "Unsubscribe link found");

        match self.client.get(link.as_str()).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                info!(url = %link, status, "Request sent. Response code was {}", status);
                DispatchOutcome::LinkFollowed { status }
            }
            Err(e) => {
                let reason = self.failure_reason(&e);
                warn!(url = %link, error = %reason, "Error following unsubscribe link");
                DispatchOutcome::LinkFailed { reason }
            }
        }
    }
}
