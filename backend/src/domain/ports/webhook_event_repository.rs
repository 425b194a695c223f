//! Port for the inbound webhook event log.
use async_trait::async_trait;

use crate::domain::{WebhookEvent, WebhookRecordOutcome};

use super::define_port_error;

define_port_error! {
    /// Errors raised by webhook event log adapters.
    pub enum WebhookEventRepositoryError {
        Connection { message: String } => "webhook log connection failed: {message}",
        Query { message: String } => "webhook log query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Record an event unless `(provider, event_id)` was seen before.
    async fn record(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookRecordOutcome, WebhookEventRepositoryError>;
}
