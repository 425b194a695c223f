//! Driving port for third-party webhook deliveries.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;

/// Raw delivery as received by the inbound adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDelivery {
    pub provider: String,
    pub event_type: Option<String>,
    pub event_id: Option<String>,
    pub signature: Option<String>,
    pub body: Vec<u8>,
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReceipt {
    pub event_id: Uuid,
    pub duplicate: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookService: Send + Sync {
    async fn receive(&self, delivery: WebhookDelivery) -> Result<WebhookReceipt, Error>;
}
