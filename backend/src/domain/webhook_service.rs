//! Signed third-party webhook intake.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    WebhookDelivery, WebhookEventRepository, WebhookReceipt, WebhookService,
};
use crate::domain::{
    EVENT_ID_MAX, EVENT_TYPE_MAX, Error, UNKNOWN_EVENT_TYPE, WebhookEvent, WebhookRecordOutcome,
    WebhookSecrets,
};

/// Reject a provider header longer than the event log column holds.
fn bounded_header(header: &str, value: Option<String>, max: usize) -> Result<Option<String>, Error> {
    match value {
        Some(raw) if raw.chars().count() > max => Err(Error::invalid_request(format!(
            "{header} must be at most {max} characters"
        ))
        .with_details(json!({ "field": header, "code": "too_long" }))),
        other => Ok(other.filter(|v| !v.trim().is_empty())),
    }
}

#[derive(Clone)]
pub struct WebhookReceiver {
    secrets: WebhookSecrets,
    events: Arc<dyn WebhookEventRepository>,
    clock: Arc<dyn Clock>,
}

impl WebhookReceiver {
    pub fn new(
        secrets: WebhookSecrets,
        events: Arc<dyn WebhookEventRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secrets,
            events,
            clock,
        }
    }
}

#[async_trait]
impl WebhookService for WebhookReceiver {
    async fn receive(&self, delivery: WebhookDelivery) -> Result<WebhookReceipt, Error> {
        let provider = delivery.provider.trim().to_lowercase();
        if !self.secrets.knows(&provider) {
            return Err(Error::not_found(format!(
                "no webhook configured for provider {provider}"
            )));
        }
        let verified = delivery
            .signature
            .as_deref()
            .and_then(|signature| self.secrets.verify(&provider, &delivery.body, signature))
            .unwrap_or(false);
        if !verified {
            warn!(%provider, "rejected webhook with a missing or invalid signature");
            return Err(Error::unauthorized("invalid webhook signature"));
        }
        let event_type = bounded_header("X-Event-Type", delivery.event_type, EVENT_TYPE_MAX)?;
        let event_id = bounded_header("X-Event-Id", delivery.event_id, EVENT_ID_MAX)?;
        let payload: Value = serde_json::from_slice(&delivery.body)
            .map_err(|err| Error::invalid_request(format!("webhook body is not JSON: {err}")))?;

        let event = WebhookEvent {
            id: Uuid::new_v4(),
            provider: provider.clone(),
            event_type: event_type.unwrap_or_else(|| UNKNOWN_EVENT_TYPE.to_owned()),
            event_id,
            payload,
            received_at: self.clock.utc(),
        };
        let receipt = match self.events.record(&event).await? {
            WebhookRecordOutcome::Recorded => WebhookReceipt {
                event_id: event.id,
                duplicate: false,
            },
            WebhookRecordOutcome::Duplicate { id } => WebhookReceipt {
                event_id: id,
                duplicate: true,
            },
        };
        info!(
            %provider,
            event_type = %event.event_type,
            duplicate = receipt.duplicate,
            "webhook received"
        );
        Ok(receipt)
    }
}
