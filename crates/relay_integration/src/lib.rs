use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{error::DeliveryError, protocol::DeliveryMessage};
use uuid::Uuid;

mod relay;
mod simulated;

pub use relay::{RelayConfig, RelayGateway, DEFAULT_RELAY_ENDPOINT};
pub use simulated::{SimulatedGateway, DEFAULT_SIMULATED_DELAY};

/// Proof that the relay accepted a message. Acceptance is only the hand-off;
/// it says nothing about the recipient's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub attempt_id: Uuid,
    pub status: u16,
    pub response_text: String,
    pub accepted_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn accepted(attempt_id: Uuid, status: u16, response_text: impl Into<String>) -> Self {
        Self {
            attempt_id,
            status,
            response_text: response_text.into(),
            accepted_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    async fn deliver(&self, message: DeliveryMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

pub struct MissingDeliveryGateway;

#[async_trait]
impl DeliveryGateway for MissingDeliveryGateway {
    async fn deliver(&self, _message: DeliveryMessage) -> Result<DeliveryReceipt, DeliveryError> {
        Err(DeliveryError::Unavailable)
    }
}

#[cfg(test)]
#[path = "tests/relay_tests.rs"]
mod tests;
