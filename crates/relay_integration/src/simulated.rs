use std::time::Duration;

use async_trait::async_trait;
use shared::{error::DeliveryError, protocol::DeliveryMessage};
use tracing::info;
use uuid::Uuid;

use crate::{DeliveryGateway, DeliveryReceipt};

pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl DeliveryGateway for SimulatedGateway {
    async fn deliver(&self, message: DeliveryMessage) -> Result<DeliveryReceipt, DeliveryError> {
        tokio::time::sleep(self.delay).await;

        let attempt_id = Uuid::new_v4();
        info!(
            %attempt_id,
            to = %message.to_email,
            from = %message.from_email,
            name = %message.from_name,
            subject = %message.subject,
            "simulated relay: message would be sent"
        );
        info!(%attempt_id, "simulated relay: body={}", message.message);

        Ok(DeliveryReceipt::accepted(attempt_id, 200, "OK (simulated)"))
    }
}
