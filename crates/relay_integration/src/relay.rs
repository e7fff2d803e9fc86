use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    error::DeliveryError,
    protocol::{DeliveryMessage, RelaySendRequest},
};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::{DeliveryGateway, DeliveryReceipt};

pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";
const RELAY_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const RELAY_UNREACHABLE: &str = "email relay unreachable";
const EMPTY_REJECTION_BODY: &str = "no details from relay";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub endpoint: Url,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl RelayConfig {
    pub fn new(
        endpoint: &str,
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())
            .with_context(|| format!("invalid relay endpoint '{endpoint}'"))?;
        Ok(Self {
            endpoint,
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
        })
    }
}

pub struct RelayGateway {
    http: Client,
    config: RelayConfig,
}

impl RelayGateway {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(RELAY_REQUEST_TIMEOUT)
            .build()
            .context("failed to build relay http client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl DeliveryGateway for RelayGateway {
    async fn deliver(&self, message: DeliveryMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let attempt_id = Uuid::new_v4();
        let body = RelaySendRequest {
            service_id: self.config.service_id.clone(),
            template_id: self.config.template_id.clone(),
            user_id: self.config.public_key.clone(),
            template_params: message,
        };

        let response = self
            .http
            .post(self.config.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(%attempt_id, endpoint = %self.config.endpoint, "relay: request failed: {err}");
                DeliveryError::Unreachable(RELAY_UNREACHABLE.to_string())
            })?;

        let status = response.status();
        let response_text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!(%attempt_id, "relay: failed to read response body: {err}");
                String::new()
            }
        };

        if status != StatusCode::OK {
            warn!(
                %attempt_id,
                status = status.as_u16(),
                "relay: message rejected body={response_text}"
            );
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: rejection_body(&response_text),
            });
        }

        info!(
            %attempt_id,
            template_id = %self.config.template_id,
            "relay: message accepted"
        );
        Ok(DeliveryReceipt::accepted(
            attempt_id,
            status.as_u16(),
            response_text,
        ))
    }
}

fn rejection_body(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        EMPTY_REJECTION_BODY.to_string()
    } else {
        text.to_string()
    }
}
