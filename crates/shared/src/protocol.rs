use serde::{Deserialize, Serialize};

use crate::domain::{Recipient, SubmissionRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMessage {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
    pub to_name: String,
    pub to_email: String,
    pub reply_to: String,
}

impl DeliveryMessage {
    pub fn compose(request: &SubmissionRequest, recipient: &Recipient) -> Self {
        Self {
            from_name: request.name.trim().to_string(),
            from_email: request.email.trim().to_string(),
            subject: request.subject.trim().to_string(),
            message: request.message.clone(),
            to_name: recipient.name.clone(),
            to_email: recipient.email.clone(),
            reply_to: request.email.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySendRequest {
    pub service_id: String,
    pub template_id: String,
    /// Public key of the relay account.
    pub user_id: String,
    pub template_params: DeliveryMessage,
}
