use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Field;

pub const UNEXPECTED_DELIVERY_FAILURE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum FieldError {
    #[error("{} is required", .0.label())]
    Required(Field),
    #[error("Invalid {} address", .0.as_str())]
    InvalidFormat(Field),
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::Required(field) | FieldError::InvalidFormat(field) => *field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("{0}")]
    Unreachable(String),
    #[error("relay responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Rejected(String),
    #[error("no delivery gateway is configured")]
    Unavailable,
    #[error("delivery failed")]
    Unspecified,
}

impl DeliveryError {
    pub fn reason(&self) -> Option<String> {
        match self {
            DeliveryError::Unreachable(message) | DeliveryError::Rejected(message) => {
                let message = message.trim();
                (!message.is_empty()).then(|| message.to_string())
            }
            DeliveryError::Status { .. } | DeliveryError::Unavailable => Some(self.to_string()),
            DeliveryError::Unspecified => None,
        }
    }

    pub fn reason_or_fallback(&self) -> String {
        self.reason()
            .unwrap_or_else(|| UNEXPECTED_DELIVERY_FAILURE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_render_inline_messages() {
        assert_eq!(FieldError::Required(Field::Name).to_string(), "Name is required");
        assert_eq!(
            FieldError::Required(Field::Message).to_string(),
            "Message is required"
        );
        assert_eq!(
            FieldError::InvalidFormat(Field::Email).to_string(),
            "Invalid email address"
        );
    }

    #[test]
    fn blank_rejection_falls_back_to_generic_reason() {
        assert_eq!(
            DeliveryError::Rejected("   ".into()).reason_or_fallback(),
            UNEXPECTED_DELIVERY_FAILURE
        );
        assert_eq!(
            DeliveryError::Unspecified.reason_or_fallback(),
            UNEXPECTED_DELIVERY_FAILURE
        );
    }

    #[test]
    fn descriptive_rejection_is_kept() {
        assert_eq!(
            DeliveryError::Unreachable("relay unreachable".into()).reason_or_fallback(),
            "relay unreachable"
        );
        assert_eq!(
            DeliveryError::Status {
                status: 400,
                body: "The template ID is invalid".into(),
            }
            .reason()
            .as_deref(),
            Some("relay responded with status 400: The template ID is invalid")
        );
    }
}
