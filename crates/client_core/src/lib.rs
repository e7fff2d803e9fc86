use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use relay_integration::{DeliveryGateway, DeliveryReceipt, MissingDeliveryGateway};
use shared::{
    domain::{FieldErrors, Recipient, SubmissionRequest, SubmissionStatus, ValidationResult},
    error::DeliveryError,
    protocol::DeliveryMessage,
};
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

mod validation;

pub use validation::{is_valid_email, validate};

pub const AUTO_RESET_DELAY: Duration = Duration::from_secs(8);
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    StatusChanged(SubmissionStatus),
    FieldErrorsChanged(FieldErrors),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission rejected: {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
    #[error("a submission is already pending")]
    InFlight,
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Drives one contact form: validation, a single relay hand-off per attempt,
/// and the status shown to the visitor.
pub struct SubmissionController {
    gateway: Arc<dyn DeliveryGateway>,
    recipient: Recipient,
    auto_reset_delay: Duration,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<SubmissionEvent>,
}

#[derive(Default)]
struct ControllerState {
    status: SubmissionStatus,
    /// Bumped on every status transition; a reset only applies to the
    /// generation that scheduled it.
    generation: u64,
    field_errors: FieldErrors,
    draft: SubmissionRequest,
    reset_timer: Option<JoinHandle<()>>,
}

impl SubmissionController {
    pub fn new(gateway: Arc<dyn DeliveryGateway>, recipient: Recipient) -> Arc<Self> {
        Self::new_with_auto_reset_delay(gateway, recipient, AUTO_RESET_DELAY)
    }

    pub fn new_with_auto_reset_delay(
        gateway: Arc<dyn DeliveryGateway>,
        recipient: Recipient,
        auto_reset_delay: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            gateway,
            recipient,
            auto_reset_delay,
            inner: Mutex::new(ControllerState::default()),
            events,
        })
    }

    pub fn unconfigured(recipient: Recipient) -> Arc<Self> {
        Self::new(Arc::new(MissingDeliveryGateway), recipient)
    }

    pub fn status(&self) -> SubmissionStatus {
        self.state().status.clone()
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.state().field_errors.clone()
    }

    /// Values of the last dispatched attempt. Kept after a failure so the
    /// visitor can correct and resend, cleared after a success.
    pub fn draft(&self) -> SubmissionRequest {
        self.state().draft.clone()
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    pub fn check(&self, request: &SubmissionRequest) -> ValidationResult {
        let result = validate(request);
        let mut state = self.state();
        let errors = result.errors().cloned().unwrap_or_default();
        self.record_field_errors(&mut state, errors);
        result
    }

    pub async fn submit(
        self: &Arc<Self>,
        request: SubmissionRequest,
    ) -> Result<DeliveryReceipt, SubmitError> {
        let message = {
            let mut state = self.state();

            if let ValidationResult::Invalid(errors) = validate(&request) {
                info!(
                    fields = ?errors.fields().collect::<Vec<_>>(),
                    "contact: submission blocked by invalid fields"
                );
                self.record_field_errors(&mut state, errors.clone());
                return Err(SubmitError::Invalid(errors));
            }

            if state.status.is_pending() {
                warn!("contact: submission ignored while another is pending");
                return Err(SubmitError::InFlight);
            }

            self.record_field_errors(&mut state, FieldErrors::default());
            let message = DeliveryMessage::compose(&request, &self.recipient);
            state.draft = request;
            self.transition(&mut state, SubmissionStatus::Pending);
            message
        };

        let outcome = self.gateway.deliver(message).await;

        let mut state = self.state();
        match outcome {
            Ok(receipt) => {
                info!(
                    attempt_id = %receipt.attempt_id,
                    status = receipt.status,
                    "contact: message handed to relay"
                );
                state.draft = SubmissionRequest::default();
                self.transition(&mut state, SubmissionStatus::Succeeded);
                self.schedule_auto_reset(&mut state);
                Ok(receipt)
            }
            Err(err) => {
                let reason = err.reason_or_fallback();
                warn!("contact: delivery failed: {err}");
                self.transition(&mut state, SubmissionStatus::failed(reason));
                self.schedule_auto_reset(&mut state);
                Err(SubmitError::Delivery(err))
            }
        }
    }

    pub fn dismiss(&self) -> bool {
        let mut state = self.state();
        if !state.status.is_settled() {
            return false;
        }
        self.transition(&mut state, SubmissionStatus::Idle);
        true
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, state: &mut ControllerState, status: SubmissionStatus) {
        if let Some(timer) = state.reset_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.status = status.clone();
        debug!(
            status = status.name(),
            generation = state.generation,
            "contact: status changed"
        );
        let _ = self.events.send(SubmissionEvent::StatusChanged(status));
    }

    fn record_field_errors(&self, state: &mut ControllerState, errors: FieldErrors) {
        if state.field_errors == errors {
            return;
        }
        state.field_errors = errors.clone();
        let _ = self.events.send(SubmissionEvent::FieldErrorsChanged(errors));
    }

    fn schedule_auto_reset(self: &Arc<Self>, state: &mut ControllerState) {
        let generation = state.generation;
        let delay = self.auto_reset_delay;
        let controller: Weak<Self> = Arc::downgrade(self);
        state.reset_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(controller) = controller.upgrade() {
                controller.auto_reset(generation);
            }
        }));
    }

    fn auto_reset(&self, generation: u64) {
        let mut state = self.state();
        if state.generation != generation || !state.status.is_settled() {
            return;
        }
        // The running timer is this task; drop the handle instead of aborting it.
        state.reset_timer = None;
        debug!(generation, "contact: auto-reset");
        self.transition(&mut state, SubmissionStatus::Idle);
    }
}

impl Drop for SubmissionController {
    fn drop(&mut self) {
        let state = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.reset_timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
