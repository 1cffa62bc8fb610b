// Booking session: one wizard wired to the booking backend
// Every awaited call is raced against a CancellationToken; failures are surfaced as toasts
// and never retried on the user's behalf.

use crate::api::{
    ApiError, BookingApi, BookingStatusResponse, ConfirmPaymentRequest, PaymentIntent,
    PaymentIntentMetadata, PaymentIntentRequest,
};
use crate::cancellation::CancellationToken;
use crate::flow::{BookingFlowController, BookingStep, FieldErrors, FlowError};
use crate::notify::{Notification, Notifier};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CANCEL_REASON: &str = "User cancelled before completion";
const DEFAULT_FAILURE_MESSAGE: &str = "Booking failed. Please try again.";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Request cancelled")]
    Cancelled,

    #[error("No booking has been created yet")]
    NoBooking,

    #[error("Booking {0} has already been submitted")]
    AlreadyBooked(String),

    #[error("Bookings can only be submitted from the payment step, not {0:?}")]
    NotOnPayment(BookingStep),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            max_poll_attempts: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Pending,
    Success,
    Failure,
    Unknown,
}

impl StatusClass {
    pub fn of(status: &str) -> Self {
        match status {
            "VALIDATION_PENDING" | "PENDING" | "PAYMENT_PENDING" => StatusClass::Pending,
            "CONFIRMED" | "PAID" => StatusClass::Success,
            "FAILED" | "PAYMENT_FAILED" | "CANCELLED" | "CANCELED" | "VALIDATION_FAILED"
            | "REJECTED" => StatusClass::Failure,
            _ => StatusClass::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Confirmed(BookingStatusResponse),
    Failed(BookingStatusResponse),
    // Polling budget ran out while the saga was still pending
    StillPending(BookingStatusResponse),
    Unrecognized(BookingStatusResponse),
}

async fn race<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, SessionError> {
    if cancel.is_cancelled() {
        return Err(SessionError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SessionError::Cancelled),
        result = call => result.map_err(SessionError::from),
    }
}

pub struct BookingSession<A: BookingApi> {
    flow: BookingFlowController,
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
}

impl<A: BookingApi> BookingSession<A> {
    pub fn new(api: Arc<A>, notifier: Arc<dyn Notifier>, config: SessionConfig) -> Self {
        Self {
            flow: BookingFlowController::new(),
            api,
            notifier,
            config,
        }
    }

    pub fn flow(&self) -> &BookingFlowController {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut BookingFlowController {
        &mut self.flow
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // Client secret for the external payment element
    pub async fn create_payment_intent(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<PaymentIntent, SessionError> {
        let booking = self.flow.get_booking_data()?;
        let request = PaymentIntentRequest {
            amount: booking.total_amount,
            currency: booking.currency.clone(),
            booking_type: booking.booking_type,
            metadata: PaymentIntentMetadata {
                passengers: booking.passengers.len().max(1),
                contact_email: Some(booking.contact_info.email.clone())
                    .filter(|email| !email.is_empty()),
            },
        };

        let api = Arc::clone(&self.api);
        self.flow.set_loading(true);
        let result = race(cancel, api.create_payment_intent(request)).await;
        self.flow.set_loading(false);

        result.map_err(|e| self.report_failure("Payment Failed", e))
    }

    /// Submits the assembled booking from the payment step, once per session.
    ///
    /// Details and payment are both checked, whichever way the wizard reached payment.
    /// The booking is recorded on the flow. The wizard moves to confirmation straight away
    /// only when the backend already reports a confirmed status; otherwise it stays on
    /// payment and the caller follows up with `poll_booking_status`.
    pub async fn confirm_booking(
        &mut self,
        payment_intent_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        if let Some(booking) = self.flow.state().booking.as_ref() {
            return Err(SessionError::AlreadyBooked(booking.booking_id.clone()));
        }
        if self.flow.step() != BookingStep::Payment {
            return Err(SessionError::NotOnPayment(self.flow.step()));
        }
        let errors = self.flow.check_booking_ready();
        if !errors.is_empty() {
            debug!(errors = errors.len(), "booking not ready for submission");
            self.flow.clear_errors();
            self.flow.set_errors(errors.clone());
            return Err(SessionError::Validation(errors));
        }
        self.flow.clear_errors();
        let booking_data = self.flow.get_booking_data()?;
        let request = ConfirmPaymentRequest {
            payment_intent_id: payment_intent_id.to_string(),
            booking_data,
        };

        let api = Arc::clone(&self.api);
        self.flow.set_loading(true);
        let result = race(cancel, api.confirm_payment(request)).await;
        self.flow.set_loading(false);

        let booking = result.map_err(|e| self.report_failure("Booking Failed", e))?;
        info!(
            booking_id = %booking.booking_id,
            reference = %booking.booking_reference,
            status = %booking.status,
            "booking submitted"
        );

        let confirmed = StatusClass::of(&booking.status) == StatusClass::Success;
        self.flow.record_booking(booking);
        if confirmed {
            self.flow.go_to_step(BookingStep::Confirmation);
        }
        self.notifier.notify(Notification::success(
            "Booking Created",
            "Your booking has been successfully created.",
        ));
        Ok(())
    }

    pub async fn poll_booking_status(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, SessionError> {
        let booking_id = self
            .flow
            .state()
            .booking
            .as_ref()
            .map(|booking| booking.booking_id.clone())
            .ok_or(SessionError::NoBooking)?;
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let max_attempts = self.config.max_poll_attempts.max(1);

        let mut attempt = 1;
        loop {
            let api = Arc::clone(&self.api);
            let status = race(cancel, api.get_booking_status(&booking_id))
                .await
                .map_err(|e| self.report_failure("Booking Status Unavailable", e))?;
            self.flow.record_booking_status(&status.status);
            debug!(booking_id = %booking_id, status = %status.status, attempt, "booking status polled");

            match StatusClass::of(&status.status) {
                StatusClass::Success => {
                    self.flow.go_to_step(BookingStep::Confirmation);
                    self.notifier.notify(Notification::success(
                        "Booking Confirmed",
                        &format!("Booking {} is confirmed.", status.booking_reference),
                    ));
                    return Ok(PollOutcome::Confirmed(status));
                }
                StatusClass::Failure => {
                    let message = status
                        .message
                        .clone()
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                    warn!(booking_id = %booking_id, status = %status.status, "booking failed at backend");
                    self.flow.enter_error(&message);
                    self.notifier
                        .notify(Notification::destructive("Booking Failed", &message));
                    return Ok(PollOutcome::Failed(status));
                }
                StatusClass::Unknown => {
                    warn!(booking_id = %booking_id, status = %status.status, "unrecognized booking status, polling stopped");
                    return Ok(PollOutcome::Unrecognized(status));
                }
                StatusClass::Pending if attempt >= max_attempts => {
                    return Ok(PollOutcome::StillPending(status));
                }
                StatusClass::Pending => {}
            }

            attempt += 1;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Abandons the booking and resets the wizard.
    ///
    /// Returns whether the backend acknowledged the cancellation; the flow is reset either way.
    pub async fn cancel_in_flight_booking(&mut self, cancel: &CancellationToken) -> bool {
        let booking_id = self
            .flow
            .state()
            .booking
            .as_ref()
            .map(|booking| booking.booking_id.clone());

        let acknowledged = match booking_id {
            Some(booking_id) => {
                let api = Arc::clone(&self.api);
                match race(cancel, api.cancel_booking(&booking_id, CANCEL_REASON)).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(booking_id = %booking_id, error = %e, "could not cancel booking");
                        false
                    }
                }
            }
            None => false,
        };

        self.flow.reset_flow();
        acknowledged
    }

    // Holds the current step; cancellations are silent
    fn report_failure(&mut self, title: &str, error: SessionError) -> SessionError {
        match &error {
            SessionError::Cancelled => {
                debug!(step = ?self.flow.step(), "request cancelled, result discarded");
            }
            other => {
                warn!(step = ?self.flow.step(), error = %other, "{}", title);
                self.notifier
                    .notify(Notification::destructive(title, &other.to_string()));
            }
        }
        error
    }
}
