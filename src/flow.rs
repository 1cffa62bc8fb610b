// Booking wizard state machine
// selection -> details -> payment -> confirmation, with `error` as a side step that the
// user leaves explicitly through `recover`.

use crate::api::{BookingRequest, BookingResponse};
use crate::offer::{SelectedItem, DEFAULT_CURRENCY};
use crate::passenger::{
    BillingInfo, BillingUpdate, ContactInfo, ContactUpdate, PassengerCounts, PassengerInfo,
    PassengerType, PassengerUpdate, PaymentMethod,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Missing required booking data: {0}")]
    MissingBookingData(&'static str),

    #[error("Passenger index {index} out of range ({len} passengers)")]
    PassengerIndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStep {
    #[default]
    Selection,
    Details,
    Payment,
    Confirmation,
    Error,
}

impl BookingStep {
    pub const SEQUENCE: [BookingStep; 4] = [
        BookingStep::Selection,
        BookingStep::Details,
        BookingStep::Payment,
        BookingStep::Confirmation,
    ];

    // Position in the linear sequence, None for the error pseudo-step
    pub fn position(self) -> Option<usize> {
        Self::SEQUENCE.iter().position(|step| *step == self)
    }
}

// Field keys used in the errors map
pub const CONTACT_EMAIL: &str = "contact_email";
pub const CONTACT_PHONE: &str = "contact_phone";
pub const PAYMENT_METHOD: &str = "payment_method";
pub const TERMS_ACCEPTED: &str = "terms_accepted";
pub const PASSENGERS: &str = "passengers";

fn passenger_key(index: usize, field: &str) -> String {
    format!("passenger_{}_{}", index, field)
}

pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFlowState {
    pub step: BookingStep,
    pub passengers: Vec<PassengerInfo>,
    pub contact_info: Option<ContactInfo>,
    pub billing_info: Option<BillingInfo>,
    pub selected_item: Option<SelectedItem>,
    pub payment_method: Option<PaymentMethod>,
    pub total_amount: f64,
    pub currency: String,
    pub special_requests: Vec<String>,
    pub promo_code: Option<String>,
    pub terms_accepted: bool,
    pub errors: FieldErrors,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub resume_step: Option<BookingStep>,
    pub booking: Option<BookingResponse>,
}

impl Default for BookingFlowState {
    fn default() -> Self {
        Self {
            step: BookingStep::Selection,
            passengers: Vec::new(),
            contact_info: None,
            billing_info: None,
            selected_item: None,
            payment_method: None,
            total_amount: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            special_requests: Vec::new(),
            promo_code: None,
            terms_accepted: false,
            errors: FieldErrors::new(),
            is_loading: false,
            last_error: None,
            resume_step: None,
            booking: None,
        }
    }
}

/// Owns one booking wizard.
///
/// Views hold a reference to the controller and read `state()`; every mutation goes
/// through the methods below, so validation and error bookkeeping stay in one place.
#[derive(Debug, Clone, Default)]
pub struct BookingFlowController {
    state: BookingFlowState,
}

impl BookingFlowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &BookingFlowState {
        &self.state
    }

    pub fn step(&self) -> BookingStep {
        self.state.step
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.state.errors
    }

    // Blank passengers in search order: adults, children, infants
    pub fn initialize_from_search(&mut self, counts: &PassengerCounts) {
        let groups = [
            (PassengerType::Adult, counts.adults),
            (PassengerType::Child, counts.children),
            (PassengerType::Infant, counts.infants),
        ];

        self.state.passengers = groups
            .iter()
            .flat_map(|(passenger_type, count)| {
                (0..*count).map(move |_| PassengerInfo::blank(*passenger_type))
            })
            .collect();
        self.state.step = BookingStep::Details;

        debug!(passengers = self.state.passengers.len(), "booking flow initialized from search");
    }

    pub fn set_selected_item(&mut self, item: impl Into<SelectedItem>) {
        let item = item.into();
        let price = item.total_price();
        self.state.total_amount = price.amount;
        self.state.currency = price.currency.clone();

        debug!(
            item_id = item.id(),
            booking_type = ?item.booking_type(),
            total = self.state.total_amount,
            currency = %self.state.currency,
            "offer selected"
        );
        self.state.selected_item = Some(item);
    }

    pub fn update_passenger(
        &mut self,
        index: usize,
        update: PassengerUpdate,
    ) -> Result<(), FlowError> {
        let len = self.state.passengers.len();
        let passenger = self
            .state
            .passengers
            .get_mut(index)
            .ok_or(FlowError::PassengerIndexOutOfRange { index, len })?;

        update.apply_to(passenger);

        let prefix = format!("passenger_{}_", index);
        self.clear_errors_where(|key| key.starts_with(&prefix));
        Ok(())
    }

    pub fn update_contact_info(&mut self, update: ContactUpdate) {
        update.apply_to(self.state.contact_info.get_or_insert_with(ContactInfo::default));
        self.clear_errors_where(|key| key.starts_with("contact_"));
    }

    pub fn update_billing_info(&mut self, update: BillingUpdate) {
        update.apply_to(self.state.billing_info.get_or_insert_with(BillingInfo::default));
        self.clear_errors_where(|key| key.starts_with("billing_"));
    }

    pub fn update_payment_method(&mut self, payment_method: PaymentMethod) {
        self.state.payment_method = Some(payment_method);
        self.state.errors.remove(PAYMENT_METHOD);
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.state.terms_accepted = accepted;
        self.state.errors.remove(TERMS_ACCEPTED);
    }

    pub fn add_special_request(&mut self, request: &str) {
        self.state.special_requests.push(request.to_string());
    }

    pub fn remove_special_request(&mut self, index: usize) -> bool {
        if index < self.state.special_requests.len() {
            self.state.special_requests.remove(index);
            true
        } else {
            false
        }
    }

    pub fn apply_promo_code(&mut self, promo_code: &str) {
        self.state.promo_code = Some(promo_code.to_string());
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.state.is_loading = is_loading;
    }

    pub fn set_errors(&mut self, errors: FieldErrors) {
        self.state.errors.extend(errors);
    }

    pub fn clear_errors(&mut self) {
        self.state.errors.clear();
    }

    fn clear_errors_where(&mut self, matches: impl Fn(&str) -> bool) {
        self.state.errors.retain(|key, _| !matches(key.as_str()));
    }

    /// Field errors that currently block leaving this step. Does not touch state.
    pub fn check_current_step(&self) -> FieldErrors {
        self.check_step(self.state.step)
    }

    pub fn check_step(&self, step: BookingStep) -> FieldErrors {
        let mut errors = FieldErrors::new();

        match step {
            BookingStep::Details => {
                for (index, passenger) in self.state.passengers.iter().enumerate() {
                    let required = [
                        ("firstName", passenger.first_name.trim(), "First name is required"),
                        ("lastName", passenger.last_name.trim(), "Last name is required"),
                        ("dateOfBirth", passenger.date_of_birth.as_str(), "Date of birth is required"),
                        ("nationality", passenger.nationality.as_str(), "Nationality is required"),
                    ];
                    for (field, value, message) in required {
                        if value.is_empty() {
                            errors.insert(passenger_key(index, field), message.to_string());
                        }
                    }
                }

                let contact = self.state.contact_info.as_ref();
                if contact.map_or(true, |c| c.email.is_empty()) {
                    errors.insert(CONTACT_EMAIL.to_string(), "Email is required".to_string());
                }
                if contact.map_or(true, |c| c.phone.is_empty()) {
                    errors.insert(
                        CONTACT_PHONE.to_string(),
                        "Phone number is required".to_string(),
                    );
                }
            }
            BookingStep::Payment => {
                if self
                    .state
                    .payment_method
                    .as_ref()
                    .map_or(true, |method| method.method_type.is_empty())
                {
                    errors.insert(
                        PAYMENT_METHOD.to_string(),
                        "Payment method is required".to_string(),
                    );
                }
                if !self.state.terms_accepted {
                    errors.insert(
                        TERMS_ACCEPTED.to_string(),
                        "You must accept the terms and conditions".to_string(),
                    );
                }
            }
            BookingStep::Selection | BookingStep::Confirmation | BookingStep::Error => {}
        }

        errors
    }

    /// Everything a booking submission needs: filled details, at least one passenger, and
    /// a payment method with terms accepted. Does not touch state.
    pub fn check_booking_ready(&self) -> FieldErrors {
        let mut errors = self.check_step(BookingStep::Details);
        if self.state.passengers.is_empty() {
            errors.insert(
                PASSENGERS.to_string(),
                "At least one passenger is required".to_string(),
            );
        }
        errors.extend(self.check_step(BookingStep::Payment));
        errors
    }

    pub fn validate_current_step(&mut self) -> bool {
        self.state.errors = self.check_current_step();
        if !self.state.errors.is_empty() {
            debug!(step = ?self.state.step, errors = self.state.errors.len(), "step validation failed");
        }
        self.state.errors.is_empty()
    }

    pub fn next_step(&mut self) {
        if let Some(position) = self.state.step.position() {
            let next = (position + 1).min(BookingStep::SEQUENCE.len() - 1);
            self.move_to(BookingStep::SEQUENCE[next]);
        }
    }

    pub fn previous_step(&mut self) {
        if let Some(position) = self.state.step.position() {
            self.move_to(BookingStep::SEQUENCE[position.saturating_sub(1)]);
        }
    }

    pub fn go_to_step(&mut self, step: BookingStep) {
        match (self.state.step, step) {
            (BookingStep::Error, BookingStep::Error) => {}
            (_, BookingStep::Error) => self.state.resume_step = Some(self.state.step),
            (BookingStep::Error, _) => {
                self.state.resume_step = None;
                self.state.last_error = None;
            }
            _ => {}
        }
        self.move_to(step);
    }

    // Validation-gated forward move
    pub fn advance(&mut self) -> bool {
        let valid = self.validate_current_step();
        if valid {
            self.next_step();
        }
        valid
    }

    pub fn enter_error(&mut self, message: &str) {
        if self.state.step != BookingStep::Error {
            self.state.resume_step = Some(self.state.step);
        }
        self.state.last_error = Some(message.to_string());
        self.move_to(BookingStep::Error);
    }

    pub fn recover(&mut self) {
        if self.state.step != BookingStep::Error {
            return;
        }
        let resume = self.state.resume_step.take().unwrap_or_default();
        self.state.last_error = None;
        self.move_to(resume);
    }

    pub fn record_booking(&mut self, booking: BookingResponse) {
        self.state.booking = Some(booking);
    }

    // Latest status reported by polling; ignored until a booking exists
    pub fn record_booking_status(&mut self, status: &str) {
        if let Some(booking) = self.state.booking.as_mut() {
            booking.status = status.to_string();
        }
    }

    pub fn reset_flow(&mut self) {
        debug!("booking flow reset");
        self.state = BookingFlowState::default();
    }

    fn move_to(&mut self, step: BookingStep) {
        if self.state.step != step {
            debug!(from = ?self.state.step, to = ?step, "booking step changed");
            self.state.step = step;
        }
    }

    pub fn get_booking_data(&self) -> Result<BookingRequest, FlowError> {
        let item = self
            .state
            .selected_item
            .as_ref()
            .ok_or(FlowError::MissingBookingData("selected item"))?;
        let contact_info = self
            .state
            .contact_info
            .clone()
            .ok_or(FlowError::MissingBookingData("contact info"))?;

        let (flight_offer, hotel_offer, package_offer) = match item {
            SelectedItem::Flight(offer) => (Some(offer.clone()), None, None),
            SelectedItem::Hotel(offer) => (None, Some(offer.clone()), None),
            SelectedItem::Package(offer) => (None, None, Some(offer.clone())),
        };

        Ok(BookingRequest {
            booking_type: item.booking_type(),
            flight_offer,
            hotel_offer,
            package_offer,
            passengers: self.state.passengers.clone(),
            contact_info,
            billing_info: self.state.billing_info.clone(),
            special_requests: self.state.special_requests.clone(),
            payment_method: self.state.payment_method.clone().unwrap_or_default(),
            total_amount: self.state.total_amount,
            currency: self.state.currency.clone(),
            promo_code: self.state.promo_code.clone(),
            terms_accepted: self.state.terms_accepted,
        })
    }
}
