// Traveller, contact, billing and payment records filled in by the wizard

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    Adult,
    Child,
    Infant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Title {
    #[default]
    Mr,
    Mrs,
    Ms,
    Dr,
}

// Head count carried over from the search form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl Default for PassengerCounts {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerInfo {
    #[serde(rename = "type")]
    pub passenger_type: PassengerType,
    pub title: Title,
    pub first_name: String,
    pub last_name: String,
    // YYYY-MM-DD, kept as typed until submission
    pub date_of_birth: String,
    pub nationality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_requests: Vec<String>,
}

impl PassengerInfo {
    pub fn blank(passenger_type: PassengerType) -> Self {
        Self {
            passenger_type,
            title: Title::Mr,
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: String::new(),
            nationality: String::new(),
            passport_number: None,
            passport_expiry: None,
            special_requests: Vec::new(),
        }
    }
}

// Partial update for a single passenger, only `Some` fields are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassengerUpdate {
    pub title: Option<Title>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<String>,
    pub special_requests: Option<Vec<String>>,
}

impl PassengerUpdate {
    pub fn apply_to(self, passenger: &mut PassengerInfo) {
        if let Some(title) = self.title {
            passenger.title = title;
        }
        if let Some(first_name) = self.first_name {
            passenger.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            passenger.last_name = last_name;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            passenger.date_of_birth = date_of_birth;
        }
        if let Some(nationality) = self.nationality {
            passenger.nationality = nationality;
        }
        if self.passport_number.is_some() {
            passenger.passport_number = self.passport_number;
        }
        if self.passport_expiry.is_some() {
            passenger.passport_expiry = self.passport_expiry;
        }
        if let Some(special_requests) = self.special_requests {
            passenger.special_requests = special_requests;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactUpdate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub alternate_phone: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

impl ContactUpdate {
    pub fn apply_to(self, contact: &mut ContactInfo) {
        if let Some(email) = self.email {
            contact.email = email;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        if let Some(country_code) = self.country_code {
            contact.country_code = country_code;
        }
        if self.alternate_phone.is_some() {
            contact.alternate_phone = self.alternate_phone;
        }
        if self.emergency_contact.is_some() {
            contact.emergency_contact = self.emergency_contact;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingInfo {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address: Option<Address>,
    pub tax_id: Option<String>,
}

impl BillingUpdate {
    pub fn apply_to(self, billing: &mut BillingInfo) {
        if let Some(first_name) = self.first_name {
            billing.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            billing.last_name = last_name;
        }
        if self.company.is_some() {
            billing.company = self.company;
        }
        if let Some(address) = self.address {
            billing.address = address;
        }
        if self.tax_id.is_some() {
            billing.tax_id = self.tax_id;
        }
    }
}

pub const DEFAULT_PAYMENT_METHOD: &str = "stripe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PaymentMethod {
    pub fn new(method_type: &str) -> Self {
        Self {
            method_type: method_type.to_string(),
            details: None,
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_METHOD)
    }
}
