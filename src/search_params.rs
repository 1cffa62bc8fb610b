// Search criteria mirrored into the page URL for deep links

use crate::passenger::PassengerCounts;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const MAX_PER_GROUP: u32 = 9;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum SearchParamsError {
    #[error("Query string encoding failed: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeatClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl SeatClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SeatClass::Economy => "economy",
            SeatClass::PremiumEconomy => "premium-economy",
            SeatClass::Business => "business",
            SeatClass::First => "first",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "economy" => Some(SeatClass::Economy),
            "premium-economy" => Some(SeatClass::PremiumEconomy),
            "business" => Some(SeatClass::Business),
            "first" => Some(SeatClass::First),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    OneWay,
    #[default]
    RoundTrip,
}

impl TripType {
    pub fn as_str(self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "one-way" => Some(TripType::OneWay),
            "round-trip" => Some(TripType::RoundTrip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: PassengerCounts,
    pub seat_class: SeatClass,
    pub trip_type: TripType,
}

impl SearchCriteria {
    // Keys: from, to, depart, return, adults, children, infants, class, type
    pub fn to_query_string(&self) -> Result<String, SearchParamsError> {
        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(9);

        if !self.origin.is_empty() {
            pairs.push(("from", self.origin.clone()));
        }
        if !self.destination.is_empty() {
            pairs.push(("to", self.destination.clone()));
        }
        if let Some(date) = self.departure_date {
            pairs.push(("depart", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(date) = self.return_date {
            pairs.push(("return", date.format(DATE_FORMAT).to_string()));
        }
        pairs.push(("adults", self.passengers.adults.to_string()));
        pairs.push(("children", self.passengers.children.to_string()));
        pairs.push(("infants", self.passengers.infants.to_string()));
        pairs.push(("class", self.seat_class.as_str().to_string()));
        pairs.push(("type", self.trip_type.as_str().to_string()));

        Ok(serde_urlencoded::to_string(pairs)?)
    }

    /// Lenient decode of a deep link.
    ///
    /// Anything missing, unknown or malformed falls back to the defaults (one adult,
    /// economy, round trip). Head counts are clamped to 1..=9 adults and 0..=9 children
    /// and infants. A leading `?` is accepted.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params: HashMap<String, String> =
            serde_urlencoded::from_str(query).unwrap_or_default();

        let get = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let count = |key: &str, min: u32, default: u32| {
            get(key)
                .and_then(|v| {
                    // Overlong digit strings saturate rather than fall back
                    v.parse::<u64>()
                        .ok()
                        .or_else(|| v.bytes().all(|b| b.is_ascii_digit()).then_some(u64::MAX))
                })
                .map_or(default, |n| n.clamp(u64::from(min), u64::from(MAX_PER_GROUP)) as u32)
        };
        let date = |key: &str| get(key).and_then(|v| NaiveDate::parse_from_str(v, DATE_FORMAT).ok());

        let defaults = PassengerCounts::default();
        Self {
            origin: get("from").unwrap_or_default().to_string(),
            destination: get("to").unwrap_or_default().to_string(),
            departure_date: date("depart"),
            return_date: date("return"),
            passengers: PassengerCounts {
                adults: count("adults", 1, defaults.adults),
                children: count("children", 0, defaults.children),
                infants: count("infants", 0, defaults.infants),
            },
            seat_class: get("class").and_then(SeatClass::parse).unwrap_or_default(),
            trip_type: get("type").and_then(TripType::parse).unwrap_or_default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        let Some(departure) = self.departure_date else {
            return false;
        };
        if self.origin.is_empty() || self.destination.is_empty() {
            return false;
        }
        match self.trip_type {
            TripType::OneWay => true,
            TripType::RoundTrip => self.return_date.map_or(false, |back| back >= departure),
        }
    }

    pub fn to_booking_search(&self) -> PassengerCounts {
        self.passengers
    }
}
