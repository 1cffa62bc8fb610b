// Offers returned by search and selected into the booking flow

use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "VND";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Flight,
    Hotel,
    Package,
}

// Flight offers carry their price under `pricing`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub airline: String,
    pub flight_number: Option<String>,
    pub outbound: FlightSegment,
    pub inbound: Option<FlightSegment>,
    pub seat_class: Option<String>,
    pub pricing: FlightPricing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPricing {
    pub base_price: Option<Money>,
    pub taxes: Option<Money>,
    pub total_price: Money,
}

// Hotel and package offers carry their price under `price`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffer {
    pub id: String,
    pub hotel: HotelSummary,
    pub room_type: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub price: OfferPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSummary {
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub star_rating: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOffer {
    pub id: String,
    pub name: String,
    pub flight: Option<FlightOffer>,
    pub hotel: Option<HotelOffer>,
    pub price: OfferPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPrice {
    pub per_night: Option<Money>,
    pub total: Money,
}

/// The product the customer picked from search results.
///
/// The discriminant is explicit and survives serialization as `kind`, so the
/// booking type never has to be guessed from the offer's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SelectedItem {
    Flight(FlightOffer),
    Hotel(HotelOffer),
    Package(PackageOffer),
}

impl SelectedItem {
    pub fn booking_type(&self) -> BookingType {
        match self {
            SelectedItem::Flight(_) => BookingType::Flight,
            SelectedItem::Hotel(_) => BookingType::Hotel,
            SelectedItem::Package(_) => BookingType::Package,
        }
    }

    pub fn total_price(&self) -> &Money {
        match self {
            SelectedItem::Flight(offer) => &offer.pricing.total_price,
            SelectedItem::Hotel(offer) => &offer.price.total,
            SelectedItem::Package(offer) => &offer.price.total,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SelectedItem::Flight(offer) => &offer.id,
            SelectedItem::Hotel(offer) => &offer.id,
            SelectedItem::Package(offer) => &offer.id,
        }
    }
}

impl From<FlightOffer> for SelectedItem {
    fn from(offer: FlightOffer) -> Self {
        SelectedItem::Flight(offer)
    }
}

impl From<HotelOffer> for SelectedItem {
    fn from(offer: HotelOffer) -> Self {
        SelectedItem::Hotel(offer)
    }
}

impl From<PackageOffer> for SelectedItem {
    fn from(offer: PackageOffer) -> Self {
        SelectedItem::Package(offer)
    }
}

// Sample offers shared by the unit tests of several modules
#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn flight_offer(amount: f64, currency: &str) -> FlightOffer {
        FlightOffer {
            id: "FL-SGN-HAN-001".to_string(),
            airline: "Vietnam Airlines".to_string(),
            flight_number: Some("VN213".to_string()),
            outbound: FlightSegment {
                origin: "SGN".to_string(),
                destination: "HAN".to_string(),
                departure_time: "2025-06-11T08:00:00".to_string(),
                arrival_time: "2025-06-11T10:10:00".to_string(),
            },
            inbound: None,
            seat_class: Some("economy".to_string()),
            pricing: FlightPricing {
                base_price: None,
                taxes: None,
                total_price: Money::new(amount, currency),
            },
        }
    }

    pub fn hotel_offer(amount: f64, currency: &str) -> HotelOffer {
        HotelOffer {
            id: "HT-DAD-042".to_string(),
            hotel: HotelSummary {
                id: "hotel-42".to_string(),
                name: "Riverside Da Nang".to_string(),
                city: "Da Nang".to_string(),
                country: "VN".to_string(),
                star_rating: Some(4),
            },
            room_type: "Deluxe King".to_string(),
            check_in_date: "2025-06-11".to_string(),
            check_out_date: "2025-06-14".to_string(),
            price: OfferPrice {
                per_night: Some(Money::new(amount / 3.0, currency)),
                total: Money::new(amount, currency),
            },
        }
    }

    pub fn package_offer(amount: f64, currency: &str) -> PackageOffer {
        PackageOffer {
            id: "PK-007".to_string(),
            name: "Da Nang Getaway".to_string(),
            flight: Some(flight_offer(amount / 2.0, currency)),
            hotel: Some(hotel_offer(amount / 2.0, currency)),
            price: OfferPrice {
                per_night: None,
                total: Money::new(amount, currency),
            },
        }
    }
}
