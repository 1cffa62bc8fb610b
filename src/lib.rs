// Storefront booking wizard and its booking backend client

pub mod api;
pub mod cancellation;
pub mod flow;
pub mod notify;
pub mod offer;
pub mod passenger;
pub mod search_params;
pub mod session;

// Re-export key types for convenience
pub use api::{
    ApiError, BookingApi, BookingRequest, BookingResponse, BookingStatusResponse, ClientConfig,
    ClientError, ClientStats, HttpBookingClient, PaymentIntent,
};
pub use cancellation::CancellationToken;
pub use flow::{BookingFlowController, BookingFlowState, BookingStep, FieldErrors, FlowError};
pub use notify::{Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier};
pub use offer::{BookingType, FlightOffer, HotelOffer, Money, PackageOffer, SelectedItem};
pub use passenger::{
    BillingInfo, BillingUpdate, ContactInfo, ContactUpdate, PassengerCounts, PassengerInfo,
    PassengerType, PassengerUpdate, PaymentMethod, Title,
};
pub use search_params::{SearchCriteria, SearchParamsError, SeatClass, TripType};
pub use session::{BookingSession, PollOutcome, SessionConfig, SessionError, StatusClass};
