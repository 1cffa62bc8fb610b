// Booking backend client
// The wizard never prices or books anything itself; every business decision is made
// by the booking service behind these endpoints.

use crate::offer::{BookingType, FlightOffer, HotelOffer, PackageOffer};
use crate::passenger::{BillingInfo, ContactInfo, PassengerInfo, PaymentMethod};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

// Error types for backend calls
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError {
        status_code: u16,
        message: String,
        is_retryable: bool,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    // Whether a user-initiated retry has a chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::NetworkError(_) | ApiError::Timeout(_) => true,
            ApiError::ApiResponseError { is_retryable, .. } => *is_retryable,
            ApiError::InvalidResponse(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            auth_token: None,
            timeout_ms: 30000,
            user_agent: concat!("travel_booking_flow/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    // Missing keys fall back to the defaults above
    pub fn from_json_str(json: &str) -> Result<Self, ClientError> {
        serde_json::from_str(json).map_err(|e| ClientError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_timeout: usize,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

impl ClientStats {
    fn record(&mut self, elapsed: Duration, outcome: &Result<(), &ApiError>) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        self.requests_sent += 1;
        match outcome {
            Ok(()) => self.requests_succeeded += 1,
            Err(ApiError::Timeout(_)) => {
                self.requests_failed += 1;
                self.requests_timeout += 1;
            }
            Err(_) => self.requests_failed += 1,
        }

        let count = self.requests_sent as f64;
        self.average_response_time_ms += (elapsed_ms - self.average_response_time_ms) / count;
        self.max_response_time_ms = self.max_response_time_ms.max(elapsed_ms);
    }
}

// Full booking payload assembled by the flow controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub booking_type: BookingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_offer: Option<FlightOffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_offer: Option<HotelOffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_offer: Option<PackageOffer>,
    pub passengers: Vec<PassengerInfo>,
    pub contact_info: ContactInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_info: Option<BillingInfo>,
    pub special_requests: Vec<String>,
    pub payment_method: PaymentMethod,
    pub total_amount: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub terms_accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: String,
    pub booking_reference: String,
    pub status: String,
    pub saga_state: Option<String>,
    pub total_amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub amount: f64,
    pub currency: String,
    pub booking_type: BookingType,
    pub metadata: PaymentIntentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentMetadata {
    pub passengers: usize,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
    pub booking_data: BookingRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusResponse {
    pub booking_id: String,
    pub booking_reference: String,
    pub status: String,
    pub last_updated: DateTime<Utc>,
    pub message: Option<String>,
}

#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    // Ask the payment provider for a client secret covering the booking total
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError>;

    // Confirm the payment and hand the booking to the saga orchestrator
    async fn confirm_payment(
        &self,
        request: ConfirmPaymentRequest,
    ) -> Result<BookingResponse, ApiError>;

    async fn get_booking_status(&self, booking_id: &str)
        -> Result<BookingStatusResponse, ApiError>;

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> Result<(), ApiError>;

    fn stats(&self) -> ClientStats;
}

const BOOKINGS_PATH: [&str; 2] = ["api", "bookings"];

pub struct HttpBookingClient {
    http: reqwest::Client,
    config: ClientConfig,
    base_url: Url,
    stats: Arc<Mutex<ClientStats>>,
}

impl HttpBookingClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::ConfigError(format!("invalid base_url: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            base_url,
            stats: Arc::new(Mutex::new(ClientStats::default())),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Each segment is percent-encoded, so ids never change the route
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) base URLs always have path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(BOOKINGS_PATH).extend(segments);
        }
        url
    }

    // Sends the request and turns any non-2xx status into an ApiError
    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let started = Instant::now();
        let result = self.send(request).await;
        self.stats
            .lock()
            .record(started.elapsed(), &result.as_ref().map(|_| ()));
        result
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.config.timeout_ms)
            } else {
                ApiError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ApiError::ApiResponseError {
            status_code: status.as_u16(),
            message,
            is_retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        })
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl BookingApi for HttpBookingClient {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        debug!(amount = request.amount, currency = %request.currency, "creating payment intent");
        let intent: PaymentIntent = self
            .execute_json(self.http.post(self.url(&["payment-intent"])).json(&request))
            .await?;
        info!(payment_intent_id = %intent.payment_intent_id, "payment intent created");
        Ok(intent)
    }

    async fn confirm_payment(
        &self,
        request: ConfirmPaymentRequest,
    ) -> Result<BookingResponse, ApiError> {
        debug!(payment_intent_id = %request.payment_intent_id, "confirming payment");
        let booking: BookingResponse = self
            .execute_json(self.http.post(self.url(&["confirm-payment"])).json(&request))
            .await?;
        info!(
            booking_id = %booking.booking_id,
            reference = %booking.booking_reference,
            status = %booking.status,
            "booking created"
        );
        Ok(booking)
    }

    async fn get_booking_status(
        &self,
        booking_id: &str,
    ) -> Result<BookingStatusResponse, ApiError> {
        let url = self.url(&["storefront", booking_id, "status"]);
        self.execute_json(self.http.get(url)).await
    }

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> Result<(), ApiError> {
        let url = self.url(&["commands", booking_id, "cancel"]);
        let request = self.http.post(url).query(&[("reason", reason)]);
        match self.execute(request).await {
            Ok(_) => {
                info!(booking_id, "booking cancelled");
                Ok(())
            }
            Err(e) => {
                warn!(booking_id, error = %e, "booking cancellation failed");
                Err(e)
            }
        }
    }

    fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }
}

// In-memory booking backend for session tests
#[cfg(test)]
pub mod mock_server {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    pub struct MockBookingServer {
        request_count: AtomicUsize,
        fail_next_requests: AtomicUsize,
        delay_ms: AtomicUsize,
        outage: std::sync::atomic::AtomicBool,
        statuses: AsyncMutex<VecDeque<BookingStatusResponse>>,
        confirmed: AsyncMutex<Vec<ConfirmPaymentRequest>>,
        intents: AsyncMutex<Vec<PaymentIntentRequest>>,
        cancelled: AsyncMutex<Vec<(String, String)>>,
        stats: Mutex<ClientStats>,
    }

    impl MockBookingServer {
        pub fn new() -> Self {
            Self {
                request_count: AtomicUsize::new(0),
                fail_next_requests: AtomicUsize::new(0),
                delay_ms: AtomicUsize::new(0),
                outage: std::sync::atomic::AtomicBool::new(false),
                statuses: AsyncMutex::new(VecDeque::new()),
                confirmed: AsyncMutex::new(Vec::new()),
                intents: AsyncMutex::new(Vec::new()),
                cancelled: AsyncMutex::new(Vec::new()),
                stats: Mutex::new(ClientStats::default()),
            }
        }

        pub fn set_delay(&self, delay_ms: usize) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        pub fn set_outage(&self, outage: bool) {
            self.outage.store(outage, Ordering::SeqCst);
        }

        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        // Statuses are handed out in order, the last one repeats
        pub async fn push_status(&self, booking_id: &str, status: &str, message: Option<&str>) {
            self.statuses.lock().await.push_back(BookingStatusResponse {
                booking_id: booking_id.to_string(),
                booking_reference: format!("REF-{}", booking_id),
                status: status.to_string(),
                last_updated: Utc::now(),
                message: message.map(str::to_string),
            });
        }

        pub async fn confirmed_requests(&self) -> Vec<ConfirmPaymentRequest> {
            self.confirmed.lock().await.clone()
        }

        pub async fn intent_requests(&self) -> Vec<PaymentIntentRequest> {
            self.intents.lock().await.clone()
        }

        pub async fn cancelled_bookings(&self) -> Vec<(String, String)> {
            self.cancelled.lock().await.clone()
        }

        async fn simulate(&self) -> Result<(), ApiError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);

            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            let result = if self.outage.load(Ordering::SeqCst) {
                Err(ApiError::NetworkError("Service unavailable".to_string()))
            } else if self.fail_next_requests.load(Ordering::SeqCst) > 0 {
                self.fail_next_requests.fetch_sub(1, Ordering::SeqCst);
                Err(ApiError::ApiResponseError {
                    status_code: 500,
                    message: "Internal Server Error".to_string(),
                    is_retryable: true,
                })
            } else {
                Ok(())
            };

            self.stats
                .lock()
                .record(Duration::from_millis(delay as u64), &result.as_ref().copied());
            result
        }
    }

    #[async_trait]
    impl BookingApi for MockBookingServer {
        async fn create_payment_intent(
            &self,
            request: PaymentIntentRequest,
        ) -> Result<PaymentIntent, ApiError> {
            self.simulate().await?;
            let id = format!("pi_{}", rand::random::<u32>());
            let intent = PaymentIntent {
                client_secret: format!("{}_secret", id),
                payment_intent_id: id,
                amount: request.amount,
                currency: request.currency.clone(),
                status: "requires_payment_method".to_string(),
            };
            self.intents.lock().await.push(request);
            Ok(intent)
        }

        async fn confirm_payment(
            &self,
            request: ConfirmPaymentRequest,
        ) -> Result<BookingResponse, ApiError> {
            self.simulate().await?;
            let booking_id = format!("booking-{}", rand::random::<u32>());
            let response = BookingResponse {
                booking_reference: format!("BK{}", rand::random::<u16>()),
                booking_id,
                status: "PAYMENT_PENDING".to_string(),
                saga_state: Some("PAYMENT_PENDING".to_string()),
                total_amount: request.booking_data.total_amount,
                currency: request.booking_data.currency.clone(),
                created_at: Utc::now(),
            };
            self.confirmed.lock().await.push(request);
            Ok(response)
        }

        async fn get_booking_status(
            &self,
            booking_id: &str,
        ) -> Result<BookingStatusResponse, ApiError> {
            self.simulate().await?;
            let mut statuses = self.statuses.lock().await;
            let next = if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            };
            next.map(|mut status| {
                status.booking_id = booking_id.to_string();
                status
            })
            .ok_or_else(|| ApiError::ApiResponseError {
                status_code: 404,
                message: format!("Booking {} not found", booking_id),
                is_retryable: false,
            })
        }

        async fn cancel_booking(&self, booking_id: &str, reason: &str) -> Result<(), ApiError> {
            self.simulate().await?;
            self.cancelled
                .lock()
                .await
                .push((booking_id.to_string(), reason.to_string()));
            Ok(())
        }

        fn stats(&self) -> ClientStats {
            self.stats.lock().clone()
        }
    }
}
