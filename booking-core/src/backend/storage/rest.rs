//! # REST Backend
//!
//! JSON-over-HTTP client for the activity center booking backend.
//!
//! ## Endpoints
//!
//! ```text
//! GET  {base}/students/{studentId}/slots?page&pageSize[&startDate&endDate]
//! GET  {base}/students/{studentId}/reservations[?upcomingOnly=true]
//! GET  {base}/students/{studentId}/subscriptions
//! POST {base}/bookings
//! POST {base}/bookings/bulk
//! ```
//!
//! Non-2xx responses become errors carrying the server's `message` when the
//! body has one, the raw body otherwise, and the HTTP status as a last resort.
//! Transport timeouts come from `request_timeout_secs`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{
    BookManyResponse, BookOneResponse, BookSlotRequest, BulkBookingRequest, DateRangeQuery, ErrorBody,
    ReservationListResponse, SlotPage, SubscriptionRow,
};

use super::traits::{BookingSink, Connection, ReservationSource, SlotSource, SubscriptionSource};
use crate::config::BookingConfig;

#[derive(Clone)]
pub struct RestConnection {
    client: Client,
    base_url: Url,
}

impl RestConnection {
    pub fn new(config: &BookingConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url())
            .with_context(|| format!("Invalid api_base_url '{}'", config.api_base_url))?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended with path segments, each percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("api_base_url cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        read_json(response).await
    }
}

/// Query parameters of the slot listing
pub fn slot_query(page: u32, page_size: u32, date_range: Option<&DateRangeQuery>) -> Vec<(&'static str, String)> {
    let mut query = vec![("page", page.to_string()), ("pageSize", page_size.to_string())];
    if let Some(range) = date_range {
        query.push(("startDate", range.start_date.clone()));
        query.push(("endDate", range.end_date.clone()));
    }
    query
}

/// User-facing text for a failed response
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.display_message().map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Request failed with HTTP {}", status))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("Failed to parse backend response");
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!("{}", error_message(status, &body)))
}

impl Connection for RestConnection {
    type SlotRepository = RestSlotRepository;
    type ReservationRepository = RestReservationRepository;
    type SubscriptionRepository = RestSubscriptionRepository;
    type BookingRepository = RestBookingRepository;

    fn create_slot_repository(&self) -> Self::SlotRepository {
        RestSlotRepository { connection: self.clone() }
    }

    fn create_reservation_repository(&self) -> Self::ReservationRepository {
        RestReservationRepository { connection: self.clone() }
    }

    fn create_subscription_repository(&self) -> Self::SubscriptionRepository {
        RestSubscriptionRepository { connection: self.clone() }
    }

    fn create_booking_repository(&self) -> Self::BookingRepository {
        RestBookingRepository { connection: self.clone() }
    }
}

#[derive(Clone)]
pub struct RestSlotRepository {
    connection: RestConnection,
}

#[async_trait]
impl SlotSource for RestSlotRepository {
    async fn list_available_slots(
        &self,
        student_id: &str,
        page: u32,
        page_size: u32,
        date_range: Option<&DateRangeQuery>,
    ) -> Result<SlotPage> {
        let url = self.connection.endpoint(&["students", student_id, "slots"])?;
        self.connection
            .get_json(url, &slot_query(page, page_size, date_range))
            .await
    }
}

#[derive(Clone)]
pub struct RestReservationRepository {
    connection: RestConnection,
}

#[async_trait]
impl ReservationSource for RestReservationRepository {
    async fn list_reservations(&self, student_id: &str, upcoming_only: bool) -> Result<ReservationListResponse> {
        let url = self.connection.endpoint(&["students", student_id, "reservations"])?;
        let query = if upcoming_only {
            vec![("upcomingOnly", "true".to_string())]
        } else {
            Vec::new()
        };
        self.connection.get_json(url, &query).await
    }
}

#[derive(Clone)]
pub struct RestSubscriptionRepository {
    connection: RestConnection,
}

#[async_trait]
impl SubscriptionSource for RestSubscriptionRepository {
    async fn list_subscriptions(&self, student_id: &str) -> Result<Vec<SubscriptionRow>> {
        let url = self.connection.endpoint(&["students", student_id, "subscriptions"])?;
        self.connection.get_json(url, &[]).await
    }
}

#[derive(Clone)]
pub struct RestBookingRepository {
    connection: RestConnection,
}

#[async_trait]
impl BookingSink for RestBookingRepository {
    async fn book_one(&self, request: &BookSlotRequest) -> Result<BookOneResponse> {
        let url = self.connection.endpoint(&["bookings"])?;
        self.connection.post_json(url, request).await
    }

    async fn book_many(&self, request: &BulkBookingRequest) -> Result<BookManyResponse> {
        let url = self.connection.endpoint(&["bookings", "bulk"])?;
        self.connection.post_json(url, request).await
    }
}
