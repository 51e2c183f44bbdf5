//! API client for communicating with the order-management REST API.
//!
//! This module provides the `ApiClient` struct for authenticating and for
//! making bearer-authenticated requests against the resource endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    CancelRequest, Customer, CustomerCreate, CustomerRevenueReport, CustomerUpdate,
    DashboardReport, NoteCreate, Order, OrderCreate, PaymentCreate, Product, ProductCreate,
    ProductUpdate, StatusCreate, StockMovement, StockMovementCreate, StockReport, User,
    UserCreate, UserUpdate,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Username/password pair sent to `POST /auth/login`
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response body of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Response body of `POST /auth/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefresh {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// API client for the order-management backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Bearer token this client sends, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Access token is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    // ===== Authentication =====

    /// Exchange a username/password pair for a token pair.
    ///
    /// Credentials travel in the Basic `Authorization` header; the body is empty.
    /// No retry is attempted on any failure.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenResponse> {
        let url = self.url("/auth/login");
        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRefresh> {
        let url = self.url("/auth/refresh");
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    /// Fetch the profile of the user owning the bearer token
    pub async fn fetch_profile(&self) -> Result<User> {
        self.get("/users/me/profile").await
    }

    // ===== Request plumbing =====

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Read the body and decode it, keeping decode failures apart from transport failures
    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
                .into()
        })
    }

    /// Send a request built by `build`, backing off on 429
    async fn execute<F>(&self, url: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build(&self.client)
                .headers(self.auth_headers()?)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.execute(&url, |c| c.get(&url)).await?;
        Self::parse_json(response, &url).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.execute(&url, |c| c.get(&url).query(query)).await?;
        Self::parse_json(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.execute(&url, |c| c.post(&url).json(body)).await?;
        Self::parse_json(response, &url).await
    }

    /// POST whose response body is not needed
    async fn post_discard<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        self.execute(&url, |c| c.post(&url).json(body)).await?;
        Ok(())
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "PATCH");
        let response = self.execute(&url, |c| c.patch(&url).json(body)).await?;
        Self::parse_json(response, &url).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");
        self.execute(&url, |c| c.delete(&url)).await?;
        Ok(())
    }

    // ===== Customers =====

    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.get("/customers/").await
    }

    pub async fn get_customer(&self, id: i64) -> Result<Customer> {
        self.get(&format!("/customers/{}", id)).await
    }

    pub async fn create_customer(&self, data: &CustomerCreate) -> Result<Customer> {
        self.post("/customers/", data).await
    }

    pub async fn update_customer(&self, id: i64, data: &CustomerUpdate) -> Result<Customer> {
        self.patch(&format!("/customers/{}", id), data).await
    }

    pub async fn add_customer_status(&self, customer_id: i64, status: &str) -> Result<()> {
        let body = StatusCreate { status: status.to_string() };
        self.post_discard(&format!("/customers/{}/statuses", customer_id), &body).await
    }

    pub async fn remove_customer_status(&self, customer_id: i64, status_id: i64) -> Result<()> {
        self.delete(&format!("/customers/{}/statuses/{}", customer_id, status_id)).await
    }

    pub async fn add_customer_note(&self, customer_id: i64, note: &str) -> Result<()> {
        let body = NoteCreate { note: note.to_string() };
        self.post_discard(&format!("/customers/{}/notes", customer_id), &body).await
    }

    pub async fn delete_customer_note(&self, customer_id: i64, note_id: i64) -> Result<()> {
        self.delete(&format!("/customers/{}/notes/{}", customer_id, note_id)).await
    }

    // ===== Orders =====

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.get("/orders/").await
    }

    pub async fn get_order(&self, id: i64) -> Result<Order> {
        self.get(&format!("/orders/{}", id)).await
    }

    pub async fn create_order(&self, data: &OrderCreate) -> Result<Order> {
        self.post("/orders/", data).await
    }

    pub async fn deliver_order(&self, id: i64) -> Result<Order> {
        self.post(&format!("/orders/{}/deliver", id), &serde_json::json!({})).await
    }

    pub async fn cancel_order(&self, id: i64, reason: &str) -> Result<Order> {
        let body = CancelRequest { cancellation_reason: reason.to_string() };
        self.post(&format!("/orders/{}/cancel", id), &body).await
    }

    pub async fn add_payment(&self, order_id: i64, data: &PaymentCreate) -> Result<()> {
        self.post_discard(&format!("/orders/{}/payments", order_id), data).await
    }

    pub async fn add_order_note(&self, order_id: i64, note: &str) -> Result<()> {
        let body = NoteCreate { note: note.to_string() };
        self.post_discard(&format!("/orders/{}/notes", order_id), &body).await
    }

    pub async fn delete_order_note(&self, order_id: i64, note_id: i64) -> Result<()> {
        self.delete(&format!("/orders/{}/notes/{}", order_id, note_id)).await
    }

    // ===== Products =====

    /// List products, optionally only active (`Some(true)`) or inactive ones
    pub async fn list_products(&self, is_active: Option<bool>) -> Result<Vec<Product>> {
        match is_active {
            Some(active) => self.get_with_query("/products/", &[("is_active", active)]).await,
            None => self.get("/products/").await,
        }
    }

    pub async fn get_product(&self, id: i64) -> Result<Product> {
        self.get(&format!("/products/{}", id)).await
    }

    pub async fn create_product(&self, data: &ProductCreate) -> Result<Product> {
        self.post("/products/", data).await
    }

    pub async fn update_product(&self, id: i64, data: &ProductUpdate) -> Result<Product> {
        self.patch(&format!("/products/{}", id), data).await
    }

    // ===== Stock movements =====

    pub async fn list_stock_movements(&self, product_id: Option<i64>) -> Result<Vec<StockMovement>> {
        match product_id {
            Some(id) => self.get_with_query("/stock-movements/", &[("product_id", id)]).await,
            None => self.get("/stock-movements/").await,
        }
    }

    pub async fn create_stock_movement(&self, data: &StockMovementCreate) -> Result<StockMovement> {
        self.post("/stock-movements/", data).await
    }

    // ===== Users =====

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get("/users/").await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.get(&format!("/users/{}", id)).await
    }

    pub async fn create_user(&self, data: &UserCreate) -> Result<User> {
        self.post("/users/", data).await
    }

    pub async fn update_user(&self, id: i64, data: &UserUpdate) -> Result<User> {
        self.patch(&format!("/users/{}", id), data).await
    }

    // ===== Reports =====

    pub async fn dashboard_report(&self) -> Result<DashboardReport> {
        self.get("/reports/dashboard").await
    }

    pub async fn customer_revenue_report(&self) -> Result<Vec<CustomerRevenueReport>> {
        self.get("/reports/customer-revenue").await
    }

    pub async fn stock_report(&self) -> Result<Vec<StockReport>> {
        self.get("/reports/stock").await
    }
}
