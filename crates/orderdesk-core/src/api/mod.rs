//! REST API client module for the order-management backend.
//!
//! This module provides the `ApiClient` for communicating with the backend
//! to authenticate and to read and mutate customers, orders, products, stock
//! movements, users and reports.
//!
//! Login uses HTTP Basic credentials; every other call carries the access
//! token as a bearer credential.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginCredentials, TokenRefresh, TokenResponse};
pub use error::ApiError;
