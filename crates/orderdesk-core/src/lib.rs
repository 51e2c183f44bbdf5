//! Core library for orderdesk.
//!
//! Provides the REST API client and models for the order-management backend,
//! the session store with its token storage backends, the navigation guard,
//! configuration and formatting helpers. The terminal UI lives in
//! `orderdesk-tui`.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, LoginCredentials};
pub use auth::{AuthError, NavigationGuard, Route, SessionState, SessionStore, View};
pub use config::{Config, Theme, TokenStorageKind};
