//! Authentication module: session lifecycle and route gating.
//!
//! This module provides:
//! - `TokenStorage` backends (file, OS keychain, memory) holding the
//!   `access_token` / `refresh_token` pair
//! - `SessionStore`: the single writer of `SessionState`, with silent
//!   re-authentication on startup, login and logout
//! - `NavigationGuard`: gates the public login route and the protected tree
//!   on the session state it observes through a watch subscription

pub mod error;
pub mod guard;
pub mod route;
pub mod session;
pub mod storage;

pub use error::AuthError;
pub use guard::{decide, GuardDecision, History, NavigationGuard, View};
pub use route::{Route, RouteClass};
pub use session::{SessionState, SessionStore};
pub use storage::{
    CredentialPair, FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, TokenStorage,
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
