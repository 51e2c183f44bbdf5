//! Session lifecycle: silent re-authentication, login and logout.
//!
//! `SessionStore` is the single writer of `SessionState`. Readers hold a
//! `watch::Receiver` and see every transition after the storage side effect
//! that belongs to it has completed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, LoginCredentials};
use crate::models::User;

use super::error::AuthError;
use super::storage::{CredentialPair, TokenStorage, ACCESS_TOKEN_KEY};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup, before stored credentials have been checked
    Resolving,
    Unauthenticated,
    Authenticated(User),
}

impl SessionState {
    pub fn is_resolving(&self) -> bool {
        matches!(self, SessionState::Resolving)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Shared handle to the session. Clones refer to the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: ApiClient,
    storage: Arc<dyn TokenStorage>,
    state: watch::Sender<SessionState>,
    /// Bumped under the watch lock by every commit and every logout
    generation: AtomicU64,
    initialized: AtomicBool,
    /// Serializes initialize() and login()
    single_flight: Mutex<()>,
}

impl SessionStore {
    pub fn new(api: ApiClient, storage: Arc<dyn TokenStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::Resolving);
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                state,
                generation: AtomicU64::new(0),
                initialized: AtomicBool::new(false),
                single_flight: Mutex::new(()),
            }),
        }
    }

    /// Resolve the startup state from stored credentials.
    ///
    /// Never fails: any problem with the stored pair or the identity fetch
    /// purges the pair and resolves to `Unauthenticated`. Only the first call
    /// does any work.
    pub async fn initialize(&self) -> SessionState {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            warn!("Session already initialized, ignoring");
            return self.state();
        }

        let _flight = self.inner.single_flight.lock().await;
        let generation = self.generation();

        let pair = match CredentialPair::load(self.inner.storage.as_ref()) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                None
            }
        };

        let resolved = match pair {
            None => {
                debug!("No stored credentials");
                None
            }
            Some(pair) => match self.inner.api.with_token(pair.access_token).fetch_profile().await {
                Ok(user) => Some(user),
                Err(e) => {
                    if ApiError::is_unauthorized(&e) {
                        info!("Stored session was rejected");
                    } else {
                        warn!(error = %e, "Could not verify stored session");
                    }
                    None
                }
            },
        };

        let storage = self.inner.storage.as_ref();
        let committed = self.commit(generation, |state| {
            match resolved {
                Some(user) => {
                    info!(username = %user.username, "Session restored");
                    *state = SessionState::Authenticated(user);
                }
                None => {
                    if let Err(e) = CredentialPair::purge(storage) {
                        warn!(error = %e, "Failed to purge stored credentials");
                    }
                    *state = SessionState::Unauthenticated;
                }
            }
        });

        if !committed {
            debug!("Session changed while initializing, dropping stale result");
        }
        self.state()
    }

    /// Exchange credentials for a token pair and establish a session.
    ///
    /// A failed login leaves both the state and the stored pair as they were.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, AuthError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let _flight = self.inner.single_flight.lock().await;
        let generation = self.generation();
        let storage = self.inner.storage.as_ref();

        let tokens = self.inner.api.login(credentials).await.map_err(|e| {
            info!(username = %credentials.username, error = %e, "Login rejected");
            AuthError::classify(&e)
        })?;

        let previous = match CredentialPair::load(storage) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials before login");
                None
            }
        };

        let pair = CredentialPair::new(tokens.access_token, tokens.refresh_token);
        pair.store(storage).map_err(|e| AuthError::storage(&e))?;

        let user = match self.inner.api.with_token(pair.access_token.clone()).fetch_profile().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile after login");
                self.restore(generation, previous.as_ref());
                return Err(AuthError::classify(&e));
            }
        };

        let established = user.clone();
        let committed = self.commit(generation, |state| {
            *state = SessionState::Authenticated(established);
        });

        if !committed {
            info!("Logout arrived during login, discarding new session");
            self.discard(storage);
            return Err(AuthError::Superseded);
        }

        info!(username = %user.username, "Logged in");
        Ok(user)
    }

    /// Purge stored credentials and move to `Unauthenticated`.
    ///
    /// Synchronous and idempotent. Any in-flight initialize or login loses.
    pub fn logout(&self) {
        let storage = self.inner.storage.as_ref();
        let generation = &self.inner.generation;

        self.inner.state.send_if_modified(|state| {
            if let Err(e) = CredentialPair::purge(storage) {
                warn!(error = %e, "Failed to purge stored credentials");
            }
            generation.fetch_add(1, Ordering::SeqCst);
            if *state == SessionState::Unauthenticated {
                return false;
            }
            *state = SessionState::Unauthenticated;
            true
        });
        info!("Logged out");
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// `rejected` is the access token the server just refused. If storage
    /// already holds a different one, nothing is refreshed and the caller
    /// should retry with `authorized_client()`.
    pub async fn refresh_access_token(&self, rejected: &str) -> Result<(), AuthError> {
        let generation = self.generation();
        let storage = self.inner.storage.as_ref();

        let pair = CredentialPair::load(storage)
            .map_err(|e| AuthError::storage(&e))?
            .ok_or(AuthError::NoSession)?;

        if pair.access_token != rejected {
            debug!("Stored access token was already replaced, skipping refresh");
            return Ok(());
        }

        let refreshed = self.inner.api.refresh(&pair.refresh_token).await.map_err(|e| {
            if ApiError::is_unauthorized(&e) {
                AuthError::SessionExpired
            } else {
                AuthError::classify(&e)
            }
        })?;

        let mut outcome = Err(AuthError::Superseded);
        self.inner.state.send_if_modified(|_| {
            if self.inner.generation.load(Ordering::SeqCst) == generation {
                outcome = storage
                    .set(ACCESS_TOKEN_KEY, &refreshed.access_token)
                    .map_err(|e| AuthError::storage(&e));
            }
            false
        });

        if outcome.is_ok() {
            debug!("Access token refreshed");
        }
        outcome
    }

    /// Client carrying the stored access token, if a pair is stored
    pub fn authorized_client(&self) -> Option<ApiClient> {
        match CredentialPair::load(self.inner.storage.as_ref()) {
            Ok(Some(pair)) => Some(self.inner.api.with_token(pair.access_token)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                None
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Wait until the state has left `Resolving`
    pub async fn wait_resolved(&self) -> SessionState {
        let mut rx = self.subscribe();
        let resolved = match rx.wait_for(|state| !state.is_resolving()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        resolved
    }

    /// Unauthenticated client for the backend
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Apply `update` if no other transition happened since `generation`.
    /// Returns whether it was applied.
    fn commit<F>(&self, generation: u64, update: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        let mut applied = false;
        self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            let before = state.clone();
            update(state);
            applied = true;
            *state != before
        });
        applied
    }

    /// Put back the pair stored before a failed login. Purges instead when
    /// there was none, or when a logout has happened since `generation`.
    fn restore(&self, generation: u64, previous: Option<&CredentialPair>) {
        let storage = self.inner.storage.as_ref();
        self.inner.state.send_if_modified(|_| {
            let restored = match previous {
                Some(pair) if self.generation() == generation => pair.store(storage),
                _ => CredentialPair::purge(storage),
            };
            if let Err(e) = restored {
                warn!(error = %e, "Failed to restore previous credentials");
            }
            false
        });
    }

    fn discard(&self, storage: &dyn TokenStorage) {
        if let Err(e) = CredentialPair::purge(storage) {
            warn!(error = %e, "Failed to purge credentials");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{MemoryTokenStorage, REFRESH_TOKEN_KEY};
    use crate::auth::{NavigationGuard, Route, View};
    use serde_json::json;
    use std::net::TcpListener;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn profile_json() -> serde_json::Value {
        json!({
            "id": 1, "username": "maria", "full_name": "Maria Lopez", "is_active": true,
            "created_at": "2024-01-10T08:00:00", "updated_at": "2024-01-10T08:00:00"
        })
    }

    fn stored_pair() -> Arc<MemoryTokenStorage> {
        Arc::new(MemoryTokenStorage::with_entries(&[
            (ACCESS_TOKEN_KEY, "acc"),
            (REFRESH_TOKEN_KEY, "ref"),
        ]))
    }

    fn store_for(uri: &str, storage: Arc<MemoryTokenStorage>) -> anyhow::Result<SessionStore> {
        Ok(SessionStore::new(ApiClient::new(uri)?, storage))
    }

    async fn mount_login_ok(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-acc", "refresh_token": "new-ref", "token_type": "bearer"
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_starts_resolving() -> anyhow::Result<()> {
        let store = store_for("http://localhost:8000", Arc::new(MemoryTokenStorage::new()))?;
        assert_eq!(store.state(), SessionState::Resolving);
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_without_tokens() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server.uri(), Arc::new(MemoryTokenStorage::new()))?;
        let mut guard = NavigationGuard::new(store.subscribe(), Route::Orders);
        assert_eq!(guard.view(), View::Loading);

        assert_eq!(store.initialize().await, SessionState::Unauthenticated);
        assert!(guard.sync());
        assert_eq!(guard.view(), View::Render(Route::Login));
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_accepted_token() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .and(header("authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;
        let state = store.initialize().await;

        assert!(state.is_authenticated());
        assert_eq!(store.current_user().map(|u| u.username), Some("maria".to_string()));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, Some("ref".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_rejected_token() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Could not validate credentials"
            })))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;

        assert_eq!(store.initialize().await, SessionState::Unauthenticated);
        assert!(storage.is_empty());
        assert!(store.authorized_client().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_network_failure_fails_closed() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        // Grab a free port and release it so nothing is listening there
        let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
        let storage = stored_pair();
        let store = store_for(&format!("http://127.0.0.1:{}", port), storage.clone())?;

        assert_eq!(store.initialize().await, SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_partial_pair() -> anyhow::Result<()> {
        let storage = Arc::new(MemoryTokenStorage::with_entries(&[(ACCESS_TOKEN_KEY, "acc")]));
        // Never contacted: a partial pair counts as no session
        let store = store_for("http://127.0.0.1:9", storage.clone())?;

        assert_eq!(store.initialize().await, SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_runs_once() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server.uri(), stored_pair())?;
        let first = store.initialize().await;
        let second = store.initialize().await;
        assert_eq!(first, second);
        assert!(second.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_during_initialize_wins() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(profile_json())
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.initialize().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.logout();

        let state = task.await?;
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_login_with_valid_credentials() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login_ok(&server).await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .and(header("authorization", "Bearer new-acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_for(&server.uri(), storage.clone())?;
        store.initialize().await;

        let mut guard = NavigationGuard::new(store.subscribe(), Route::Login);
        assert_eq!(guard.view(), View::Render(Route::Login));

        let user = store.login(&LoginCredentials::new("maria", "secret")).await?;
        assert_eq!(user.full_name, "Maria Lopez");
        assert!(store.is_authenticated());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("new-acc".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, Some("new-ref".to_string()));

        assert!(guard.sync());
        assert_eq!(guard.view(), View::Render(Route::Dashboard));
        assert_eq!(guard.navigate(Route::Orders), View::Render(Route::Orders));
        assert_eq!(guard.navigate(Route::Login), View::Render(Route::Dashboard));

        assert!(store.authorized_client().is_some_and(|c| c.has_token()));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_with_invalid_credentials() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Incorrect username or password"
            })))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_for(&server.uri(), storage.clone())?;
        store.initialize().await;

        let result = store.login(&LoginCredentials::new("maria", "wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_login_disabled_account() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "detail": "User is disabled"
            })))
            .mount(&server)
            .await;

        let store = store_for(&server.uri(), Arc::new(MemoryTokenStorage::new()))?;
        let result = store.login(&LoginCredentials::new("maria", "secret")).await;
        assert!(matches!(result, Err(AuthError::AccountDisabled)));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_profile_failure_restores_storage() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login_ok(&server).await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_for(&server.uri(), storage.clone())?;
        store.initialize().await;

        let result = store.login(&LoginCredentials::new("maria", "secret")).await;
        assert!(matches!(result, Err(AuthError::Unexpected(_))));
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login_ok(&server).await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .and(header("authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .and(header("authorization", "Bearer new-acc"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;
        assert!(store.initialize().await.is_authenticated());

        let result = store.login(&LoginCredentials::new("maria", "secret")).await;
        assert!(result.is_err());
        assert!(store.is_authenticated());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, Some("ref".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_rejects_empty_input_without_network() -> anyhow::Result<()> {
        // Nothing listens here; a network call would surface as Network
        let store = store_for("http://127.0.0.1:9", Arc::new(MemoryTokenStorage::new()))?;

        let result = store.login(&LoginCredentials::new("", "secret")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        let result = store.login(&LoginCredentials::new("maria", "")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_during_login_supersedes_it() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login_ok(&server).await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(profile_json())
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_for(&server.uri(), storage.clone())?;
        store.initialize().await;

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.login(&LoginCredentials::new("maria", "secret")).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.logout();

        assert!(matches!(task.await?, Err(AuthError::Superseded)));
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_from_authenticated() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;
        store.initialize().await;

        let mut guard = NavigationGuard::new(store.subscribe(), Route::Customers);
        assert_eq!(guard.view(), View::Render(Route::Customers));

        store.logout();
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(storage.is_empty());

        assert!(guard.sync());
        assert_eq!(guard.view(), View::Render(Route::Login));
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_twice_is_harmless() -> anyhow::Result<()> {
        let storage = stored_pair();
        let store = store_for("http://127.0.0.1:9", storage.clone())?;
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.logout();
        assert!(rx.has_changed()?);
        rx.borrow_and_update();

        store.logout();
        assert!(!rx.has_changed()?);
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_wait_resolved() -> anyhow::Result<()> {
        let store = store_for("http://127.0.0.1:9", Arc::new(MemoryTokenStorage::new()))?;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_resolved().await })
        };
        store.initialize().await;

        assert_eq!(waiter.await?, SessionState::Unauthenticated);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_access_token() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "acc2", "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;
        store.refresh_access_token("acc").await?;

        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc2".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, Some("ref".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_with_expired_refresh_token() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Invalid refresh token"
            })))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;
        let result = store.refresh_access_token("acc").await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_skipped_when_token_already_replaced() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;

        let storage = stored_pair();
        let store = store_for(&server.uri(), storage.clone())?;
        store.refresh_access_token("token-from-an-earlier-session").await?;

        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, Some("ref".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_without_session() -> anyhow::Result<()> {
        let store = store_for("http://127.0.0.1:9", Arc::new(MemoryTokenStorage::new()))?;
        assert!(matches!(store.refresh_access_token("acc").await, Err(AuthError::NoSession)));
        Ok(())
    }
}
