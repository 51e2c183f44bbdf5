//! Navigation guard for the public and protected route trees.
//!
//! The guard owns the navigation history and a subscription to the session
//! state. It recomputes its decision only when the user navigates or the
//! session changes, never on every frame. Redirects always replace the
//! current history entry so the back key cannot bounce between the login
//! screen and the shell.

use tokio::sync::watch;
use tracing::debug;

use super::route::{Route, RouteClass};
use super::session::SessionState;

/// Upper bound on chained redirects within one evaluation
const MAX_REDIRECT_HOPS: usize = 4;

/// Outcome of evaluating one route against one session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving: show a neutral placeholder, defer redirects
    Loading,
    /// Leave this route, replacing its history entry
    Redirect(Route),
    Render,
}

/// The decision table.
pub fn decide(state: &SessionState, route: Route) -> GuardDecision {
    match (state, route.class()) {
        (SessionState::Resolving, _) => GuardDecision::Loading,
        (SessionState::Unauthenticated, RouteClass::Protected) => GuardDecision::Redirect(Route::Login),
        (SessionState::Unauthenticated, RouteClass::Public) => GuardDecision::Render,
        (SessionState::Authenticated(_), RouteClass::Public) => GuardDecision::Redirect(Route::LANDING),
        (SessionState::Authenticated(_), RouteClass::Protected) => {
            if route == Route::Root {
                GuardDecision::Redirect(Route::LANDING)
            } else {
                GuardDecision::Render
            }
        }
    }
}

/// What the shell should draw right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Render(Route),
}

/// Browser-style history: a list of entries and a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Route>,
    index: usize,
}

impl History {
    pub fn new(initial: Route) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> Route {
        self.entries[self.index]
    }

    /// Add an entry after the cursor, dropping any forward entries
    pub fn push(&mut self, route: Route) {
        self.entries.truncate(self.index + 1);
        self.entries.push(route);
        self.index = self.entries.len() - 1;
    }

    pub fn replace(&mut self, route: Route) {
        self.entries[self.index] = route;
    }

    /// Move the cursor back. Returns false at the first entry.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }
}

pub struct NavigationGuard {
    session: watch::Receiver<SessionState>,
    history: History,
    view: View,
}

impl NavigationGuard {
    pub fn new(session: watch::Receiver<SessionState>, initial: Route) -> Self {
        let mut guard = Self {
            session,
            history: History::new(initial),
            view: View::Loading,
        };
        guard.evaluate();
        guard
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// The route the user asked for, after any redirects
    pub fn current_route(&self) -> Route {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Navigate to `route`, pushing a history entry
    pub fn navigate(&mut self, route: Route) -> View {
        if route != self.history.current() {
            self.history.push(route);
        }
        self.evaluate()
    }

    pub fn back(&mut self) -> View {
        if self.history.back() {
            self.evaluate();
        }
        self.view
    }

    pub fn forward(&mut self) -> View {
        if self.history.forward() {
            self.evaluate();
        }
        self.view
    }

    /// Re-evaluate if the session changed since the last evaluation.
    /// Returns true when a change was observed.
    pub fn sync(&mut self) -> bool {
        match self.session.has_changed() {
            Ok(true) => {
                self.evaluate();
                true
            }
            _ => false,
        }
    }

    /// Wait for the next session change and re-evaluate.
    /// Returns `None` once the session store is gone.
    pub async fn changed(&mut self) -> Option<View> {
        self.session.changed().await.ok()?;
        Some(self.evaluate())
    }

    fn evaluate(&mut self) -> View {
        let state = self.session.borrow_and_update().clone();

        for _ in 0..MAX_REDIRECT_HOPS {
            let route = self.history.current();
            match decide(&state, route) {
                GuardDecision::Loading => {
                    self.view = View::Loading;
                    return self.view;
                }
                GuardDecision::Render => {
                    self.view = View::Render(route);
                    return self.view;
                }
                GuardDecision::Redirect(target) => {
                    debug!(from = %route, to = %target, "Redirecting");
                    self.history.replace(target);
                }
            }
        }

        // decide() never chains more than two redirects; settle on login
        self.history.replace(Route::Login);
        self.view = View::Render(Route::Login);
        self.view
    }
}
