use ballot_session::SessionSnapshot;
use ballot_types::Role;
use tracing::{debug, info};

use crate::route::Route;

/// Result of a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Allowed(Route),
    /// Access was denied; the router moved to `to` instead of `requested`.
    Redirected { requested: Route, to: Route },
}

impl Navigation {
    /// Where the router ended up.
    pub fn route(&self) -> Route {
        match self {
            Self::Allowed(route) => *route,
            Self::Redirected { to, .. } => *to,
        }
    }
}

/// Where Home's "enter" action leads for `session`.
pub fn entry_route(session: &SessionSnapshot) -> Route {
    match session.role() {
        Some(Role::Admin) => Route::Admin,
        Some(Role::Voter) => Route::Voter,
        None => Route::Home,
    }
}

/// Tracks the current route and enforces role gating.
#[derive(Debug, Default)]
pub struct PageRouter {
    current: Route,
}

impl PageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Go to `route` if `session` permits it, otherwise to Home.
    pub fn navigate(&mut self, route: Route, session: &SessionSnapshot) -> Navigation {
        if route.permits(session) {
            self.current = route;
            debug!(%route, "navigated");
            Navigation::Allowed(route)
        } else {
            info!(requested = %route, "access denied; redirecting home");
            self.current = Route::Home;
            Navigation::Redirected {
                requested: route,
                to: Route::Home,
            }
        }
    }

    /// Re-check the current route after the session changed.
    ///
    /// Returns the new route if the user was moved.
    pub fn on_session_change(&mut self, session: &SessionSnapshot) -> Option<Route> {
        let target = if !session.is_connected() {
            Route::Home
        } else if self.current.permits(session) {
            self.current
        } else {
            Route::Home
        };

        if target == self.current {
            return None;
        }
        info!(from = %self.current, to = %target, "session change moved route");
        self.current = target;
        Some(target)
    }
}
