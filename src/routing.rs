//! Routing
//!
//! Two screens: the public landing page at `/` and one list page per user at
//! `/<uid>`. Navigation is client-side only.

use std::sync::Mutex;

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use tokio::sync::watch;

use crate::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Landing,
    /// `/<uid>`
    TodoList(UserId),
}

impl Route {
    /// Match a path against the two screens. Nested paths match nothing.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Some(Route::Landing);
        }
        if trimmed.contains('/') {
            return None;
        }
        let uid = percent_decode_str(trimmed).decode_utf8().ok()?;
        Some(Route::TodoList(UserId::new(uid.into_owned())))
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::TodoList(uid) => format!("/{}", utf8_percent_encode(uid.as_str(), NON_ALPHANUMERIC)),
        }
    }

    /// Screens that require a matching signed-in user
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::TodoList(_))
    }

    /// Path parameter of a list screen
    pub fn owner(&self) -> Option<&UserId> {
        match self {
            Route::TodoList(uid) => Some(uid),
            Route::Landing => None,
        }
    }
}

/// Programmatic navigation
pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;

    /// Go to `route`. Navigating to the current route does nothing.
    fn navigate(&self, route: Route);

    /// Observe route changes
    fn watch(&self) -> watch::Receiver<Route>;
}

/// Navigator keeping its history in memory
pub struct MemoryRouter {
    route: watch::Sender<Route>,
    history: Mutex<Vec<Route>>,
}

impl MemoryRouter {
    pub fn new(initial: Route) -> Self {
        let (route, _) = watch::channel(initial.clone());
        Self {
            route,
            history: Mutex::new(vec![initial]),
        }
    }

    /// Open the app at a path; `None` if the path matches no screen
    pub fn open(path: &str) -> Option<Self> {
        Route::parse(path).map(Self::new)
    }

    /// Every route visited, oldest first
    pub fn history(&self) -> Vec<Route> {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Navigator for MemoryRouter {
    fn current(&self) -> Route {
        self.route.borrow().clone()
    }

    fn navigate(&self, route: Route) {
        let target = route.clone();
        let changed = self.route.send_if_modified(move |current| {
            if *current == target {
                return false;
            }
            *current = target;
            true
        });
        if changed {
            log::info!("navigate -> {}", route.path());
            match self.history.lock() {
                Ok(mut history) => history.push(route),
                Err(poisoned) => poisoned.into_inner().push(route),
            }
        }
    }

    fn watch(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }
}
