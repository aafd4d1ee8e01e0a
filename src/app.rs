//! Todo App Shell
//!
//! Wires the auth gate, the router and the list session. The list session is
//! mounted only while the route is `/<uid>` and the signed-in user is `uid`;
//! any change of route or identity tears it down and, if needed, mounts a
//! fresh one.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::AuthProvider;
use crate::config::AppConfig;
use crate::domain::{DomainResult, Identity, UserId};
use crate::error::{ActionError, ErrorSlot};
use crate::gate::{AuthGate, AuthState};
use crate::repository::TodoStore;
use crate::routing::{Navigator, Route};
use crate::session::ListSession;

/// What the app currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Identity not resolved yet, or a redirect is pending
    Loading,
    Landing,
    TodoList(UserId),
}

pub struct TodoApp {
    config: AppConfig,
    store: Arc<dyn TodoStore>,
    gate: AuthGate,
    errors: ErrorSlot,
    session: Option<ListSession>,
    routes: watch::Receiver<Route>,
    auth: watch::Receiver<AuthState>,
    route: Route,
}

impl TodoApp {
    /// Mount the shell at the navigator's current route. Must be called from
    /// within a tokio runtime.
    pub fn mount(
        config: AppConfig,
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn TodoStore>,
        navigator: Arc<dyn Navigator>,
    ) -> DomainResult<Self> {
        let errors = ErrorSlot::new();
        let routes = navigator.watch();
        let route = navigator.current();
        let gate = AuthGate::mount_with_errors(provider, navigator, errors.clone())?;
        let auth = gate.subscribe_state();

        log::info!("{} mounted at {}", config.app_name, route.path());
        let mut app = Self {
            config,
            store,
            gate,
            errors,
            session: None,
            routes,
            auth,
            route,
        };
        app.reconcile()?;
        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// The mounted list session, if the list screen is showing
    pub fn session(&self) -> Option<&ListSession> {
        self.session.as_ref()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.auth.borrow().identity.clone()
    }

    pub fn screen(&self) -> Screen {
        let auth = self.auth.borrow();
        if auth.loading {
            return Screen::Loading;
        }
        match (&self.route, &auth.identity) {
            (Route::Landing, _) => Screen::Landing,
            (Route::TodoList(uid), Some(identity)) if &identity.uid == uid => Screen::TodoList(uid.clone()),
            (Route::TodoList(_), _) => Screen::Loading,
        }
    }

    /// Title of the list screen
    pub fn title(&self) -> Option<String> {
        match self.screen() {
            Screen::TodoList(_) => self
                .identity()
                .map(|identity| format!("{}'s Todo", identity.display_label())),
            _ => None,
        }
    }

    /// Error of the most recent action on the current screen
    pub fn error(&self) -> Option<ActionError> {
        self.errors.current()
    }

    /// Wait for the next route or identity change and apply it.
    /// Returns false once both feeds are gone.
    pub async fn changed(&mut self) -> DomainResult<bool> {
        let alive = tokio::select! {
            r = self.routes.changed() => r.is_ok(),
            a = self.auth.changed() => a.is_ok(),
        };
        if alive {
            self.reconcile()?;
        }
        Ok(alive)
    }

    /// Apply changes until `ready` holds
    pub async fn wait_until(&mut self, mut ready: impl FnMut(&Self) -> bool) -> DomainResult<()> {
        while !ready(self) {
            if !self.changed().await? {
                break;
            }
        }
        Ok(())
    }

    pub async fn sign_in(&self) -> Result<Identity, ActionError> {
        self.gate.sign_in().await
    }

    pub async fn sign_out(&self) -> Result<(), ActionError> {
        self.gate.sign_out().await
    }

    /// Tear down the list session and stop following identity changes
    pub fn unmount(mut self) {
        if let Some(session) = self.session.take() {
            session.unmount();
        }
        log::info!("{} unmounted", self.config.app_name);
    }

    fn reconcile(&mut self) -> DomainResult<()> {
        let route = self.routes.borrow_and_update().clone();
        let identity = self.auth.borrow_and_update().identity.clone();

        if route != self.route {
            // Errors belong to the screen they happened on
            self.errors.clear();
            self.route = route;
        }

        let wanted = match (&self.route, identity) {
            (Route::TodoList(uid), Some(identity)) if &identity.uid == uid => Some(uid.clone()),
            _ => None,
        };

        let current = self.session.as_ref().map(|session| session.owner().clone());
        if current == wanted {
            return Ok(());
        }

        if let Some(session) = self.session.take() {
            session.unmount();
        }
        if let Some(owner) = wanted {
            self.session = Some(ListSession::mount_with_errors(
                Arc::clone(&self.store),
                owner,
                self.errors.clone(),
            )?);
        }
        Ok(())
    }
}
