//! Authentication Gate
//!
//! Follows the provider's identity stream and keeps the router on a screen
//! the current user may see: signed-out users go to `/`, signed-in users go
//! to their own `/<uid>`. The guard is client-side routing only.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::AuthProvider;
use crate::domain::{DomainResult, Identity};
use crate::error::{ActionError, ErrorSlot};
use crate::routing::{Navigator, Route};
use crate::subscription::Subscription;

/// Identity as last reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// True until the provider has reported once
    pub loading: bool,
    pub identity: Option<Identity>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            loading: true,
            identity: None,
        }
    }
}

/// Where `identity` must be sent from `route`, if anywhere
pub fn redirect_for(route: &Route, identity: Option<&Identity>) -> Option<Route> {
    match identity {
        None if route.is_protected() => Some(Route::Landing),
        None => None,
        Some(identity) if route.owner() != Some(&identity.uid) => {
            Some(Route::TodoList(identity.uid.clone()))
        }
        Some(_) => None,
    }
}

pub struct AuthGate {
    provider: Arc<dyn AuthProvider>,
    navigator: Arc<dyn Navigator>,
    state: Arc<watch::Sender<AuthState>>,
    errors: ErrorSlot,
    _subscription: Subscription,
}

impl AuthGate {
    /// Start following the provider. Must be called from within a tokio runtime.
    pub fn mount(provider: Arc<dyn AuthProvider>, navigator: Arc<dyn Navigator>) -> DomainResult<Self> {
        Self::mount_with_errors(provider, navigator, ErrorSlot::new())
    }

    pub fn mount_with_errors(
        provider: Arc<dyn AuthProvider>,
        navigator: Arc<dyn Navigator>,
        errors: ErrorSlot,
    ) -> DomainResult<Self> {
        let (state, _) = watch::channel(AuthState::default());
        let state = Arc::new(state);

        let sink = Arc::clone(&state);
        let router = Arc::clone(&navigator);
        let subscription = provider.watch(Box::new(move |identity| {
            match &identity {
                Some(identity) => log::info!("signed in as {}", identity.uid),
                None => log::info!("signed out"),
            }
            if let Some(target) = redirect_for(&router.current(), identity.as_ref()) {
                router.navigate(target);
            }
            sink.send_replace(AuthState {
                loading: false,
                identity,
            });
        }))?;

        Ok(Self {
            provider,
            navigator,
            state,
            errors,
            _subscription: subscription,
        })
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Wait for the provider's first report
    pub async fn resolved(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    pub fn error(&self) -> Option<ActionError> {
        self.errors.current()
    }

    /// Interactive sign-in; on success the user's list is opened
    pub async fn sign_in(&self) -> Result<Identity, ActionError> {
        self.errors.clear();
        match self.provider.sign_in().await {
            Ok(identity) => {
                self.navigator.navigate(Route::TodoList(identity.uid.clone()));
                Ok(identity)
            }
            Err(e) => {
                log::error!("sign-in failed: {}", e);
                self.errors.set(ActionError::SignIn);
                Err(ActionError::SignIn)
            }
        }
    }

    /// End the session and return to the landing page. On failure the
    /// session is whatever the provider still reports.
    pub async fn sign_out(&self) -> Result<(), ActionError> {
        self.errors.clear();
        match self.provider.sign_out().await {
            Ok(()) => {
                self.navigator.navigate(Route::Landing);
                Ok(())
            }
            Err(e) => {
                log::error!("sign-out failed: {}", e);
                self.errors.set(ActionError::SignOut);
                Err(ActionError::SignOut)
            }
        }
    }
}
