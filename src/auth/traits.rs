//! Auth Provider Trait
//!
//! Contract consumed from the external identity service.

use async_trait::async_trait;

use crate::domain::{DomainResult, Identity};
use crate::subscription::{Callback, Subscription};

/// Callback receiving `None` when signed out, `Some(identity)` when signed in
pub type IdentityCallback = Callback<Option<Identity>>;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Watch identity changes. The current state is delivered first; later
    /// events follow sign-in, sign-out and session refresh.
    ///
    /// Must be called from within a tokio runtime.
    fn watch(&self, on_change: IdentityCallback) -> DomainResult<Subscription>;

    /// Run the interactive sign-in flow
    async fn sign_in(&self) -> DomainResult<Identity>;

    /// End the current session
    async fn sign_out(&self) -> DomainResult<()>;
}
