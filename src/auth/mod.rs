//! Auth Layer
//!
//! Identity provider abstraction and an in-memory stub.

mod stub_provider;
mod traits;

pub use stub_provider::StubAuthProvider;
pub use traits::{AuthProvider, IdentityCallback};
