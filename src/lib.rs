//! Live Todo
//!
//! Client core of a per-user todo list kept live against a hosted document
//! store.
//!
//! Layered architecture:
//! - domain: Core entities and errors
//! - repository: Document store contract and an in-memory store
//! - auth: Identity provider contract and a stub provider
//! - routing / gate: Screens and the client-side auth guard
//! - session: List screen view model and its commands
//! - app: Shell mounting the list session for the signed-in owner

pub mod app;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod gate;
pub mod logging;
pub mod reorder;
pub mod repository;
pub mod routing;
pub mod session;
pub mod subscription;

pub use app::{Screen, TodoApp};
pub use auth::{AuthProvider, StubAuthProvider};
pub use config::{AppConfig, ConfigError};
pub use domain::{DomainError, DomainResult, Identity, NewTodo, TodoId, TodoItem, TodoPatch, UserId};
pub use error::{ActionError, ErrorSlot};
pub use gate::{redirect_for, AuthGate, AuthState};
pub use reorder::DragResult;
pub use repository::{MemoryStore, TodoQuery, TodoStore};
pub use routing::{MemoryRouter, Navigator, Route};
pub use session::{ListSession, ListView};
pub use subscription::Subscription;
