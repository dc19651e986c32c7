//! Gateway traits for authentication and record storage.
//!
//! The hosted backend is an external collaborator; these traits are the seam.
//! [`supabase::SupabaseGateway`] talks to a Supabase-compatible service over
//! HTTP, [`memory::MemoryGateway`] keeps everything in-process.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::{Identity, Query, Table};

pub mod memory;
pub mod supabase;

pub use memory::MemoryGateway;
pub use supabase::SupabaseGateway;

/// Session change published by an [`AuthGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session started or was refreshed
    SignedIn(Identity),
    /// The session ended
    SignedOut,
}

impl SessionEvent {
    /// Identity carried by the event, if any
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity.clone()),
            Self::SignedOut => None,
        }
    }
}

/// Authentication half of the gateway
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Identity of the session the gateway already holds, if any
    async fn current_session(&self) -> Result<Option<Identity>>;

    /// Receiver for session changes; lives as long as the caller keeps it
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Check credentials and start a session
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    /// Register an account; `redirect_to` is where the confirmation link lands
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<Identity>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;
}

/// Row storage half of the gateway
///
/// Rows travel as JSON objects; callers convert them to typed records.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Rows matching `query`, in the requested order
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>>;

    /// Insert one row and return it as stored, with server-assigned columns
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    /// Merge `patch` into every matching row and return the updated rows
    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>>;

    /// Delete matching rows and return how many were removed
    async fn delete(&self, table: Table, query: &Query) -> Result<u64>;
}
