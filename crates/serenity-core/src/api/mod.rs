//! REST client for the meditation backend.
//!
//! Every request carries `Authorization: Bearer <token>` when a token is
//! stored. The backend itself is an opaque dependency.

mod client;
pub mod token;

pub use client::{ApiClient, RemoteDailySummary, RemoteSession};
pub use token::{KeyringTokenStore, MemoryTokenStore, TokenStore};
