//! JohnnyCloud signing - federated credentials and signed backend calls.
//!
//! Sits downstream of `johnnycloud-login`: a valid identity token is
//! exchanged for temporary, scoped cloud credentials, which then sign
//! direct calls to backend functions. No server-side session exists;
//! authorization travels with each request.
//!
//! - [`CredentialBroker`] performs the federated identity exchange
//! - [`SignedClient`] signs and dispatches calls, re-deriving credentials
//!   at most once per call

pub mod constants;

mod client;
mod federation;
mod sigv4;

// Re-exports from federation
pub use federation::{CredentialBroker, FederatedCredential, FederationConfig};

// Re-exports from client
pub use client::SignedClient;

// Re-exports from sigv4
pub use sigv4::{SigningScope, signing_headers_at};

// The shared error taxonomy lives in the login crate.
pub use johnnycloud_login::AuthError;
