//! JohnnyCloud login - Hosted-UI OAuth 2.0 authentication core.
//!
//! Implements the browser-side login flow against the identity provider:
//! - PKCE verifier/challenge generation (S256 only)
//! - Authorization request construction
//! - Authorization-code and refresh-token grants
//! - Durable session state with lazy validity checks
//! - Provider logout
//!
//! The entry point is [`AuthSession`], an explicitly constructed object
//! owned by the embedder; see the crate's `session` module.

// Core modules
pub mod constants;
pub mod error;
pub mod types;

// Primitives
pub mod jwt;
pub mod pkce;

// Flow building blocks
mod authorize;
mod exchange;
mod signout;

// Session state
pub mod config;
pub mod session;
pub mod store;

// Re-exports from error
pub use error::AuthError;

// Re-exports from config
pub use config::AuthConfig;

// Re-exports from types
pub use types::{CompletedLogin, IdentityClaims, TokenSet, UserInfo};

// Re-exports from session
pub use session::AuthSession;

// Re-exports from store
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-exports from pkce
pub use pkce::PkceCredential;
