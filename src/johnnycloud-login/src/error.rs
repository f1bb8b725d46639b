//! Error taxonomy for the authentication core.
//!
//! Expiry-driven variants are expected steady-state events and should be
//! degraded to "not authenticated" by callers. Crypto and configuration
//! failures must reach a visible error state, never be swallowed.

/// Errors produced by the login and credential-derivation flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A secure random source is not available. Fatal to the login
    /// attempt; never downgraded to a weaker scheme.
    #[error("secure random source unavailable")]
    CryptoUnavailable,

    /// The redirect return is missing the authorization code, or no
    /// pending verifier exists for this session. The caller must restart
    /// the login flow; the exchange is never attempted with partial data.
    #[error("missing authorization artifact: {0}")]
    MissingAuthorizationArtifact(&'static str),

    /// The provider declined the code exchange. Authorization codes are
    /// single-use and short-lived, so this is never retried.
    #[error("token exchange rejected ({status}): {body}")]
    TokenExchangeRejected { status: u16, body: String },

    /// The provider rejected the login before issuing a code; surfaced
    /// from the `error`/`error_description` redirect parameters.
    #[error("provider rejected login: {error} - {description}")]
    ProviderRejected { error: String, description: String },

    /// The identity token has lapsed (or is malformed). Degrade to
    /// logged-out and prompt re-login.
    #[error("identity token expired")]
    IdentityTokenExpired,

    /// The federated identity exchange was declined, e.g. a misconfigured
    /// trust relationship. Surfaced with the provider's diagnostic body.
    #[error("federated credential exchange rejected: {body}")]
    FederationRejected { body: String },

    /// A signed call still failed authorization after the single
    /// permitted re-derivation retry.
    #[error("signed call failed: {detail}")]
    SignedCallFailed { detail: String },

    /// The caller cancelled an in-flight operation. Not a failure.
    #[error("operation aborted by caller")]
    Aborted,

    /// Provider configuration is unusable (non-HTTPS endpoint, missing
    /// environment variable).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure talking to the provider.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Durable token storage failed.
    #[error("token storage error: {0}")]
    Storage(String),
}
