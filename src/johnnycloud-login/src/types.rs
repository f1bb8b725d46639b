//! Core data types for session state.

/// The token set issued by the provider's token endpoint.
///
/// Owned by the session's durable store. Writes are always whole-value
/// replacements; no partial-field mutation is ever visible to readers.
/// When `id_token` is present, its `exp` claim is the sole authority for
/// session validity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenSet {
    /// Identity token (JWT) asserting the user's claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Access token (JWT) for resource-server calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Opaque refresh token, if the provider issued one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenSet {
    /// True when no tokens are held at all.
    pub fn is_empty(&self) -> bool {
        self.id_token.is_none() && self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Read-only identity view decoded from the current id token's payload.
///
/// Never stored independently; always recomputed from the token set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Stable subject identifier (empty when the payload omits `sub`).
    pub subject: String,
    /// Email address, when asserted.
    pub email: Option<String>,
    /// Human-facing display name, resolved through the provider's
    /// fallback chain of naming claims.
    pub display_name: Option<String>,
    /// Provider-side account name, falling back to the subject.
    pub account: Option<String>,
    /// Expiry of the identity assertion, seconds since epoch.
    pub expires_at: i64,
}

/// The identity summary the surrounding UI is permitted to consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub account: Option<String>,
}

/// Result of a completed login: the persisted tokens plus the landing
/// path the login was started with.
#[derive(Debug, Clone)]
pub struct CompletedLogin {
    /// The token set now reflected by the session store.
    pub tokens: TokenSet,
    /// Post-login landing path, from the redirect's `state` hint.
    pub landing: String,
}
