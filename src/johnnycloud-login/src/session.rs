//! The authenticated session object.
//!
//! One `AuthSession` owns the configuration, the durable token store, the
//! HTTP client, and the pending login attempt. The embedder constructs it
//! at startup and passes it by reference wherever session state is needed;
//! there is no ambient global. The pending PKCE verifier lives inside the
//! instance, so concurrent sessions (the multi-tab case) each hold their
//! own attempt and only the one whose verifier matches can complete.

use std::collections::HashMap;
use std::time::Duration;

use crate::authorize::build_authorize_url;
use crate::config::AuthConfig;
use crate::constants::{DEFAULT_LANDING, HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::error::AuthError;
use crate::exchange::{exchange_code, refresh_grant};
use crate::jwt;
use crate::pkce::PkceCredential;
use crate::signout::build_logout_url;
use crate::store::TokenStore;
use crate::types::{CompletedLogin, IdentityClaims, TokenSet, UserInfo};

/// Browser-side authentication session: login, token lifecycle, sign-out.
pub struct AuthSession {
    config: AuthConfig,
    store: Box<dyn TokenStore>,
    http: reqwest::Client,
    pending_verifier: Option<String>,
}

impl AuthSession {
    /// Create a session over the given configuration and durable store.
    ///
    /// # Errors
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: AuthConfig, store: Box<dyn TokenStore>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            config,
            store,
            http,
            pending_verifier: None,
        })
    }

    /// The configuration this session was built with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Start a login attempt: generate a PKCE pair, remember the verifier,
    /// and return the authorization URL for the embedder to navigate to.
    ///
    /// `landing` is the post-login destination carried through the
    /// provider's `state` parameter; it is a UX hint, not a CSRF check.
    /// Starting a second attempt replaces the first one's verifier.
    ///
    /// # Errors
    /// Returns [`AuthError::CryptoUnavailable`] if the OS random source
    /// fails; this is fatal to the attempt.
    pub fn begin_login(&mut self, landing: Option<&str>) -> Result<String, AuthError> {
        let pkce = PkceCredential::generate()?;
        if self.pending_verifier.replace(pkce.verifier.clone()).is_some() {
            tracing::debug!("replacing verifier from a previous login attempt");
        }
        Ok(build_authorize_url(&self.config, &pkce, landing))
    }

    /// Complete a login from the redirect-return query string.
    ///
    /// Preconditions, in order: the provider reported no error, a `code`
    /// parameter is present, and a pending verifier exists. The verifier
    /// is consumed before the exchange is attempted, so a duplicate
    /// invocation (double-render of the callback route) fails fast with
    /// [`AuthError::MissingAuthorizationArtifact`] instead of issuing a
    /// second exchange for the same single-use code.
    ///
    /// The store reflects the new token set only after the exchange has
    /// completed successfully.
    pub async fn complete_login(&mut self, query: &str) -> Result<CompletedLogin, AuthError> {
        let params = parse_query(query);

        if let Some(error) = params.get("error") {
            let description = params.get("error_description").cloned().unwrap_or_default();
            tracing::warn!(error = %error, "provider rejected the login");
            return Err(AuthError::ProviderRejected {
                error: error.clone(),
                description,
            });
        }

        let code = params
            .get("code")
            .ok_or(AuthError::MissingAuthorizationArtifact("code"))?;

        // One-time use: taking the verifier here makes a concurrent second
        // completion fail fast before any network traffic.
        let verifier = self
            .pending_verifier
            .take()
            .ok_or(AuthError::MissingAuthorizationArtifact("verifier"))?;

        let tokens = exchange_code(&self.http, &self.config, code, &verifier).await?;
        self.store.save(&tokens)?;
        tracing::debug!("login completed and token set persisted");

        let landing = params
            .get("state")
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LANDING.to_string());

        Ok(CompletedLogin { tokens, landing })
    }

    /// Redeem the stored refresh token for a fresh token set.
    ///
    /// Never invoked implicitly: expiry is discovered lazily by
    /// [`AuthSession::is_valid`] or credential derivation, and the
    /// embedder decides when to refresh or re-login.
    ///
    /// # Errors
    /// [`AuthError::IdentityTokenExpired`] when no refresh token is held;
    /// [`AuthError::TokenExchangeRejected`] when the provider declines.
    pub async fn refresh(&mut self) -> Result<(), AuthError> {
        let Some(refresh_token) = self.store.load()?.and_then(|t| t.refresh_token) else {
            return Err(AuthError::IdentityTokenExpired);
        };

        let mut tokens = refresh_grant(&self.http, &self.config, &refresh_token).await?;
        // The refresh grant may omit a new refresh token; carry the
        // existing one forward so the session stays refreshable.
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token);
        }

        self.store.save(&tokens)?;
        tracing::debug!("token set refreshed");
        Ok(())
    }

    /// Replace the stored token set wholesale.
    pub fn persist(&mut self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.store.save(tokens)
    }

    /// The currently stored token set, if any.
    pub fn current(&self) -> Result<Option<TokenSet>, AuthError> {
        self.store.load()
    }

    /// Whether the session holds a currently valid identity token.
    ///
    /// True exactly when an id token is present and its decoded `exp`
    /// claim is strictly in the future, beyond the configured clock skew
    /// margin. Malformed tokens and storage failures degrade to `false`.
    pub fn is_valid(&self) -> bool {
        let Ok(Some(tokens)) = self.store.load() else {
            return false;
        };
        let Some(id_token) = tokens.id_token.as_deref() else {
            return false;
        };
        let Some(expires_at) = jwt::expiry_epoch(id_token) else {
            return false;
        };
        expires_at > chrono::Utc::now().timestamp() + self.config.clock_skew_secs
    }

    /// UI-surface alias for [`AuthSession::is_valid`].
    pub fn is_logged_in(&self) -> bool {
        self.is_valid()
    }

    /// Identity claims decoded from the current id token.
    ///
    /// A pure function of the stored token set: missing or malformed
    /// tokens yield `None`, never an error.
    pub fn claims(&self) -> Option<IdentityClaims> {
        let tokens = self.store.load().ok()??;
        jwt::decode_claims(tokens.id_token.as_deref()?)
    }

    /// The identity summary the surrounding UI consumes.
    pub fn user_info(&self) -> UserInfo {
        match self.claims() {
            Some(claims) => UserInfo {
                name: claims.display_name,
                email: claims.email,
                account: claims.account,
            },
            None => UserInfo::default(),
        }
    }

    /// The current id token, for federated credential derivation.
    pub fn id_token(&self) -> Option<String> {
        self.store.load().ok()?.and_then(|t| t.id_token)
    }

    /// Remove the stored token set.
    pub fn clear(&mut self) -> Result<(), AuthError> {
        self.store.clear()
    }

    /// Sign out: clear local state first, then hand back the provider's
    /// logout URL for the embedder to navigate to.
    ///
    /// A storage failure is logged and does not suppress the redirect; a
    /// user who asked to sign out must never be left looking
    /// authenticated because local cleanup failed.
    pub fn sign_out(&mut self) -> String {
        self.pending_verifier = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear token store during sign-out");
        }
        build_logout_url(&self.config)
    }
}

/// Parse a redirect-return query string (with or without a leading `?`).
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
