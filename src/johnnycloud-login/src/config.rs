//! Configuration for the Hosted UI login flow.

use crate::constants::{
    AUTHORIZE_PATH, DEFAULT_SCOPES, ENV_CLIENT_ID, ENV_DOMAIN, ENV_REDIRECT_URI, ENV_SCOPES,
    ENV_SIGNOUT_URI, LOGOUT_PATH, TOKEN_PATH,
};
use crate::error::AuthError;

/// Configuration for one identity-provider application client.
///
/// Constructed explicitly by the embedder and handed to [`crate::AuthSession`];
/// nothing in this crate reads ambient global state after construction.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Hosted UI base URL, e.g. `https://auth.example.auth.us-east-1.amazoncognito.com`.
    pub domain: String,
    /// OAuth app client ID.
    pub client_id: String,
    /// Redirect URI registered for the login callback.
    pub redirect_uri: String,
    /// URI the provider sends the browser to after logout.
    pub signout_uri: String,
    /// Scopes to request.
    pub scopes: Vec<String>,
    /// Clock skew margin in seconds subtracted from token lifetimes when
    /// judging validity. Zero unless the deployment opts in.
    pub clock_skew_secs: i64,
}

impl AuthConfig {
    /// Create a configuration, normalizing and validating the provider domain.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidConfig`] if the domain is not HTTPS
    /// (loopback hosts are exempt) or carries embedded credentials.
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        signout_uri: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let domain = normalize_domain(domain.into())?;
        Ok(Self {
            domain,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            signout_uri: signout_uri.into(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            clock_skew_secs: 0,
        })
    }

    /// Replace the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the clock skew margin applied by validity checks.
    #[must_use]
    pub fn with_clock_skew(mut self, secs: i64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    /// Load configuration from the deployment environment.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidConfig`] if a required variable is
    /// missing or the domain fails validation.
    pub fn from_env() -> Result<Self, AuthError> {
        let require = |name: &str| {
            std::env::var(name)
                .map_err(|_| AuthError::InvalidConfig(format!("{name} is not set")))
        };

        let mut config = Self::new(
            require(ENV_DOMAIN)?,
            require(ENV_CLIENT_ID)?,
            require(ENV_REDIRECT_URI)?,
            require(ENV_SIGNOUT_URI)?,
        )?;

        if let Ok(scopes) = std::env::var(ENV_SCOPES) {
            let scopes: Vec<String> = scopes.split_whitespace().map(ToString::to_string).collect();
            if !scopes.is_empty() {
                config.scopes = scopes;
            }
        }

        Ok(config)
    }

    pub(crate) fn authorize_endpoint(&self) -> String {
        format!("{}{AUTHORIZE_PATH}", self.domain)
    }

    pub(crate) fn token_endpoint(&self) -> String {
        format!("{}{TOKEN_PATH}", self.domain)
    }

    pub(crate) fn logout_endpoint(&self) -> String {
        format!("{}{LOGOUT_PATH}", self.domain)
    }
}

/// Normalize a Hosted UI domain to an origin with a scheme, enforcing HTTPS.
///
/// Deployments often configure the bare hostname; a missing scheme is
/// treated as HTTPS. Loopback hosts may use plain HTTP so local harnesses
/// can stand in for the provider.
fn normalize_domain(raw: String) -> Result<String, AuthError> {
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw
    } else {
        format!("https://{raw}")
    };

    let url = url::Url::parse(&with_scheme)
        .map_err(|e| AuthError::InvalidConfig(format!("invalid provider domain: {e}")))?;

    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
    if url.scheme() != "https" && !loopback {
        return Err(AuthError::InvalidConfig(
            "provider domain must use HTTPS".to_string(),
        ));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(AuthError::InvalidConfig(
            "provider domain must not embed credentials".to_string(),
        ));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}
