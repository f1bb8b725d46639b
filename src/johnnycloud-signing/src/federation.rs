//! Federated credential derivation.
//!
//! Exchanges a still-valid identity token for temporary, scoped cloud
//! credentials through the identity pool's two-step exchange: resolve an
//! identity ID for the token's logins map, then redeem it for a key set.
//! Credentials are short-lived and held in memory only; every call
//! sequence that needs signing re-derives them from the current token.

use std::collections::HashMap;
use std::time::Duration;

use johnnycloud_login::constants::{HTTP_TIMEOUT_SECS, USER_AGENT};
use johnnycloud_login::{AuthError, jwt};

use crate::constants::{
    AMZ_JSON, ENV_IDENTITY_POOL_ID, ENV_REGION, ENV_USER_POOL_ID, TARGET_GET_CREDENTIALS,
    TARGET_GET_ID,
};

/// Identity-pool federation settings.
#[derive(Debug, Clone)]
pub struct FederationConfig {
    /// AWS region hosting both pools.
    pub region: String,
    /// User pool the identity token was issued by.
    pub user_pool_id: String,
    /// Identity pool trusted to exchange that token.
    pub identity_pool_id: String,
    /// Clock skew margin in seconds for expiry checks.
    pub clock_skew_secs: i64,
}

impl FederationConfig {
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        identity_pool_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            identity_pool_id: identity_pool_id.into(),
            clock_skew_secs: 0,
        }
    }

    /// Load federation settings from the deployment environment.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidConfig`] if a required variable is missing.
    pub fn from_env() -> Result<Self, AuthError> {
        let require = |name: &str| {
            std::env::var(name)
                .map_err(|_| AuthError::InvalidConfig(format!("{name} is not set")))
        };
        Ok(Self::new(
            require(ENV_REGION)?,
            require(ENV_USER_POOL_ID)?,
            require(ENV_IDENTITY_POOL_ID)?,
        ))
    }

    /// The issuer key under which the identity token is presented,
    /// `cognito-idp.{region}.amazonaws.com/{userPoolId}`.
    pub fn provider_name(&self) -> String {
        format!(
            "cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    fn default_endpoint(&self) -> String {
        format!("https://cognito-identity.{}.amazonaws.com/", self.region)
    }
}

/// Temporary, scoped cloud credentials derived from an identity token.
///
/// Never written to durable storage: a still-valid identity token can
/// always re-derive them, and they expire on their own schedule.
#[derive(Debug, Clone)]
pub struct FederatedCredential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Expiry in seconds since epoch.
    pub expiration: i64,
}

impl FederatedCredential {
    /// Whether the credential has lapsed, beyond the given skew margin.
    pub fn is_expired(&self, clock_skew_secs: i64) -> bool {
        self.expiration <= chrono::Utc::now().timestamp() + clock_skew_secs
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdRequest<'a> {
    identity_pool_id: &'a str,
    logins: &'a HashMap<String, String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdResponse {
    identity_id: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetCredentialsRequest<'a> {
    identity_id: &'a str,
    logins: &'a HashMap<String, String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCredentialsResponse {
    credentials: WireCredentials,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireCredentials {
    access_key_id: String,
    secret_key: String,
    session_token: String,
    /// Epoch seconds, fractional on the wire.
    expiration: f64,
}

/// Derives temporary credentials from the current identity token.
pub struct CredentialBroker {
    config: FederationConfig,
    endpoint: String,
    http: reqwest::Client,
}

impl CredentialBroker {
    /// Broker against the region's identity service endpoint.
    ///
    /// # Errors
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: FederationConfig) -> Result<Self, AuthError> {
        let endpoint = config.default_endpoint();
        Self::with_endpoint(config, endpoint)
    }

    /// Broker against an explicit endpoint. Used by test harnesses and
    /// private deployments that front the identity service.
    pub fn with_endpoint(
        config: FederationConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            config,
            endpoint: endpoint.into(),
            http,
        })
    }

    /// The federation settings this broker was built with.
    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// Exchange a valid identity token for temporary credentials.
    ///
    /// Re-validates the token's expiry itself rather than trusting the
    /// caller: an expired or undecodable token fails with
    /// [`AuthError::IdentityTokenExpired`] before any network traffic, and
    /// the caller is expected to prompt re-authentication, never to
    /// silently refresh from this layer.
    pub async fn derive_credentials(
        &self,
        id_token: &str,
    ) -> Result<FederatedCredential, AuthError> {
        let Some(expires_at) = jwt::expiry_epoch(id_token) else {
            return Err(AuthError::IdentityTokenExpired);
        };
        if expires_at <= chrono::Utc::now().timestamp() + self.config.clock_skew_secs {
            return Err(AuthError::IdentityTokenExpired);
        }

        let logins: HashMap<String, String> =
            HashMap::from([(self.config.provider_name(), id_token.to_string())]);

        let identity: GetIdResponse = self
            .post(
                TARGET_GET_ID,
                &GetIdRequest {
                    identity_pool_id: &self.config.identity_pool_id,
                    logins: &logins,
                },
            )
            .await?;

        let exchanged: GetCredentialsResponse = self
            .post(
                TARGET_GET_CREDENTIALS,
                &GetCredentialsRequest {
                    identity_id: &identity.identity_id,
                    logins: &logins,
                },
            )
            .await?;

        let wire = exchanged.credentials;
        tracing::debug!(
            identity_id = %identity.identity_id,
            expiration = wire.expiration as i64,
            "derived federated credentials"
        );

        Ok(FederatedCredential {
            access_key_id: wire.access_key_id,
            secret_access_key: wire.secret_key,
            session_token: wire.session_token,
            expiration: wire.expiration as i64,
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        target: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, AuthError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("content-type", AMZ_JSON)
            .header("x-amz-target", target)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, operation = target, "federated exchange rejected");
            return Err(AuthError::FederationRejected {
                body: format!("{status}: {body}"),
            });
        }

        Ok(response.json().await?)
    }
}
