//! Token endpoint grants: authorization-code exchange and refresh.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::types::TokenSet;

/// Wire shape of the token endpoint's success response.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_token_set(self) -> TokenSet {
        if let Some(expires_in) = self.expires_in {
            tracing::debug!(expires_in, "token endpoint reported access token lifetime");
        }
        TokenSet {
            id_token: self.id_token,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
        }
    }
}

/// Redeem an authorization code plus PKCE verifier for a token set.
///
/// Issues exactly one POST. A non-2xx response is mapped to
/// [`AuthError::TokenExchangeRejected`] with the provider's body and is
/// never retried: the code is single-use and expires within minutes, so a
/// second attempt with the same code always fails.
pub(crate) async fn exchange_code(
    http: &reqwest::Client,
    config: &AuthConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenSet, AuthError> {
    let response = http
        .post(config.token_endpoint())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let token: TokenResponse = read_token_response(response).await?;
    Ok(token.into_token_set())
}

/// Redeem a refresh token for a fresh token set.
///
/// The provider may omit a new refresh token on this grant; the caller is
/// expected to carry the existing one forward.
pub(crate) async fn refresh_grant(
    http: &reqwest::Client,
    config: &AuthConfig,
    refresh_token: &str,
) -> Result<TokenSet, AuthError> {
    let response = http
        .post(config.token_endpoint())
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    let token: TokenResponse = read_token_response(response).await?;
    Ok(token.into_token_set())
}

async fn read_token_response(response: reqwest::Response) -> Result<TokenResponse, AuthError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "token endpoint rejected the grant");
        return Err(AuthError::TokenExchangeRejected {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
