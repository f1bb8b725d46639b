//! Authorization request construction.

use crate::config::AuthConfig;
use crate::pkce::PkceCredential;

/// Build the Hosted UI authorization URL for one login attempt.
///
/// Carries exactly: `client_id`, `response_type=code`, `scope`,
/// `redirect_uri`, `code_challenge`, `code_challenge_method=S256`, and
/// optionally `state`. The `state` value is only the desired post-login
/// landing path echoed back by the provider; the exchange does not
/// cross-check it.
pub(crate) fn build_authorize_url(
    config: &AuthConfig,
    pkce: &PkceCredential,
    landing: Option<&str>,
) -> String {
    let scope = config.scopes.join(" ");

    let mut url = format!(
        "{}?client_id={}&response_type=code&scope={}&redirect_uri={}&code_challenge={}&code_challenge_method=S256",
        config.authorize_endpoint(),
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&scope),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&pkce.challenge),
    );

    if let Some(landing) = landing {
        url.push_str(&format!("&state={}", urlencoding::encode(landing)));
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://auth.example.com",
            "client-1",
            "https://app.example/auth/callback",
            "https://app.example/",
        )
        .unwrap()
    }

    fn query_map(url: &str) -> HashMap<String, String> {
        let parsed = url::Url::parse(url).unwrap();
        parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_exact_parameter_set() {
        let pkce = PkceCredential::from_verifier(
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
        );
        let url = build_authorize_url(&config(), &pkce, None);

        assert!(url.starts_with("https://auth.example.com/oauth2/authorize?"));
        let params = query_map(&url);
        assert_eq!(params.len(), 6);
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "openid email profile");
        assert_eq!(params["redirect_uri"], "https://app.example/auth/callback");
        assert_eq!(params["code_challenge"], "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
        assert_eq!(params["code_challenge_method"], "S256");
        assert!(!params.contains_key("state"));
    }

    #[test]
    fn test_state_carries_landing_path() {
        let pkce = PkceCredential::from_verifier("v".repeat(43));
        let url = build_authorize_url(&config(), &pkce, Some("/costs?range=30d"));
        let params = query_map(&url);
        assert_eq!(params["state"], "/costs?range=30d");
    }
}
