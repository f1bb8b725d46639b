//! Logout URL construction.

use crate::config::AuthConfig;

/// Build the provider's logout URL with the configured post-logout URI.
pub(crate) fn build_logout_url(config: &AuthConfig) -> String {
    format!(
        "{}?client_id={}&logout_uri={}",
        config.logout_endpoint(),
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.signout_uri),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logout_url() {
        let config = AuthConfig::new(
            "https://auth.example.com",
            "client-1",
            "https://app.example/auth/callback",
            "https://app.example/",
        )
        .unwrap();

        assert_eq!(
            build_logout_url(&config),
            "https://auth.example.com/logout?client_id=client-1&logout_uri=https%3A%2F%2Fapp.example%2F"
        );
    }
}
