//! Constants for the johnnycloud-login crate.

/// Hosted UI authorization endpoint path.
pub const AUTHORIZE_PATH: &str = "/oauth2/authorize";

/// Hosted UI token endpoint path.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Hosted UI logout endpoint path.
pub const LOGOUT_PATH: &str = "/logout";

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Landing path used when the redirect return carries no `state` hint.
pub const DEFAULT_LANDING: &str = "/";

/// File name of the durable token store.
pub const TOKEN_FILE: &str = "tokens.json";

/// Environment variable for the Hosted UI domain.
pub const ENV_DOMAIN: &str = "JOHNNYCLOUD_COGNITO_DOMAIN";

/// Environment variable for the app client ID.
pub const ENV_CLIENT_ID: &str = "JOHNNYCLOUD_CLIENT_ID";

/// Environment variable for the login redirect URI.
pub const ENV_REDIRECT_URI: &str = "JOHNNYCLOUD_REDIRECT_URI";

/// Environment variable for the post-logout URI.
pub const ENV_SIGNOUT_URI: &str = "JOHNNYCLOUD_SIGNOUT_URI";

/// Environment variable for space-separated OAuth scopes.
pub const ENV_SCOPES: &str = "JOHNNYCLOUD_SCOPES";

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("johnnycloud/", env!("CARGO_PKG_VERSION"));

/// Timeout applied to provider HTTP calls, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
