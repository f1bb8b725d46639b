//! Constants for the johnnycloud-signing crate.

/// Target header value for the identity-id lookup call.
pub const TARGET_GET_ID: &str = "AWSCognitoIdentityService.GetId";

/// Target header value for the credential exchange call.
pub const TARGET_GET_CREDENTIALS: &str = "AWSCognitoIdentityService.GetCredentialsForIdentity";

/// Content type of the identity service's JSON-RPC protocol.
pub const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Service name used in the signing scope for backend function calls.
pub const DEFAULT_SERVICE: &str = "lambda";

/// Environment variable for the AWS region.
pub const ENV_REGION: &str = "JOHNNYCLOUD_AWS_REGION";

/// Environment variable for the user pool ID.
pub const ENV_USER_POOL_ID: &str = "JOHNNYCLOUD_USER_POOL_ID";

/// Environment variable for the identity pool ID.
pub const ENV_IDENTITY_POOL_ID: &str = "JOHNNYCLOUD_IDENTITY_POOL_ID";
