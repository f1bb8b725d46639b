//! AWS Signature Version 4 request signing.
//!
//! Computes the authorization material for one request from the derived
//! credential, the signing scope (region + service), and the request's
//! method, URL, body, and timestamp. The signed header set is fixed:
//! `host`, `x-amz-date`, and `x-amz-security-token`; the token is always
//! present because every credential here is a temporary, federated one.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use johnnycloud_login::AuthError;

use crate::federation::FederatedCredential;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-date;x-amz-security-token";

/// The region/service pair a signature is scoped to.
#[derive(Debug, Clone)]
pub struct SigningScope {
    pub region: String,
    pub service: String,
}

impl SigningScope {
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// Scope for calling backend functions directly.
    pub fn lambda(region: impl Into<String>) -> Self {
        Self::new(region, crate::constants::DEFAULT_SERVICE)
    }

    fn credential_scope(&self, datestamp: &str) -> String {
        format!("{datestamp}/{}/{}/aws4_request", self.region, self.service)
    }
}

/// Compute the headers that authorize one request at the given instant:
/// `x-amz-date`, `x-amz-security-token`, and `authorization`.
///
/// # Errors
/// Returns [`AuthError::InvalidConfig`] if the URL carries no host to
/// sign against.
pub fn signing_headers_at(
    credential: &FederatedCredential,
    scope: &SigningScope,
    method: &reqwest::Method,
    url: &url::Url,
    body: &[u8],
    at: DateTime<Utc>,
) -> Result<Vec<(String, String)>, AuthError> {
    let host = host_header(url)?;
    let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
    let datestamp = at.format("%Y%m%d").to_string();

    let payload_hash = hex::encode(Sha256::digest(body));
    let canonical_headers = format!(
        "host:{host}\nx-amz-date:{amz_date}\nx-amz-security-token:{}\n",
        credential.session_token
    );
    let query = canonical_query(url);
    let canonical_request = [
        method.as_str(),
        url.path(),
        query.as_str(),
        canonical_headers.as_str(),
        SIGNED_HEADERS,
        payload_hash.as_str(),
    ]
    .join("\n");

    let credential_scope = scope.credential_scope(&datestamp);
    let request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    let string_to_sign = [
        ALGORITHM,
        amz_date.as_str(),
        credential_scope.as_str(),
        request_hash.as_str(),
    ]
    .join("\n");

    let signature = hex::encode(sign_with_derived_key(
        &credential.secret_access_key,
        &datestamp,
        scope,
        &string_to_sign,
    ));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        credential.access_key_id
    );

    Ok(vec![
        ("x-amz-date".to_string(), amz_date),
        (
            "x-amz-security-token".to_string(),
            credential.session_token.clone(),
        ),
        ("authorization".to_string(), authorization),
    ])
}

/// The host header value the signature covers: hostname plus any
/// non-default port.
fn host_header(url: &url::Url) -> Result<String, AuthError> {
    let host = url
        .host_str()
        .ok_or_else(|| AuthError::InvalidConfig("request URL has no host".to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Query canonicalization: decode, re-encode with the unreserved set,
/// sort by encoded key then value.
fn canonical_query(url: &url::Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// AWS4 key derivation chain: date, region, service, terminal.
fn sign_with_derived_key(
    secret: &str,
    datestamp: &str,
    scope: &SigningScope,
    string_to_sign: &str,
) -> Vec<u8> {
    let key = hmac_sha256(format!("AWS4{secret}").as_bytes(), datestamp.as_bytes());
    let key = hmac_sha256(&key, scope.region.as_bytes());
    let key = hmac_sha256(&key, scope.service.as_bytes());
    let key = hmac_sha256(&key, b"aws4_request");
    hmac_sha256(&key, string_to_sign.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
