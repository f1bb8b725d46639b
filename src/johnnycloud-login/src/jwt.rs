//! Tolerant JWT payload decoding.
//!
//! Decodes the claims segment of an identity token without verifying the
//! signature; the token was received over TLS from the issuer and is only
//! inspected locally for expiry and display fields. Anything that does not
//! parse as three dot-separated base64url segments with a JSON payload is
//! treated as absent, so malformed local state degrades to "logged out"
//! instead of crashing the caller.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::types::IdentityClaims;

/// Typed view of the claims this application reads.
///
/// `exp` is mandatory: a token without an expiry cannot be judged valid.
/// Every identity field is optional and validated here, at the parse
/// boundary, so downstream code never probes for field presence.
#[derive(Debug, serde::Deserialize)]
struct RawClaims {
    exp: i64,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default, rename = "custom:Display_Name")]
    custom_display_name: Option<String>,
    #[serde(default, rename = "cognito:username")]
    username: Option<String>,
}

/// Decode the payload segment of `token` into identity claims.
///
/// Returns `None` for anything other than a well-formed three-segment
/// token with a JSON object payload carrying a numeric `exp`.
pub fn decode_claims(token: &str) -> Option<IdentityClaims> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    // Tokens are unpadded base64url, but tolerate encoders that pad.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let raw: RawClaims = serde_json::from_slice(&bytes).ok()?;

    let subject = raw.sub.clone().unwrap_or_default();
    let account = raw.username.clone().or_else(|| raw.sub.clone());
    let display_name = resolve_display_name(&raw);

    Some(IdentityClaims {
        subject,
        email: raw.email,
        display_name,
        account,
        expires_at: raw.exp,
    })
}

/// Expiry of `token` in seconds since epoch, if decodable.
pub fn expiry_epoch(token: &str) -> Option<i64> {
    decode_claims(token).map(|c| c.expires_at)
}

/// Resolve a display name through the provider's naming claims, most
/// specific first.
fn resolve_display_name(raw: &RawClaims) -> Option<String> {
    if let Some(name) = non_blank(&raw.custom_display_name) {
        return Some(name);
    }
    if let Some(name) = non_blank(&raw.preferred_username) {
        return Some(name);
    }

    let full_name = [raw.given_name.as_deref(), raw.family_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let full_name = full_name.trim();
    if !full_name.is_empty() {
        return Some(full_name.to_string());
    }

    non_blank(&raw.name).or_else(|| non_blank(&raw.email))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
pub(crate) fn make_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{header}.{body}.fake-signature")
}
