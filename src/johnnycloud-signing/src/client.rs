//! Signed calls to backend functions.
//!
//! Wraps a [`CredentialBroker`] and a signing scope. Each call signs with
//! the cached federated credential, re-deriving it when absent or expired
//! before anything is sent: dispatching with a known-expired credential
//! wastes a round trip and leaks validity timing. One re-derivation retry
//! is permitted per logical call after an authorization failure; a second
//! consecutive failure is surfaced as [`AuthError::SignedCallFailed`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use johnnycloud_login::AuthError;
use johnnycloud_login::constants::{HTTP_TIMEOUT_SECS, USER_AGENT};

use crate::federation::{CredentialBroker, FederatedCredential};
use crate::sigv4::{SigningScope, signing_headers_at};

/// HTTP client that signs every request with derived cloud credentials.
pub struct SignedClient {
    broker: CredentialBroker,
    scope: SigningScope,
    http: reqwest::Client,
    credential: Option<FederatedCredential>,
}

impl SignedClient {
    /// # Errors
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be built.
    pub fn new(broker: CredentialBroker, scope: SigningScope) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            broker,
            scope,
            http,
            credential: None,
        })
    }

    /// Issue a signed call, deriving credentials from `id_token` as needed.
    ///
    /// `headers` are attached verbatim but not covered by the signature.
    /// A cancelled `cancel` token aborts the call with
    /// [`AuthError::Aborted`]; an aborted call never performs the
    /// re-derivation retry. Responses other than 401/403 are returned
    /// as-is, including server errors; only authorization failures
    /// participate in the retry.
    pub async fn call(
        &mut self,
        method: reqwest::Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        id_token: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<reqwest::Response, AuthError> {
        let url = url::Url::parse(url)
            .map_err(|e| AuthError::InvalidConfig(format!("invalid request URL: {e}")))?;

        check_abort(cancel)?;

        let skew = self.broker.config().clock_skew_secs;
        if !matches!(&self.credential, Some(c) if !c.is_expired(skew)) {
            self.credential = Some(self.broker.derive_credentials(id_token).await?);
        }

        let response = self
            .dispatch(method.clone(), &url, headers, body, cancel)
            .await?;
        if !is_auth_failure(response.status()) {
            return Ok(response);
        }

        // One re-derivation retry: the credential may have been revoked or
        // expired server-side between derivation and dispatch.
        tracing::debug!(status = %response.status(), "signed call failed authorization, re-deriving once");
        check_abort(cancel)?;
        self.credential = Some(self.broker.derive_credentials(id_token).await?);

        let retried = self.dispatch(method, &url, headers, body, cancel).await?;
        if is_auth_failure(retried.status()) {
            let status = retried.status();
            let body = retried.text().await.unwrap_or_default();
            return Err(AuthError::SignedCallFailed {
                detail: format!("{status}: {body}"),
            });
        }
        Ok(retried)
    }

    async fn dispatch(
        &self,
        method: reqwest::Method,
        url: &url::Url,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        cancel: Option<&CancellationToken>,
    ) -> Result<reqwest::Response, AuthError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(AuthError::IdentityTokenExpired)?;

        let payload = body.unwrap_or_default();
        let signature_headers = signing_headers_at(
            credential,
            &self.scope,
            &method,
            url,
            payload,
            chrono::Utc::now(),
        )?;

        let mut request = self.http.request(method, url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        for (name, value) in &signature_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let send = request.send();
        match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(AuthError::Aborted),
                response = send => Ok(response?),
            },
            None => Ok(send.await?),
        }
    }
}

fn is_auth_failure(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
}

fn check_abort(cancel: Option<&CancellationToken>) -> Result<(), AuthError> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(AuthError::Aborted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TARGET_GET_CREDENTIALS, TARGET_GET_ID};
    use crate::federation::FederationConfig;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FAR_FUTURE: i64 = 4_102_444_800;

    fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.fake-signature")
    }

    fn id_token() -> String {
        make_token(&json!({"exp": FAR_FUTURE, "sub": "abc"}))
    }

    /// Mount GetId + GetCredentialsForIdentity, each expecting `derives` calls.
    async fn mount_federation(server: &MockServer, derives: u64, expiration: f64) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", TARGET_GET_ID))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                json!({"IdentityId": "us-east-1:ident-1"}).to_string(),
                "application/json",
            ))
            .expect(derives)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", TARGET_GET_CREDENTIALS))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                json!({
                    "IdentityId": "us-east-1:ident-1",
                    "Credentials": {
                        "AccessKeyId": "ASIAEXAMPLE",
                        "SecretKey": "secret-key",
                        "SessionToken": "session-token",
                        "Expiration": expiration,
                    },
                })
                .to_string(),
                "application/json",
            ))
            .expect(derives)
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> SignedClient {
        let broker = CredentialBroker::with_endpoint(
            FederationConfig::new("us-east-1", "us-east-1_POOL", "us-east-1:identity-pool"),
            server.uri(),
        )
        .unwrap();
        SignedClient::new(broker, SigningScope::lambda("us-east-1")).unwrap()
    }

    #[tokio::test]
    async fn test_signed_call_attaches_signature() {
        let server = MockServer::start().await;
        mount_federation(&server, 1, FAR_FUTURE as f64).await;

        Mock::given(method("GET"))
            .and(path("/metrics"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header("x-amz-security-token", "session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let response = client
            .call(
                reqwest::Method::GET,
                &format!("{}/metrics", server.uri()),
                &[("accept", "application/json")],
                None,
                &id_token(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_credential_cached_across_calls() {
        let server = MockServer::start().await;
        mount_federation(&server, 1, FAR_FUTURE as f64).await;

        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let url = format!("{}/metrics", server.uri());
        for _ in 0..2 {
            client
                .call(reqwest::Method::GET, &url, &[], None, &id_token(), None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_expired_credential_rederived_before_dispatch() {
        let server = MockServer::start().await;
        // Every derivation hands back an already-expired credential, so
        // each call re-derives instead of dispatching with a stale one.
        mount_federation(&server, 2, 0.0).await;

        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let url = format!("{}/metrics", server.uri());
        for _ in 0..2 {
            client
                .call(reqwest::Method::GET, &url, &[], None, &id_token(), None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_auth_failure_retries_once_then_succeeds() {
        let server = MockServer::start().await;
        mount_federation(&server, 2, FAR_FUTURE as f64).await;

        Mock::given(method("POST"))
            .and(path("/invoke"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/invoke"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let response = client
            .call(
                reqwest::Method::POST,
                &format!("{}/invoke", server.uri()),
                &[],
                Some(br#"{"q":"spend"}"#),
                &id_token(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_second_auth_failure_surfaces_signed_call_failed() {
        let server = MockServer::start().await;
        // Initial derivation plus exactly one retry derivation.
        mount_federation(&server, 2, FAR_FUTURE as f64).await;

        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(403).set_body_raw("denied", "text/plain"))
            .expect(2)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client
            .call(
                reqwest::Method::GET,
                &format!("{}/metrics", server.uri()),
                &[],
                None,
                &id_token(),
                None,
            )
            .await
            .unwrap_err();
        match err {
            AuthError::SignedCallFailed { detail } => assert!(detail.contains("denied")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_returned_without_retry() {
        let server = MockServer::start().await;
        mount_federation(&server, 1, FAR_FUTURE as f64).await;

        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let response = client
            .call(
                reqwest::Method::GET,
                &format!("{}/metrics", server.uri()),
                &[],
                None,
                &id_token(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn test_pre_cancelled_call_aborts_without_traffic() {
        let server = MockServer::start().await;
        mount_federation(&server, 0, FAR_FUTURE as f64).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut client = client_for(&server);
        let err = client
            .call(
                reqwest::Method::GET,
                &format!("{}/metrics", server.uri()),
                &[],
                None,
                &id_token(),
                Some(&cancel),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Aborted));
    }

    #[tokio::test]
    async fn test_abort_in_flight_skips_retry_derivation() {
        let server = MockServer::start().await;
        // Only the initial derivation: the aborted call must not re-derive.
        mount_federation(&server, 1, FAR_FUTURE as f64).await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let mut client = client_for(&server);
        let url = format!("{}/slow", server.uri());
        let token = id_token();

        let call = client.call(reqwest::Method::GET, &url, &[], None, &token, Some(&cancel));
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        };

        let (result, ()) = tokio::join!(call, canceller);
        assert!(matches!(result.unwrap_err(), AuthError::Aborted));
    }
}
