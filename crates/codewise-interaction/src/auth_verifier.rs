//! Identity verifiers.
//!
//! Tokens are opaque to codewise. A verifier turns one into the session
//! identity that chat and history are scoped to.

use async_trait::async_trait;
use codewise_core::CodewiseError;
use codewise_core::config::AuthSettings;
use codewise_core::identity::{IdentityError, IdentityVerifier, SessionIdentity};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const AUTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Verifies tokens against a remote auth service's `GET /me?token=...`.
///
/// 200 with `{ "username": ... }` → identity, any other status →
/// `Unauthorized`, no response at all → `Unavailable`.
#[derive(Debug, Clone)]
pub struct AuthServiceVerifier {
    client: Client,
    base_url: String,
}

impl AuthServiceVerifier {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CodewiseError> {
        let client = Client::builder()
            .timeout(AUTH_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CodewiseError::config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn me_url(&self) -> String {
        format!("{}/me", self.base_url)
    }
}

#[derive(Deserialize)]
struct MeResponse {
    username: String,
}

#[async_trait]
impl IdentityVerifier for AuthServiceVerifier {
    async fn verify(&self, token: &str) -> Result<SessionIdentity, IdentityError> {
        let response = self
            .client
            .get(self.me_url())
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|err| {
                tracing::warn!("[AuthServiceVerifier] request failed: {}", err);
                IdentityError::Unavailable("Auth service unavailable".into())
            })?;

        if response.status() != StatusCode::OK {
            tracing::debug!(
                status = response.status().as_u16(),
                "[AuthServiceVerifier] token rejected"
            );
            return Err(IdentityError::Unauthorized("Invalid token".into()));
        }

        let me: MeResponse = response.json().await.map_err(|err| {
            tracing::warn!("[AuthServiceVerifier] malformed /me response: {}", err);
            IdentityError::Unavailable("Auth service returned a malformed response".into())
        })?;
        Ok(SessionIdentity::new(me.username))
    }
}

/// Accepts a fixed set of usernames; the token is the username.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentityVerifier {
    users: HashSet<String>,
}

impl LocalIdentityVerifier {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for LocalIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<SessionIdentity, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::Unauthorized("Missing token".into()));
        }
        if self.users.contains(token) {
            Ok(SessionIdentity::new(token))
        } else {
            Err(IdentityError::Unauthorized("Invalid token".into()))
        }
    }
}

/// Picks the remote verifier when an auth service URL is configured,
/// otherwise the local one.
pub fn verifier_from_settings(
    settings: &AuthSettings,
) -> Result<Arc<dyn IdentityVerifier>, CodewiseError> {
    match &settings.service_url {
        Some(url) => {
            tracing::info!("[Auth] Using auth service at {}", url);
            Ok(Arc::new(AuthServiceVerifier::new(url.clone())?))
        }
        None => {
            tracing::info!(
                "[Auth] No auth service configured, accepting {} local user(s)",
                settings.local_users.len()
            );
            Ok(Arc::new(LocalIdentityVerifier::new(
                settings.local_users.iter().cloned(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_verifier() {
        let verifier = LocalIdentityVerifier::new(["alice", "bob"]);

        assert_eq!(
            verifier.verify("alice").await.unwrap(),
            SessionIdentity::new("alice")
        );
        assert_eq!(
            verifier.verify("mallory").await,
            Err(IdentityError::Unauthorized("Invalid token".into()))
        );
        assert_eq!(
            verifier.verify("  ").await,
            Err(IdentityError::Unauthorized("Missing token".into()))
        );
    }

    #[test]
    fn test_me_url() {
        let verifier = AuthServiceVerifier::new("http://auth:8000/").unwrap();
        assert_eq!(verifier.me_url(), "http://auth:8000/me");
    }

    #[tokio::test]
    async fn test_unreachable_auth_service_is_unavailable() {
        let verifier = AuthServiceVerifier::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            verifier.verify("alice").await,
            Err(IdentityError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_without_service_use_local_users() {
        let settings = AuthSettings {
            service_url: None,
            local_users: vec!["cli_user".to_string()],
        };
        let verifier = verifier_from_settings(&settings).unwrap();
        assert!(verifier.verify("cli_user").await.is_ok());
        assert!(verifier.verify("someone").await.is_err());
    }
}
