//! Identity verification seam.
//!
//! Chat and history are scoped to the session identity returned by an
//! [`IdentityVerifier`]. Token issuance lives outside this workspace.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The caller identity a verified token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Opaque key into the session store (the authenticated username).
    pub session_id: String,
}

impl SessionIdentity {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The token was rejected. Never retried automatically.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The verifier could not be reached.
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves an opaque bearer token to a [`SessionIdentity`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SessionIdentity, IdentityError>;
}

/// Extracts the token from either a raw token or an `Authorization` header value.
///
/// `"Bearer abc"` yields `"abc"`, a bare `"abc"` is returned unchanged, and a
/// value carrying any other scheme (`"Basic abc"`) is rejected.
pub fn extract_bearer_token(value: &str) -> Result<&str, IdentityError> {
    let value = value.trim();
    if value.is_empty() || value == "Bearer" {
        return Err(IdentityError::Unauthorized("Missing token".into()));
    }
    match value.split_once(' ') {
        Some(("Bearer", token)) => Ok(token.trim()),
        Some(_) => Err(IdentityError::Unauthorized("Invalid token format".into())),
        None => Ok(value),
    }
}
