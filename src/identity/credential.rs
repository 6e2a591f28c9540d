use base64::Engine;
use serde::{Deserialize, Serialize};

use super::authorizer::Role;
use crate::error::{AuthError, AuthResult};

/// Opaque user identifier issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new<S: Into<String>>(s: S) -> Self { UserId(s.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMetadata {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub startup_name: Option<String>,
}

/// Credential handed out by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: UserId,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}

impl AuthSession {
    pub fn new<S: Into<String>>(user_id: UserId, access_token: S) -> Self {
        Self { user_id, access_token: access_token.into(), refresh_token: None, expires_at: None, user_metadata: None }
    }

    pub fn with_metadata_role(mut self, role: &str) -> Self {
        let mut md = self.user_metadata.take().unwrap_or_default();
        md.role = Some(role.to_string());
        self.user_metadata = Some(md);
        self
    }

    /// Role asserted by the credential itself. Metadata wins; otherwise the
    /// access token's `user_metadata.role` claim. No network involved.
    pub fn claimed_role(&self) -> Option<Role> {
        if let Some(md) = &self.user_metadata {
            if let Some(r) = md.role.as_deref() {
                return Role::from_claim(r);
            }
        }
        decode_claims(&self.access_token)
            .ok()
            .and_then(|c| c.user_metadata)
            .and_then(|m| m.role)
            .and_then(|r| Role::from_claim(&r))
    }

    /// Expiry from the explicit field, falling back to the token's `exp`.
    pub fn expiry(&self) -> Option<i64> {
        self.expires_at.or_else(|| decode_claims(&self.access_token).ok().and_then(|c| c.exp))
    }

    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        matches!(self.expiry(), Some(exp) if exp <= now_secs)
    }
}

/// The subset of JWT claims the session core reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}

/// Decode the payload segment of a JWT. The signature is not checked; the
/// result is only ever used as a claim, never as proof.
pub fn decode_claims(token: &str) -> AuthResult<TokenClaims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::credential("malformed_token", "expected three dot-separated segments"));
    };
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::credential("malformed_token", e.to_string()))?;
    Ok(serde_json::from_slice::<TokenClaims>(&bytes)?)
}
