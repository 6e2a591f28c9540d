//! System-of-record role lookups.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use super::authorizer::Role;
use super::credential::UserId;
use crate::error::{AuthError, AuthResult};

#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Authoritative role for `user`; `Ok(None)` when the record has none.
    async fn lookup_role(&self, user: &UserId) -> AuthResult<Option<Role>>;
}

/// In-memory directory, for local runs and tests.
#[derive(Default)]
pub struct StaticRoleDirectory {
    roles: RwLock<HashMap<UserId, Role>>,
}

impl StaticRoleDirectory {
    pub fn new() -> Self { Self::default() }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let roles = pairs.into_iter()
            .map(|(k, v)| (UserId::new(k.as_ref()), Role::parse(v.as_ref())))
            .collect();
        Self { roles: RwLock::new(roles) }
    }

    pub fn set(&self, user: UserId, role: Role) { self.roles.write().insert(user, role); }
    pub fn remove(&self, user: &UserId) -> Option<Role> { self.roles.write().remove(user) }
}

#[async_trait]
impl RoleDirectory for StaticRoleDirectory {
    async fn lookup_role(&self, user: &UserId) -> AuthResult<Option<Role>> {
        Ok(self.roles.read().get(user).copied())
    }
}

/// Reads `profiles.role` over the backend's REST interface.
pub struct RestRoleDirectory {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRoleDirectory {
    pub fn new<S: Into<String>>(base_url: S, api_key: S, timeout: Option<Duration>) -> AuthResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()
            .map_err(|e| AuthError::config("http_client", e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url, api_key: api_key.into() })
    }

    pub fn profiles_url(&self) -> String { format!("{}/rest/v1/profiles", self.base_url) }
}

#[async_trait]
impl RoleDirectory for RestRoleDirectory {
    async fn lookup_role(&self, user: &UserId) -> AuthResult<Option<Role>> {
        let resp = self.client
            .get(self.profiles_url())
            .query(&[("id", format!("eq.{}", user)), ("select", "role".to_string())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::directory("profile_lookup_failed", format!("profiles returned HTTP {}", status.as_u16())));
        }
        let body = resp.text().await?;
        let role = parse_profile_rows(&body)?;
        debug!(target: "ethaum::directory", user=%user, role=?role, "profile role fetched");
        Ok(role)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    role: Option<String>,
}

/// `[{"role": "founder"}]` → founder; `[]` or a null role → none.
pub fn parse_profile_rows(body: &str) -> AuthResult<Option<Role>> {
    let rows: Vec<ProfileRow> = serde_json::from_str(body)
        .map_err(|e| AuthError::directory("malformed_profile", e.to_string()))?;
    Ok(rows.into_iter().next().and_then(|r| r.role).and_then(|r| Role::from_claim(&r)))
}
