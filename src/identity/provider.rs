use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::credential::AuthSession;
use crate::error::{AuthError, AuthResult};
use crate::tprintln;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthChange {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// Auth state transition pushed by the provider. Only the presence of
/// `session` matters to the store; `change` is informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub change: AuthChange,
    pub session: Option<AuthSession>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Persisted or active session, if any.
    async fn current_session(&self) -> AuthResult<Option<AuthSession>>;
    /// Event stream; dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
    async fn sign_out(&self) -> AuthResult<()>;
}

enum Slot {
    Unloaded,
    Loaded(Option<AuthSession>),
}

/// In-process provider whose credential survives restarts as a JSON file.
pub struct LocalAuthProvider {
    path: Option<PathBuf>,
    slot: RwLock<Slot>,
    events: broadcast::Sender<AuthEvent>,
}

impl LocalAuthProvider {
    pub fn new(path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let slot = if path.is_some() { Slot::Unloaded } else { Slot::Loaded(None) };
        Self { path, slot: RwLock::new(slot), events }
    }

    pub fn in_memory() -> Self { Self::new(None) }

    pub async fn sign_in(&self, session: AuthSession) -> AuthResult<()> {
        self.persist(Some(&session)).await?;
        *self.slot.write() = Slot::Loaded(Some(session.clone()));
        info!(target: "ethaum::provider", user=%session.user_id, "signed in");
        self.emit(AuthChange::SignedIn, Some(session));
        Ok(())
    }

    /// Swap the access token of the current session, keeping the identity.
    pub async fn refresh_token(&self, access_token: String, expires_at: Option<i64>) -> AuthResult<AuthSession> {
        let Some(mut session) = self.load().await? else {
            return Err(AuthError::credential("no_session", "nothing to refresh"));
        };
        session.access_token = access_token;
        session.expires_at = expires_at;
        self.persist(Some(&session)).await?;
        *self.slot.write() = Slot::Loaded(Some(session.clone()));
        debug!(target: "ethaum::provider", user=%session.user_id, "token refreshed");
        self.emit(AuthChange::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    fn emit(&self, change: AuthChange, session: Option<AuthSession>) {
        // no receivers is not an error
        let delivered = self.events.send(AuthEvent { change, session }).unwrap_or(0);
        tprintln!("provider.emit change={:?} receivers={}", change, delivered);
    }

    fn cached(&self) -> Option<Option<AuthSession>> {
        match &*self.slot.read() {
            Slot::Loaded(s) => Some(s.clone()),
            Slot::Unloaded => None,
        }
    }

    fn fill(&self, from_disk: Option<AuthSession>) -> Option<AuthSession> {
        let mut slot = self.slot.write();
        match &*slot {
            // a sign-in raced the disk read; keep it
            Slot::Loaded(s) => s.clone(),
            Slot::Unloaded => {
                *slot = Slot::Loaded(from_disk.clone());
                from_disk
            }
        }
    }

    async fn load(&self) -> AuthResult<Option<AuthSession>> {
        if let Some(s) = self.cached() {
            return Ok(s);
        }
        let Some(path) = self.path.as_ref() else { return Ok(self.fill(None)); };
        let from_disk = match tokio::fs::read(path).await {
            Ok(bytes) => Some(serde_json::from_slice::<AuthSession>(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(self.fill(from_disk))
    }

    async fn persist(&self, session: Option<&AuthSession>) -> AuthResult<()> {
        let Some(path) = self.path.as_ref() else { return Ok(()); };
        match session {
            Some(s) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(dir).await?;
                }
                let tmp = path.with_extension("tmp");
                tokio::fs::write(&tmp, serde_json::to_vec_pretty(s)?).await?;
                tokio::fs::rename(&tmp, path).await?;
            }
            None => match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(session) = self.load().await? else { return Ok(None); };
        if session.is_expired_at(chrono::Utc::now().timestamp()) {
            return Err(AuthError::credential("session_expired", format!("session for {} has expired", session.user_id)));
        }
        Ok(Some(session))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> { self.events.subscribe() }

    async fn sign_out(&self) -> AuthResult<()> {
        self.persist(None).await?;
        *self.slot.write() = Slot::Loaded(None);
        info!(target: "ethaum::provider", "signed out");
        self.emit(AuthChange::SignedOut, None);
        Ok(())
    }
}
