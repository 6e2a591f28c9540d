use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::authorizer::Role;
use super::credential::UserId;
use super::directory::RoleDirectory;
use super::provider::AuthProvider;
use super::session::{Session, SessionPatch, SessionStatus, SessionStore};
use crate::error::AuthError;

/// Role lookups against the system of record, with an optional deadline.
#[derive(Clone)]
pub struct RoleVerifier {
    directory: Arc<dyn RoleDirectory>,
    timeout: Option<Duration>,
}

impl RoleVerifier {
    pub fn new(directory: Arc<dyn RoleDirectory>, timeout: Option<Duration>) -> Self { Self { directory, timeout } }

    /// Verified role, or `None` when the lookup fails, times out, or finds nothing.
    pub async fn verify(&self, user: &UserId) -> Option<Role> {
        let lookup = self.directory.lookup_role(user);
        let res = match self.timeout {
            Some(t) => match tokio::time::timeout(t, lookup).await {
                Ok(r) => r,
                Err(_) => Err(AuthError::timeout("verify_timeout", format!("role lookup exceeded {}ms", t.as_millis()))),
            },
            None => lookup.await,
        };
        match res {
            Ok(Some(role)) => Some(role),
            Ok(None) => {
                debug!(target: "ethaum::session", user=%user, "directory has no role; keeping claimed role");
                None
            }
            Err(e) => {
                warn!(target: "ethaum::session", user=%user, error=%e, "role verification failed; keeping claimed role");
                None
            }
        }
    }

    /// Verify and write the result, but only if `user` is still the active
    /// identity at `epoch`. Stale results are dropped.
    pub async fn verify_and_apply(&self, store: &SessionStore, user: UserId, epoch: u64) -> bool {
        let verified = self.verify(&user).await;
        let mut patch = SessionPatch::new().status(SessionStatus::Resolved);
        if verified.is_some() {
            patch = patch.verified_role(verified);
        }
        let applied = store.apply_if_current(epoch, Some(&user), patch);
        if !applied {
            debug!(target: "ethaum::session", user=%user, epoch, "discarding stale role verification");
        }
        applied
    }
}

/// Boot-time resolution of a persisted session.
pub struct SessionInitializer {
    store: SessionStore,
    provider: Arc<dyn AuthProvider>,
    verifier: Option<RoleVerifier>,
}

impl SessionInitializer {
    /// `verifier = None` is the claimed-only mode: no directory round trip.
    pub fn new(store: SessionStore, provider: Arc<dyn AuthProvider>, verifier: Option<RoleVerifier>) -> Self {
        Self { store, provider, verifier }
    }

    pub async fn run(&self) -> Session {
        let start = self.store.begin_resolving();

        let persisted = match self.provider.current_session().await {
            Ok(s) => s,
            Err(e) if e.is_credential() => {
                info!(target: "ethaum::session", error=%e, "persisted session unusable; treating as signed out");
                None
            }
            Err(e) => {
                warn!(target: "ethaum::session", error=%e, "session lookup failed; treating as signed out");
                None
            }
        };

        // Anything written since `start` came from the listener and is newer
        // than what we just read.
        let Some(auth) = persisted else {
            if !self.store.apply_if_current(start.epoch, start.identity.as_ref(), SessionPatch::signed_out()) {
                debug!(target: "ethaum::session", "session changed while resolving; keeping newer state");
            }
            return self.store.mark_resolved();
        };

        let user = auth.user_id.clone();
        let claimed = auth.claimed_role();
        if !self.store.apply_if_current(start.epoch, start.identity.as_ref(), SessionPatch::credential(user.clone(), claimed)) {
            debug!(target: "ethaum::session", user=%user, "session changed while resolving; keeping newer state");
            return self.store.mark_resolved();
        }
        let epoch = self.store.read().epoch;
        info!(target: "ethaum::session", user=%user, claimed=?claimed, "restored persisted session");

        if let Some(v) = &self.verifier {
            v.verify_and_apply(&self.store, user, epoch).await;
        }
        self.store.mark_resolved()
    }
}
