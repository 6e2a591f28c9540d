use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::authorizer::Role;
use super::credential::UserId;
use crate::tprintln;

/// Forward-only resolution status. Ordering matters: merges keep the max.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Resolving,
    Resolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub identity: Option<UserId>,
    pub claimed_role: Option<Role>,
    pub verified_role: Option<Role>,
    pub status: SessionStatus,
    /// Bumped on every identity change.
    pub epoch: u64,
}

impl Session {
    /// Verified role when present, otherwise the claimed one.
    pub fn effective_role(&self) -> Option<Role> { self.verified_role.or(self.claimed_role) }
    pub fn is_signed_in(&self) -> bool { self.identity.is_some() }
    pub fn is_resolved(&self) -> bool { self.status == SessionStatus::Resolved }

    pub fn is_signed_out(&self) -> bool {
        self.identity.is_none()
            && self.claimed_role.is_none()
            && self.verified_role.is_none()
            && self.is_resolved()
    }
}

/// Partial session change. `None` leaves a field alone; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub identity: Option<Option<UserId>>,
    pub claimed_role: Option<Option<Role>>,
    pub verified_role: Option<Option<Role>>,
    pub status: Option<SessionStatus>,
}

impl SessionPatch {
    pub fn new() -> Self { Self::default() }

    pub fn signed_out() -> Self {
        Self {
            identity: Some(None),
            claimed_role: Some(None),
            verified_role: Some(None),
            status: Some(SessionStatus::Resolved),
        }
    }

    /// Identity and claimed role as carried by a credential.
    pub fn credential(user: UserId, claimed: Option<Role>) -> Self {
        Self { identity: Some(Some(user)), claimed_role: Some(claimed), ..Default::default() }
    }

    pub fn verified_role(mut self, role: Option<Role>) -> Self { self.verified_role = Some(role); self }
    pub fn status(mut self, status: SessionStatus) -> Self { self.status = Some(status); self }

    /// Merge into `s`, keeping the session invariants. Returns whether anything changed.
    fn merge_into(&self, s: &mut Session) -> bool {
        let before = s.clone();
        if let Some(id) = &self.identity {
            if *id != s.identity {
                s.identity = id.clone();
                s.epoch += 1;
                if self.verified_role.is_none() {
                    s.verified_role = None;
                }
            }
        }
        if let Some(r) = self.claimed_role { s.claimed_role = r; }
        if let Some(r) = self.verified_role { s.verified_role = r; }
        if let Some(st) = self.status {
            if st > s.status { s.status = st; }
        }
        if s.identity.is_none() {
            s.claimed_role = None;
            s.verified_role = None;
        }
        *s != before
    }
}

/// Observable holder of the one current `Session`. Cloning shares the value.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn read(&self) -> Session { self.tx.borrow().clone() }

    /// Merge and notify observers before returning. Returns the new snapshot.
    pub fn update(&self, patch: SessionPatch) -> Session {
        let mut out = Session::default();
        let changed = self.tx.send_if_modified(|s| {
            let changed = patch.merge_into(s);
            out = s.clone();
            changed
        });
        if changed {
            debug!(
                target: "ethaum::session",
                identity=?out.identity, claimed=?out.claimed_role, verified=?out.verified_role,
                status=?out.status, epoch=out.epoch, "session updated"
            );
        }
        out
    }

    /// Apply only while the store still holds `identity` at `epoch`.
    pub fn apply_if_current(&self, epoch: u64, identity: Option<&UserId>, patch: SessionPatch) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|s| {
            if s.epoch != epoch || s.identity.as_ref() != identity {
                return false;
            }
            applied = true;
            patch.merge_into(s)
        });
        if !applied {
            tprintln!("session.apply_if_current stale epoch={} identity={:?}", epoch, identity);
        }
        applied
    }

    pub fn begin_resolving(&self) -> Session { self.update(SessionPatch::new().status(SessionStatus::Resolving)) }
    pub fn mark_resolved(&self) -> Session { self.update(SessionPatch::new().status(SessionStatus::Resolved)) }
    pub fn clear(&self) -> Session { self.update(SessionPatch::signed_out()) }

    pub fn subscribe(&self) -> watch::Receiver<Session> { self.tx.subscribe() }

    /// Wait for the first snapshot (current included) satisfying `pred`.
    pub async fn wait_until<F>(&self, pred: F) -> Session
    where
        F: Fn(&Session) -> bool,
    {
        let mut rx = self.subscribe();
        loop {
            {
                let s = rx.borrow_and_update();
                if pred(&*s) { return (*s).clone(); }
            }
            if rx.changed().await.is_err() {
                return self.read();
            }
        }
    }
}
