//! Scriptable collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use ethaum::identity::{
    AuthChange, AuthEvent, AuthProvider, AuthSession, Navigator, Role, RoleDirectory, UserId,
};
use ethaum::{AuthError, AuthResult};

pub fn credential(user: &str, claimed: &str) -> AuthSession {
    AuthSession::new(UserId::new(user), format!("token-{user}")).with_metadata_role(claimed)
}

/// Provider whose persisted session, failures and events are driven by the test.
pub struct ScriptedProvider {
    session: Mutex<Option<AuthSession>>,
    fail_current: AtomicBool,
    fail_sign_out: AtomicBool,
    sign_outs: AtomicUsize,
    events: broadcast::Sender<AuthEvent>,
}

impl ScriptedProvider {
    pub fn new(session: Option<AuthSession>) -> Arc<Self> { Self::with_capacity(session, 16) }

    pub fn with_capacity(session: Option<AuthSession>, capacity: usize) -> Arc<Self> {
        let (events, _) = broadcast::channel(capacity);
        Arc::new(Self {
            session: Mutex::new(session),
            fail_current: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            sign_outs: AtomicUsize::new(0),
            events,
        })
    }

    pub fn fail_current(&self, on: bool) { self.fail_current.store(on, Ordering::SeqCst); }
    pub fn fail_sign_out(&self, on: bool) { self.fail_sign_out.store(on, Ordering::SeqCst); }
    pub fn sign_outs(&self) -> usize { self.sign_outs.load(Ordering::SeqCst) }

    /// Update the backing session and push the matching event. Returns receivers reached.
    pub fn emit(&self, change: AuthChange, session: Option<AuthSession>) -> usize {
        *self.session.lock() = session.clone();
        self.events.send(AuthEvent { change, session }).unwrap_or(0)
    }
}

#[async_trait]
impl AuthProvider for ScriptedProvider {
    async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(AuthError::transport("unreachable", "auth backend down"));
        }
        Ok(self.session.lock().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> { self.events.subscribe() }

    async fn sign_out(&self) -> AuthResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::transport("unreachable", "sign-out request failed"));
        }
        *self.session.lock() = None;
        Ok(())
    }
}

/// Directory with per-user answers, optional delay, and per-user gates the
/// test releases explicitly.
#[derive(Default)]
pub struct ScriptedDirectory {
    answers: Mutex<HashMap<UserId, AuthResult<Option<Role>>>>,
    gates: Mutex<HashMap<UserId, Arc<Notify>>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl ScriptedDirectory {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn answer(&self, user: &str, role: Option<Role>) { self.answers.lock().insert(UserId::new(user), Ok(role)); }
    pub fn fail(&self, user: &str) {
        self.answers.lock().insert(UserId::new(user), Err(AuthError::directory("profile_lookup_failed", "HTTP 503")));
    }
    pub fn delay(&self, d: Duration) { *self.delay.lock() = Some(d); }
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn gate(&self, user: &str) { self.gates.lock().insert(UserId::new(user), Arc::new(Notify::new())); }
    pub fn release(&self, user: &str) {
        if let Some(n) = self.gates.lock().get(&UserId::new(user)) {
            n.notify_one();
        }
    }
}

#[async_trait]
impl RoleDirectory for ScriptedDirectory {
    async fn lookup_role(&self, user: &UserId) -> AuthResult<Option<Role>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().get(user).cloned();
        if let Some(g) = gate {
            g.notified().await;
        }
        let delay = *self.delay.lock();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let answer = self.answers.lock().get(user).cloned();
        answer.unwrap_or(Ok(None))
    }
}

/// Records every navigation and reload, in order.
#[derive(Default)]
pub struct RecordingNavigator {
    log: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }
    pub fn log(&self) -> Vec<String> { self.log.lock().clone() }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) { self.log.lock().push(format!("navigate {path}")); }
    fn reload(&self) { self.log.lock().push("reload".to_string()); }
}
