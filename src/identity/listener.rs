use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use super::credential::AuthSession;
use super::initializer::RoleVerifier;
use super::provider::{AuthEvent, AuthProvider};
use super::session::{Session, SessionPatch, SessionStatus, SessionStore};

/// Live subscription to provider events. Dropping it unsubscribes and
/// cancels any verification it started.
pub struct ListenerHandle {
    task: Option<JoinHandle<()>>,
    verifications: Arc<Mutex<JoinSet<()>>>,
}

impl ListenerHandle {
    pub fn is_active(&self) -> bool { self.task.as_ref().is_some_and(|t| !t.is_finished()) }

    /// Verifications started by events and not yet finished.
    pub fn pending_verifications(&self) -> usize {
        let mut set = self.verifications.lock();
        while set.try_join_next().is_some() {}
        set.len()
    }

    /// Stop the listener and wait for its task to wind down.
    pub async fn shutdown(mut self) {
        self.verifications.lock().abort_all();
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            debug!(target: "ethaum::listener", "auth listener stopped");
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.verifications.lock().abort_all();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct SessionChangeListener;

impl SessionChangeListener {
    /// Subscribe now and keep `store` in sync until the handle goes away.
    /// Must be called inside a tokio runtime.
    pub fn attach(store: SessionStore, provider: Arc<dyn AuthProvider>, verifier: Option<RoleVerifier>) -> ListenerHandle {
        let mut rx = provider.subscribe();
        let verifications = Arc::new(Mutex::new(JoinSet::new()));
        let tasks = verifications.clone();
        let task = tokio::spawn(async move {
            loop {
                let next = match rx.recv().await {
                    Ok(ev) => {
                        debug!(target: "ethaum::listener", change=?ev.change, has_session=ev.session.is_some(), "auth event");
                        Some(ev.session)
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(target: "ethaum::listener", missed, "auth events dropped; resyncing from provider");
                        match provider.current_session().await {
                            Ok(s) => Some(s),
                            Err(e) => {
                                warn!(target: "ethaum::listener", error=%e, "resync failed; treating as signed out");
                                Some(None)
                            }
                        }
                    }
                    Err(RecvError::Closed) => None,
                };
                let Some(session) = next else {
                    debug!(target: "ethaum::listener", "auth event stream closed");
                    break;
                };
                {
                    let mut set = tasks.lock();
                    apply_session(&store, verifier.as_ref(), &mut set, session);
                }
            }
        });
        ListenerHandle { task: Some(task), verifications }
    }
}

/// Apply one provider event to the store. Verification for a new identity
/// is spawned into `verifications`.
pub fn apply_event(
    store: &SessionStore,
    verifier: Option<&RoleVerifier>,
    verifications: &mut JoinSet<()>,
    event: AuthEvent,
) -> Session {
    debug!(target: "ethaum::listener", change=?event.change, has_session=event.session.is_some(), "auth event");
    apply_session(store, verifier, verifications, event.session)
}

fn apply_session(
    store: &SessionStore,
    verifier: Option<&RoleVerifier>,
    verifications: &mut JoinSet<()>,
    session: Option<AuthSession>,
) -> Session {
    let Some(auth) = session else { return store.clear(); };
    let before_epoch = store.read().epoch;
    let user = auth.user_id.clone();
    let after = store.update(
        SessionPatch::credential(user.clone(), auth.claimed_role()).status(SessionStatus::Resolved),
    );
    if after.epoch != before_epoch {
        if let Some(v) = verifier {
            while verifications.try_join_next().is_some() {}
            let (v, store, epoch) = (v.clone(), store.clone(), after.epoch);
            verifications.spawn(async move {
                v.verify_and_apply(&store, user, epoch).await;
            });
        }
    }
    after
}
