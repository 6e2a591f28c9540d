use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::directory::RoleDirectory;
use super::initializer::{RoleVerifier, SessionInitializer};
use super::listener::{ListenerHandle, SessionChangeListener};
use super::navigator::Navigator;
use super::provider::AuthProvider;
use super::session::{Session, SessionStore};
use super::signout::SignOutCoordinator;
use crate::config::EffectiveConfig;
use crate::routes::{Navigation, RouteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// `false` trusts the claimed role only and never calls the directory.
    pub verify_roles: bool,
    pub verify_timeout: Option<Duration>,
}

impl Default for CoordinatorOptions {
    fn default() -> Self { Self { verify_roles: true, verify_timeout: None } }
}

impl From<&EffectiveConfig> for CoordinatorOptions {
    fn from(cfg: &EffectiveConfig) -> Self {
        Self { verify_roles: cfg.verify_roles, verify_timeout: cfg.verify_timeout() }
    }
}

/// Owns one application instance's session lifecycle: `boot` once, read
/// and navigate any number of times, `shutdown` at the end.
pub struct SessionCoordinator {
    store: SessionStore,
    provider: Arc<dyn AuthProvider>,
    verifier: Option<RoleVerifier>,
    navigator: Arc<dyn Navigator>,
    routes: RouteTable,
    listener: Mutex<Option<ListenerHandle>>,
    booted: AtomicBool,
}

impl SessionCoordinator {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        directory: Arc<dyn RoleDirectory>,
        navigator: Arc<dyn Navigator>,
        opts: CoordinatorOptions,
    ) -> Self {
        let verifier = opts.verify_roles.then(|| RoleVerifier::new(directory, opts.verify_timeout));
        Self {
            store: SessionStore::new(),
            provider,
            verifier,
            navigator,
            routes: RouteTable::default(),
            listener: Mutex::new(None),
            booted: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &SessionStore { &self.store }
    pub fn routes(&self) -> &RouteTable { &self.routes }
    pub fn session(&self) -> Session { self.store.read() }

    /// Subscribe to provider events, then resolve any persisted session.
    /// A second call is a no-op returning the current snapshot.
    pub async fn boot(&self) -> Session {
        if self.booted.swap(true, Ordering::AcqRel) {
            debug!(target: "ethaum::session", "boot called twice; ignoring");
            return self.store.read();
        }
        let handle = SessionChangeListener::attach(self.store.clone(), self.provider.clone(), self.verifier.clone());
        *self.listener.lock() = Some(handle);
        let init = SessionInitializer::new(self.store.clone(), self.provider.clone(), self.verifier.clone());
        let s = init.run().await;
        info!(
            target: "ethaum::session",
            signed_in=s.is_signed_in(), role=?s.effective_role(), verified=s.verified_role.is_some(),
            "session resolved"
        );
        s
    }

    pub fn is_listening(&self) -> bool { self.listener.lock().as_ref().is_some_and(|h| h.is_active()) }

    /// Current decision for `path`; may be `Loading`.
    pub fn navigate(&self, path: &str) -> Navigation {
        self.routes.navigate(&self.store.read(), path)
    }

    /// Decision for `path` once it no longer depends on an unresolved session.
    pub async fn navigate_when_ready(&self, path: &str) -> Navigation {
        let s = self.store.wait_until(|s| self.routes.navigate(s, path) != Navigation::Loading).await;
        self.routes.navigate(&s, path)
    }

    /// Ends this instance's session. The listener is stopped first so no
    /// queued event or in-flight verification can repopulate the store; a
    /// fresh instance boots after the reload.
    pub async fn sign_out(&self) -> Session {
        self.shutdown().await;
        SignOutCoordinator::new(self.store.clone(), self.provider.clone(), self.navigator.clone())
            .sign_out()
            .await
    }

    /// Release the provider subscription.
    pub async fn shutdown(&self) {
        let handle = self.listener.lock().take();
        if let Some(h) = handle {
            debug!(target: "ethaum::session", pending=h.pending_verifications(), "releasing auth listener");
            h.shutdown().await;
        }
    }
}

impl SessionCoordinator {
    pub fn from_config(
        cfg: &EffectiveConfig,
        provider: Arc<dyn AuthProvider>,
        directory: Arc<dyn RoleDirectory>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(provider, directory, navigator, CoordinatorOptions::from(cfg))
    }
}
