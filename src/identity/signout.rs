use std::sync::Arc;

use tracing::{info, warn};

use super::navigator::Navigator;
use super::provider::AuthProvider;
use super::session::{Session, SessionStore};
use crate::routes::LANDING_PATH;

/// Ends the session: local state first, then the provider, then a hard
/// reload from the landing page.
pub struct SignOutCoordinator {
    store: SessionStore,
    provider: Arc<dyn AuthProvider>,
    navigator: Arc<dyn Navigator>,
}

impl SignOutCoordinator {
    pub fn new(store: SessionStore, provider: Arc<dyn AuthProvider>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, provider, navigator }
    }

    pub async fn sign_out(&self) -> Session {
        let previous = self.store.read().identity;
        let cleared = self.store.clear();
        if let Err(e) = self.provider.sign_out().await {
            warn!(target: "ethaum::signout", error=%e, "provider sign-out failed; local session already cleared");
        }
        info!(target: "ethaum::signout", user=?previous, "signed out");
        self.navigator.navigate(LANDING_PATH);
        self.navigator.reload();
        cleared
    }
}
