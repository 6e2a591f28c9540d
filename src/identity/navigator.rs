use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::routes::LANDING_PATH;

/// Where the embedding UI (or binary) actually moves the client.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
    /// Full reload; no in-memory state survives.
    fn reload(&self);
}

/// Navigator for headless runs: tracks the location and logs moves.
pub struct TracingNavigator {
    location: RwLock<String>,
    reloads: AtomicU64,
}

impl Default for TracingNavigator {
    fn default() -> Self { Self { location: RwLock::new(LANDING_PATH.to_string()), reloads: AtomicU64::new(0) } }
}

impl TracingNavigator {
    pub fn new() -> Self { Self::default() }
    pub fn location(&self) -> String { self.location.read().clone() }
    pub fn reloads(&self) -> u64 { self.reloads.load(Ordering::Relaxed) }
}

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        let mut loc = self.location.write();
        info!(target: "ethaum::nav", from=%loc.as_str(), to=%path, "navigate");
        *loc = path.to_string();
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
        info!(target: "ethaum::nav", location=%self.location(), "reload");
    }
}
