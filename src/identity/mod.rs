//! Session resolution and role-based access control for the dashboards.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod coordinator;
mod credential;
mod directory;
mod initializer;
mod listener;
mod navigator;
mod provider;
mod session;
mod signout;

pub use authorizer::{evaluate, wait_for_decision, GuardDecision, Role};
pub use coordinator::{CoordinatorOptions, SessionCoordinator};
pub use credential::{decode_claims, AuthSession, TokenClaims, UserId, UserMetadata};
pub use directory::{parse_profile_rows, RestRoleDirectory, RoleDirectory, StaticRoleDirectory};
pub use initializer::{RoleVerifier, SessionInitializer};
pub use listener::{apply_event, ListenerHandle, SessionChangeListener};
pub use navigator::{Navigator, TracingNavigator};
pub use provider::{AuthChange, AuthEvent, AuthProvider, LocalAuthProvider};
pub use session::{Session, SessionPatch, SessionStatus, SessionStore};
pub use signout::SignOutCoordinator;
