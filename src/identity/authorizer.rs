use serde::{Deserialize, Serialize};

use super::session::{Session, SessionStatus, SessionStore};
use crate::routes::{BUYER_HOME, FOUNDER_HOME, LANDING_PATH};

/// Capability class of an authenticated account. Anything the backend
/// hands us that is not `founder` or `buyer` lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Founder,
    Buyer,
    Unknown,
}

impl Role {
    pub fn parse(s: &str) -> Role {
        match s.trim().to_ascii_lowercase().as_str() {
            "founder" => Role::Founder,
            "buyer" => Role::Buyer,
            _ => Role::Unknown,
        }
    }

    /// Role claimed by a free-form metadata value. Blank means no claim.
    pub fn from_claim(s: &str) -> Option<Role> {
        if s.trim().is_empty() { None } else { Some(Role::parse(s)) }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Founder => "founder",
            Role::Buyer => "buyer",
            Role::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool { !matches!(self, Role::Unknown) }

    pub fn home_path(&self) -> Option<&'static str> {
        match self {
            Role::Founder => Some(FOUNDER_HOME),
            Role::Buyer => Some(BUYER_HOME),
            Role::Unknown => None,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self { Role::parse(&s) }
}

impl From<Role> for String {
    fn from(r: Role) -> Self { r.as_str().to_string() }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    Render,
    Redirect(&'static str),
}

/// Render-or-redirect for a navigation that may declare a required role.
pub fn evaluate(session: &Session, required: Option<Role>) -> GuardDecision {
    if session.status != SessionStatus::Resolved {
        return GuardDecision::Loading;
    }
    if session.identity.is_none() {
        return GuardDecision::Redirect(LANDING_PATH);
    }
    let Some(required) = required else { return GuardDecision::Render; };
    let actual = session.effective_role();
    match actual {
        Some(r) if r.is_known() && r == required => GuardDecision::Render,
        Some(r) => GuardDecision::Redirect(r.home_path().unwrap_or(LANDING_PATH)),
        None => GuardDecision::Redirect(LANDING_PATH),
    }
}

/// Re-evaluate on every store change until the guard stops asking for the
/// loading state.
pub async fn wait_for_decision(store: &SessionStore, required: Option<Role>) -> GuardDecision {
    let session = store.wait_until(|s| evaluate(s, required) != GuardDecision::Loading).await;
    evaluate(&session, required)
}
