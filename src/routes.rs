//! Route table and navigation decisions for the dashboards.

use crate::identity::{evaluate, GuardDecision, Role, Session};

pub const LANDING_PATH: &str = "/";
pub const AUTH_PATH: &str = "/auth";
pub const UPDATE_PASSWORD_PATH: &str = "/update-password";
pub const FOUNDER_HOME: &str = "/founder/dashboard";
pub const BUYER_HOME: &str = "/buyer/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Landing,
    Auth,
    UpdatePassword,
    StartupDetails,
    FounderDashboard,
    BuyerDashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Renders for anyone, but not before the session is resolved.
    AwaitSession,
    Role(Role),
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub pattern: &'static str,
    pub page: Page,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub page: Page,
    pub access: Access,
    pub path: String,
    pub query: Option<String>,
    /// Value of the `:param` segment, if the pattern has one.
    pub param: Option<String>,
}

impl RouteMatch {
    pub fn auth_intent(&self) -> Option<AuthIntent> {
        (self.page == Page::Auth).then(|| AuthIntent::from_query(self.query.as_deref().unwrap_or("")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Loading,
    Render(RouteMatch),
    Redirect(&'static str),
}

pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            rules: vec![
                RouteRule { pattern: LANDING_PATH, page: Page::Landing, access: Access::Public },
                RouteRule { pattern: AUTH_PATH, page: Page::Auth, access: Access::Public },
                RouteRule { pattern: UPDATE_PASSWORD_PATH, page: Page::UpdatePassword, access: Access::AwaitSession },
                RouteRule { pattern: "/startup/:id", page: Page::StartupDetails, access: Access::Public },
                RouteRule { pattern: FOUNDER_HOME, page: Page::FounderDashboard, access: Access::Role(Role::Founder) },
                RouteRule { pattern: BUYER_HOME, page: Page::BuyerDashboard, access: Access::Role(Role::Buyer) },
            ],
        }
    }
}

impl RouteTable {
    pub fn resolve(&self, raw: &str) -> Option<RouteMatch> {
        let (path, query) = split_path(raw);
        let segs: Vec<&str> = segments(&path).collect();
        for rule in &self.rules {
            let pat: Vec<&str> = segments(rule.pattern).collect();
            if pat.len() != segs.len() { continue; }
            let mut param = None;
            let matched = pat.iter().zip(segs.iter()).all(|(p, s)| {
                if p.starts_with(':') {
                    param = Some(s.to_string());
                    !s.is_empty()
                } else {
                    p == s
                }
            });
            if matched {
                return Some(RouteMatch { page: rule.page, access: rule.access, path: path.clone(), query: query.clone(), param });
            }
        }
        None
    }

    /// Decide what a navigation to `raw` does under `session`.
    pub fn navigate(&self, session: &Session, raw: &str) -> Navigation {
        let Some(m) = self.resolve(raw) else { return Navigation::Redirect(LANDING_PATH); };
        let decision = match m.access {
            Access::Public => GuardDecision::Render,
            Access::AwaitSession if session.is_resolved() => GuardDecision::Render,
            Access::AwaitSession => GuardDecision::Loading,
            Access::Role(r) => evaluate(session, Some(r)),
        };
        match decision {
            GuardDecision::Loading => Navigation::Loading,
            GuardDecision::Render => Navigation::Render(m),
            GuardDecision::Redirect(to) => Navigation::Redirect(to),
        }
    }
}

/// Where to land right after a successful sign-in, by claimed role.
pub fn post_sign_in_destination(claimed: Option<Role>) -> &'static str {
    claimed.and_then(|r| r.home_path()).unwrap_or(LANDING_PATH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

/// `/auth?type=buyer&mode=login`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthIntent {
    pub role: Role,
    pub mode: AuthMode,
}

impl AuthIntent {
    pub fn from_query(query: &str) -> Self {
        let mut intent = AuthIntent { role: Role::Founder, mode: AuthMode::Signup };
        for pair in query.trim_start_matches('?').split('&') {
            match pair.split_once('=') {
                Some(("type", "buyer")) => intent.role = Role::Buyer,
                Some(("mode", "login")) => intent.mode = AuthMode::Login,
                _ => {}
            }
        }
        intent
    }

    pub fn to_path(&self) -> String {
        let ty = if self.role == Role::Buyer { "buyer" } else { "founder" };
        let mode = if self.mode == AuthMode::Login { "login" } else { "signup" };
        format!("{}?type={}&mode={}", AUTH_PATH, ty, mode)
    }
}

/// Strip query/fragment and trailing slashes; always starts with `/`.
pub fn normalize_path(raw: &str) -> String { split_path(raw).0 }

fn split_path(raw: &str) -> (String, Option<String>) {
    let no_frag = raw.split('#').next().unwrap_or("");
    let (path, query) = match no_frag.split_once('?') {
        Some((p, q)) => (p, Some(q.to_string())),
        None => (no_frag, None),
    };
    let trimmed = path.trim().trim_end_matches('/');
    let norm = if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{}", trimmed) };
    (norm, query.filter(|q| !q.is_empty()))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
