//! Access guard behaviour end to end: coordinator boot, route table and
//! role redirects.

mod common;

use std::sync::Arc;

use anyhow::Result;

use common::{credential, RecordingNavigator, ScriptedDirectory, ScriptedProvider};
use ethaum::identity::{
    evaluate, CoordinatorOptions, GuardDecision, Role, Session, SessionCoordinator, SessionStatus, UserId,
};
use ethaum::routes::{Navigation, Page};

fn coordinator(provider: Arc<ScriptedProvider>, directory: Arc<ScriptedDirectory>) -> SessionCoordinator {
    SessionCoordinator::new(provider, directory, RecordingNavigator::new(), CoordinatorOptions::default())
}

fn render_page(nav: &Navigation) -> Option<Page> {
    match nav {
        Navigation::Render(m) => Some(m.page),
        _ => None,
    }
}

#[test]
fn unresolved_sessions_never_redirect() {
    let roles = [None, Some(Role::Founder), Some(Role::Buyer), Some(Role::Unknown)];
    for status in [SessionStatus::Uninitialized, SessionStatus::Resolving] {
        for identity in [None, Some(UserId::new("u"))] {
            for claimed in roles {
                for required in roles {
                    let s = Session { identity: identity.clone(), claimed_role: claimed, verified_role: None, status, epoch: 0 };
                    assert_eq!(evaluate(&s, required), GuardDecision::Loading, "{s:?} / {required:?}");
                }
            }
        }
    }
}

#[test]
fn mismatched_role_goes_to_own_home_never_the_requested_one() {
    let cases = [
        (Role::Founder, Role::Buyer, "/founder/dashboard"),
        (Role::Buyer, Role::Founder, "/buyer/dashboard"),
    ];
    for (actual, required, home) in cases {
        let s = Session {
            identity: Some(UserId::new("u")),
            claimed_role: Some(actual),
            verified_role: Some(actual),
            status: SessionStatus::Resolved,
            epoch: 1,
        };
        let d = evaluate(&s, Some(required));
        assert_eq!(d, GuardDecision::Redirect(home));
        assert_ne!(d, GuardDecision::Redirect(required.home_path().unwrap()));
        assert_eq!(evaluate(&s, Some(actual)), GuardDecision::Render);
    }
}

#[tokio::test]
async fn anonymous_visitor_on_founder_dashboard_goes_home() -> Result<()> {
    let coord = coordinator(ScriptedProvider::new(None), ScriptedDirectory::new());
    coord.boot().await;
    assert_eq!(coord.navigate("/founder/dashboard"), Navigation::Redirect("/"));
    assert_eq!(coord.navigate("/buyer/dashboard"), Navigation::Redirect("/"));
    assert_eq!(render_page(&coord.navigate("/")), Some(Page::Landing));
    coord.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn signed_in_founder_on_buyer_dashboard_is_redirected() -> Result<()> {
    let directory = ScriptedDirectory::new();
    directory.answer("f-1", Some(Role::Founder));
    let coord = coordinator(ScriptedProvider::new(Some(credential("f-1", "founder"))), directory);
    coord.boot().await;
    assert_eq!(coord.navigate("/buyer/dashboard"), Navigation::Redirect("/founder/dashboard"));
    assert_eq!(render_page(&coord.navigate("/founder/dashboard")), Some(Page::FounderDashboard));
    coord.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn verified_role_corrects_a_stale_claim() -> Result<()> {
    // credential still says founder, the profile row says buyer
    let directory = ScriptedDirectory::new();
    directory.answer("x-1", Some(Role::Buyer));
    let coord = coordinator(ScriptedProvider::new(Some(credential("x-1", "founder"))), directory);
    let s = coord.boot().await;
    assert_eq!(s.claimed_role, Some(Role::Founder));
    assert_eq!(s.verified_role, Some(Role::Buyer));
    assert_eq!(coord.navigate("/founder/dashboard"), Navigation::Redirect("/buyer/dashboard"));
    coord.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unknown_role_is_sent_to_landing() -> Result<()> {
    let directory = ScriptedDirectory::new();
    directory.answer("s-1", Some(Role::Unknown));
    let coord = coordinator(ScriptedProvider::new(Some(credential("s-1", "staff"))), directory);
    coord.boot().await;
    assert_eq!(coord.navigate("/founder/dashboard"), Navigation::Redirect("/"));
    assert_eq!(coord.navigate("/buyer/dashboard"), Navigation::Redirect("/"));
    // public pages still work
    assert_eq!(render_page(&coord.navigate("/startup/7")), Some(Page::StartupDetails));
    coord.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unmatched_paths_redirect_to_landing_for_everyone() -> Result<()> {
    let directory = ScriptedDirectory::new();
    directory.answer("b-1", Some(Role::Buyer));
    let coord = coordinator(ScriptedProvider::new(Some(credential("b-1", "buyer"))), directory);
    coord.boot().await;
    assert_eq!(coord.navigate("/settings"), Navigation::Redirect("/"));
    assert_eq!(coord.navigate("/buyer"), Navigation::Redirect("/"));
    assert_eq!(render_page(&coord.navigate("/buyer/dashboard/")), Some(Page::BuyerDashboard));
    coord.shutdown().await;
    Ok(())
}
