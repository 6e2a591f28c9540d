//!
//! ethaum-session
//! --------------
//! Headless driver for the session coordinator. Boots against the local
//! (file-persisted) auth provider, optionally signs in or out, and prints the
//! navigation decision for each path given on the command line.
//!
//! Usage: ethaum-session [--sign-in <credential.json>] [--sign-out] [PATH...]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ethaum::config::EffectiveConfig;
use ethaum::identity::{
    AuthSession, LocalAuthProvider, Navigator, RestRoleDirectory, RoleDirectory, SessionCoordinator,
    StaticRoleDirectory, TracingNavigator,
};
use ethaum::routes::{post_sign_in_destination, Navigation};

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn positional_paths(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let a = &args[i];
        if a == "--sign-in" {
            i += 2;
            continue;
        }
        if !a.starts_with("--") {
            out.push(a.clone());
        }
        i += 1;
    }
    out
}

fn directory_for(cfg: &EffectiveConfig) -> Result<Arc<dyn RoleDirectory>> {
    match (cfg.backend_url.as_deref(), cfg.anon_key.as_deref()) {
        (Some(url), Some(key)) => {
            info!(target: "ethaum::directory", url, "using REST profiles directory");
            let d = RestRoleDirectory::new(url, key, cfg.verify_timeout())
                .context("building REST role directory")?;
            Ok(Arc::new(d))
        }
        _ => {
            info!(target: "ethaum::directory", seeded=cfg.roles.len(), "using static role directory");
            Ok(Arc::new(StaticRoleDirectory::from_pairs(cfg.roles.iter())))
        }
    }
}

fn describe(nav: &Navigation) -> String {
    match nav {
        Navigation::Loading => "loading".to_string(),
        Navigation::Render(m) => format!("render {:?}", m.page),
        Navigation::Redirect(to) => format!("redirect {}", to),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log filter")?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = EffectiveConfig::load()?;
    info!(
        target: "ethaum",
        "ethaum-session starting: session_file={:?}, verify_roles={}, verify_timeout_ms={:?}",
        cfg.session_file, cfg.verify_roles, cfg.verify_timeout_ms
    );

    let provider = Arc::new(LocalAuthProvider::new(cfg.session_file.clone()));
    let navigator = Arc::new(TracingNavigator::new());
    let coord = SessionCoordinator::from_config(&cfg, provider.clone(), directory_for(&cfg)?, navigator.clone());

    let booted = coord.boot().await;
    println!(
        "session: identity={} role={} verified={}",
        booted.identity.as_ref().map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
        booted.effective_role().map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
        booted.verified_role.is_some()
    );

    if let Some(cred_path) = parse_path_arg(&args, "--sign-in") {
        let text = std::fs::read_to_string(&cred_path)
            .with_context(|| format!("reading credential '{}'", cred_path.display()))?;
        let cred: AuthSession = serde_json::from_str(&text).context("parsing credential")?;
        let user = cred.user_id.clone();
        let dest = post_sign_in_destination(cred.claimed_role());
        provider.sign_in(cred).await.context("signing in")?;
        let waited = tokio::time::timeout(
            Duration::from_secs(5),
            coord.store().wait_until(|s| s.identity.as_ref() == Some(&user)),
        )
        .await;
        if waited.is_err() {
            anyhow::bail!("listener did not pick up sign-in for {}", user);
        }
        navigator.navigate(dest);
        println!("signed in as {} -> {}", user, dest);
    }

    for path in positional_paths(&args) {
        let nav = coord.navigate_when_ready(&path).await;
        println!("{:<24} {}", path, describe(&nav));
    }

    if has_flag(&args, "--sign-out") {
        coord.sign_out().await;
        println!("signed out -> {} (reloads={})", navigator.location(), navigator.reloads());
    }

    coord.shutdown().await;
    Ok(())
}
