use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ENV_CONFIG: &str = "ETHAUM_CONFIG";
pub const ENV_BACKEND_URL: &str = "ETHAUM_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "ETHAUM_ANON_KEY";
pub const ENV_SESSION_FILE: &str = "ETHAUM_SESSION_FILE";
pub const ENV_VERIFY_ROLES: &str = "ETHAUM_VERIFY_ROLES";
pub const ENV_VERIFY_TIMEOUT_MS: &str = "ETHAUM_VERIFY_TIMEOUT_MS";

/// Built-in defaults applied when neither the config file nor the
/// environment say otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    pub verify_roles: bool,
    /// 0 disables the timeout
    pub verify_timeout_ms: u64,
    pub session_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            verify_roles: true,
            verify_timeout_ms: 10_000,
            session_file: None,
        }
    }
}

/// On-disk JSON config. Unspecified values inherit from Global.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub session_file: Option<PathBuf>,
    pub verify_roles: Option<bool>,
    pub verify_timeout_ms: Option<u64>,
    /// Seed roles for the in-memory directory, keyed by user id.
    pub roles: HashMap<String, String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let cfg = serde_json::from_str::<FileConfig>(&text)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        Ok(cfg)
    }
}

/// Environment overrides; highest precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub config_path: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub session_file: Option<PathBuf>,
    pub verify_roles: Option<bool>,
    pub verify_timeout_ms: Option<u64>,
}

impl EnvOverrides {
    pub fn from_env() -> Self { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let non_empty = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        Self {
            config_path: non_empty(ENV_CONFIG).map(PathBuf::from),
            backend_url: non_empty(ENV_BACKEND_URL),
            anon_key: non_empty(ENV_ANON_KEY),
            session_file: non_empty(ENV_SESSION_FILE).map(PathBuf::from),
            verify_roles: non_empty(ENV_VERIFY_ROLES).and_then(|v| parse_bool(&v)),
            verify_timeout_ms: non_empty(ENV_VERIFY_TIMEOUT_MS).and_then(|v| v.trim().parse::<u64>().ok()),
        }
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Fully resolved config used by the coordinator and the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub session_file: Option<PathBuf>,
    pub verify_roles: bool,
    pub verify_timeout_ms: Option<u64>,
    pub roles: HashMap<String, String>,
}

impl EffectiveConfig {
    /// Precedence: env, then file, then global.
    pub fn from_layers(global: &GlobalConfig, file: &FileConfig, env: &EnvOverrides) -> Self {
        let verify_timeout_ms = env.verify_timeout_ms
            .or(file.verify_timeout_ms)
            .unwrap_or(global.verify_timeout_ms);
        Self {
            backend_url: env.backend_url.clone()
                .or_else(|| file.backend_url.clone())
                .map(|u| u.trim_end_matches('/').to_string()),
            anon_key: env.anon_key.clone().or_else(|| file.anon_key.clone()),
            session_file: env.session_file.clone()
                .or_else(|| file.session_file.clone())
                .or_else(|| global.session_file.clone()),
            verify_roles: env.verify_roles.or(file.verify_roles).unwrap_or(global.verify_roles),
            verify_timeout_ms: if verify_timeout_ms == 0 { None } else { Some(verify_timeout_ms) },
            roles: file.roles.clone(),
        }
    }

    /// Resolve from the process environment and the optional config file it names.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let file = match env.config_path.as_deref() {
            Some(p) => FileConfig::read(p)?,
            None => FileConfig::default(),
        };
        let eff = Self::from_layers(&GlobalConfig::default(), &file, &env);
        debug!(
            target: "ethaum::config",
            backend=?eff.backend_url, session_file=?eff.session_file,
            verify_roles=eff.verify_roles, verify_timeout_ms=?eff.verify_timeout_ms,
            "effective config resolved"
        );
        Ok(eff)
    }

    pub fn verify_timeout(&self) -> Option<std::time::Duration> {
        self.verify_timeout_ms.map(std::time::Duration::from_millis)
    }
}

#[cfg(test)]
mod config_tests;
