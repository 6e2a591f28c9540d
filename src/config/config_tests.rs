use super::*;

fn env_of(pairs: &[(&str, &str)]) -> EnvOverrides {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    EnvOverrides::from_lookup(|k| map.get(k).cloned())
}

#[test]
fn defaults_when_nothing_set() {
    let eff = EffectiveConfig::from_layers(&GlobalConfig::default(), &FileConfig::default(), &EnvOverrides::default());
    assert!(eff.verify_roles);
    assert_eq!(eff.verify_timeout_ms, Some(10_000));
    assert!(eff.backend_url.is_none());
    assert!(eff.session_file.is_none());
}

#[test]
fn precedence_env_over_file_over_global() {
    let file = FileConfig {
        backend_url: Some("https://file.example.co/".into()),
        anon_key: Some("file-key".into()),
        verify_roles: Some(false),
        verify_timeout_ms: Some(2500),
        ..Default::default()
    };
    let env = env_of(&[(ENV_BACKEND_URL, "https://env.example.co"), (ENV_VERIFY_ROLES, "yes")]);

    let eff = EffectiveConfig::from_layers(&GlobalConfig::default(), &file, &env);
    assert_eq!(eff.backend_url.as_deref(), Some("https://env.example.co"));
    assert_eq!(eff.anon_key.as_deref(), Some("file-key"));
    assert!(eff.verify_roles);
    assert_eq!(eff.verify_timeout_ms, Some(2500));
}

#[test]
fn trailing_slash_trimmed_from_backend_url() {
    let file = FileConfig { backend_url: Some("https://x.example.co///".into()), ..Default::default() };
    let eff = EffectiveConfig::from_layers(&GlobalConfig::default(), &file, &EnvOverrides::default());
    assert_eq!(eff.backend_url.as_deref(), Some("https://x.example.co"));
}

#[test]
fn zero_timeout_disables() {
    let env = env_of(&[(ENV_VERIFY_TIMEOUT_MS, "0")]);
    let eff = EffectiveConfig::from_layers(&GlobalConfig::default(), &FileConfig::default(), &env);
    assert_eq!(eff.verify_timeout_ms, None);
    assert!(eff.verify_timeout().is_none());
}

#[test]
fn bad_env_values_are_ignored() {
    let env = env_of(&[(ENV_VERIFY_ROLES, "maybe"), (ENV_VERIFY_TIMEOUT_MS, "soon"), (ENV_ANON_KEY, "  ")]);
    assert_eq!(env.verify_roles, None);
    assert_eq!(env.verify_timeout_ms, None);
    assert_eq!(env.anon_key, None);
}

#[test]
fn parse_bool_variants() {
    for t in ["1", "true", "YES", " on "] { assert_eq!(parse_bool(t), Some(true), "{t}"); }
    for f in ["0", "False", "no", "off"] { assert_eq!(parse_bool(f), Some(false), "{f}"); }
    assert_eq!(parse_bool("2"), None);
}

#[test]
fn file_config_reads_json_with_partial_fields() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("ethaum.json");
    std::fs::write(&p, r#"{ "verify_roles": false, "roles": { "u-1": "founder" } }"#).unwrap();
    let cfg = FileConfig::read(&p).unwrap();
    assert_eq!(cfg.verify_roles, Some(false));
    assert_eq!(cfg.roles.get("u-1").map(String::as_str), Some("founder"));
    assert!(cfg.backend_url.is_none());
}

#[test]
fn file_config_reports_path_on_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("broken.json");
    std::fs::write(&p, "{").unwrap();
    let err = FileConfig::read(&p).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}
