use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use capsule::config::{Config, ConfigError};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.listen_addr, "127.0.0.1:1965");
    assert_eq!(cfg.content_root, PathBuf::from("content"));
    assert_eq!(cfg.tls.cert_path, PathBuf::from(".ssl/server.crt"));
    assert_eq!(cfg.tls.key_path, PathBuf::from(".ssl/key.pem"));
    assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    assert!(cfg.hostname.is_none());
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        r#"
listen_addr: "0.0.0.0:1965"
content_root: /srv/gemini
hostname: example.org
request_timeout_secs: 3
tls:
  cert_path: /etc/capsule/cert.pem
  key_path: /etc/capsule/key.pem
"#,
    )
    .unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:1965");
    assert_eq!(cfg.content_root, PathBuf::from("/srv/gemini"));
    assert_eq!(cfg.hostname.as_deref(), Some("example.org"));
    assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
    assert_eq!(cfg.tls.cert_path, PathBuf::from("/etc/capsule/cert.pem"));
    assert_eq!(cfg.max_connections, 1024);
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml_str("content_root: site\n").unwrap();

    assert_eq!(cfg.content_root, PathBuf::from("site"));
    assert_eq!(cfg.listen_addr, "127.0.0.1:1965");
    assert_eq!(cfg.tls.key_path, PathBuf::from(".ssl/key.pem"));
}

#[test]
fn test_config_rejects_zero_timeout() {
    let err = Config::from_yaml_str("request_timeout_secs: 0\n").unwrap_err();

    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_config_rejects_malformed_yaml() {
    let err = Config::from_yaml_str("listen_addr: [unclosed\n").unwrap_err();

    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_env_overrides() {
    let cfg = Config::default()
        .apply_overrides(lookup(&[
            ("LISTEN", "0.0.0.0:3000"),
            ("CONTENT_ROOT", "/var/gemini"),
            ("TLS_CERT", "cert.pem"),
            ("TLS_KEY", "key.pem"),
            ("HOSTNAME_OVERRIDE", "capsule.example"),
        ]))
        .unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.content_root, PathBuf::from("/var/gemini"));
    assert_eq!(cfg.tls.cert_path, PathBuf::from("cert.pem"));
    assert_eq!(cfg.tls.key_path, PathBuf::from("key.pem"));
    assert_eq!(cfg.hostname.as_deref(), Some("capsule.example"));
}

#[test]
fn test_config_no_overrides() {
    let cfg = Config::default().apply_overrides(lookup(&[])).unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:1965");
}

#[test]
fn test_config_missing_file() {
    let err = Config::from_file(&PathBuf::from("/nonexistent/capsule.yaml")).unwrap_err();

    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
}
