use minihttp::config::Config;
use std::collections::HashMap;
use std::path::Path;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:8088");
    assert_eq!(cfg.server.workers, 50);
    assert_eq!(cfg.server.max_queued, None);
    assert_eq!(cfg.static_files.root, Path::new("./static"));
    assert_eq!(cfg.static_files.not_found_page, Path::new("root/404.html"));
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml("").unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:8088");
    assert_eq!(cfg.server.workers, 50);
}

#[test]
fn test_config_partial_yaml_keeps_other_defaults() {
    let cfg = Config::from_yaml("server:\n  workers: 4\n  max_queued: 16\n").unwrap();

    assert_eq!(cfg.server.workers, 4);
    assert_eq!(cfg.server.max_queued, Some(16));
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:8088");
    assert_eq!(cfg.static_files.root, Path::new("./static"));
}

#[test]
fn test_config_invalid_yaml() {
    assert!(Config::from_yaml("server: [not, a, map]").is_err());
}

#[test]
fn test_config_listen_override() {
    let cfg = Config::default().with_overrides(env(&[("LISTEN", "127.0.0.1:3000")]));
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:3000");
}

#[test]
fn test_config_static_root_override() {
    let cfg = Config::from_yaml("static_files:\n  root: /srv/www\n")
        .unwrap()
        .with_overrides(env(&[("STATIC_ROOT", "/tmp/site")]));
    assert_eq!(cfg.static_files.root, Path::new("/tmp/site"));
}

#[test]
fn test_config_without_overrides_is_unchanged() {
    let cfg = Config::from_yaml("server:\n  listen_addr: 127.0.0.1:9000\n")
        .unwrap()
        .with_overrides(env(&[]));
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
}

#[test]
fn test_config_zero_workers_rejected() {
    let cfg = Config::from_yaml("server:\n  workers: 0\n").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn test_config_builtin_mime_table() {
    let table = Config::default().mime_table().unwrap();
    assert_eq!(table.get("html"), Some("text/html"));
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::from_yaml("server:\n  listen_addr: 0.0.0.0:5000\n").unwrap();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.server.listen_addr, cfg2.server.listen_addr);
}
