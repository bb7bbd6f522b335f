use std::io::Write as _;

use super::*;

fn no_env() -> Option<HashMap<String, String>> {
    Some(HashMap::new())
}

#[test]
fn defaults_without_sources() {
    let cfg = Config::load_with_env(None, no_env()).unwrap();
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 5003);
    assert_eq!(cfg.render.max_concurrent, 2);
    assert_eq!(cfg.render_queue_timeout(), Duration::from_secs(120));
    assert!(!cfg.render.draw_text_decorations);
    assert_eq!(cfg.fetch.timeout_secs, 10);
    assert_eq!(cfg.store.root, PathBuf::from("./data"));
    assert_eq!(cfg.log_format, LogFormat::Pretty);
    assert_eq!(cfg.fetch_options().timeout, Duration::from_secs(10));
    assert_eq!(cfg.max_body_bytes(), 16 * 1024 * 1024);
}

#[test]
fn file_then_environment_layering() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "log_format = \"json\"\n[server]\nport = 7000\nhost = \"127.0.0.1\"\n[render]\ndraw_text_decorations = true\n[fetch]\ntimeout_secs = 3"
    )
    .unwrap();

    let env = HashMap::from([
        ("PRINTREADY__SERVER__PORT".to_owned(), "9000".to_owned()),
        ("PRINTREADY__RENDER__MAX_CONCURRENT".to_owned(), "6".to_owned()),
    ]);
    let cfg = Config::load_with_env(Some(file.path()), Some(env)).unwrap();

    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.render.max_concurrent, 6);
    assert!(cfg.render_options().text.draw_decorations);
    assert_eq!(cfg.fetch_options().timeout, Duration::from_secs(3));
    assert_eq!(cfg.log_format, LogFormat::Json);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(Config::load_with_env(Some(&path), no_env()).is_err());
}
