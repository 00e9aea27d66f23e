use super::{
    apply_env_overrides, apply_file_overrides, normalize_database_url, prepare_database_url,
    Settings,
};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_full_urls_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("sqlite://./data/x.db?mode=rwc"),
        "sqlite://./data/x.db?mode=rwc"
    );
}

#[test]
fn converts_single_colon_sqlite_url_and_backslashes() {
    assert_eq!(
        normalize_database_url("sqlite:data\\workouts.db"),
        "sqlite://data/workouts.db"
    );
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn file_overrides_replace_known_keys_only() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
database_url = "sqlite://./elsewhere.db"
session_issuer = "gym"
session_secret = "ignored-from-file"
"#,
    )
    .expect("file overrides");
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite://./elsewhere.db");
    assert_eq!(settings.session_issuer, "gym");
    assert_eq!(settings.session_secret, None);
}

#[test]
fn numeric_ttl_in_file_does_not_discard_other_keys() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
database_url = "sqlite://./elsewhere.db"
session_ttl_seconds = 3600
"#,
    )
    .expect("file overrides");
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite://./elsewhere.db");
    assert_eq!(settings.session_ttl_seconds, 3600);
}

#[test]
fn malformed_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file_overrides(&mut settings, "bind_addr = [not, a, string").is_err());
    assert!(apply_file_overrides(&mut settings, "session_ttl_seconds = \"soon\"").is_err());
    assert_eq!(settings.server_bind, Settings::default().server_bind);
}

#[test]
fn default_settings_have_no_session_secret() {
    let settings = Settings::default();
    assert_eq!(settings.session_secret, None);
    let err = settings.session_config().expect_err("missing secret");
    assert!(err.to_string().contains("SESSION_SECRET"));
}

#[test]
fn blank_session_secret_is_rejected() {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, env_from(&[("SESSION_SECRET", "   ")])).expect("env");
    assert!(settings.session_config().is_err());
}

#[test]
fn env_secret_and_ttl_build_session_config() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("SESSION_SECRET", "from-plain-env"),
            ("APP__SESSION_SECRET", "from-app-env"),
            ("APP__SESSION_ISSUER", "gym"),
            ("APP__SESSION_TTL_SECONDS", "900"),
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
        ]),
    )
    .expect("env");
    assert_eq!(settings.server_bind, "127.0.0.1:2");

    let session = settings.session_config().expect("session config");
    assert_eq!(session.secret, "from-app-env");
    assert_eq!(session.issuer, "gym");
    assert_eq!(session.ttl_seconds, 900);
}

#[test]
fn non_positive_or_garbled_ttl_is_rejected() {
    let mut settings = Settings {
        session_secret: Some("k".into()),
        ..Settings::default()
    };
    for ttl in ["0", "-60"] {
        apply_env_overrides(&mut settings, env_from(&[("APP__SESSION_TTL_SECONDS", ttl)]))
            .expect("env");
        assert!(settings.session_config().is_err(), "{ttl}");
    }

    let err = apply_env_overrides(
        &mut settings,
        env_from(&[("APP__SESSION_TTL_SECONDS", "a week")]),
    )
    .expect_err("garbled ttl");
    assert!(err.to_string().contains("APP__SESSION_TTL_SECONDS"));
}

#[test]
fn creates_parent_dir_for_sqlite_path() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("liftlog_server_test_{suffix}"));
    let db_path = temp_root.join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.join("data").exists());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("liftlog_server_open_test_{suffix}"));
    let db_path = temp_root.join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );

    fs::remove_dir_all(temp_root).expect("cleanup");
}
