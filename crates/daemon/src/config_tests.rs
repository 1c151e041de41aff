use super::*;
use serial_test::serial;
use std::io::Write;

fn clear_env() {
    for key in [
        "ORC_DATABASE_URL",
        "ORC_BROKER_URL",
        "ORC_CONFIG_PATH",
        "ORC_WORKER_ID",
        "ORC_LOCK_LEASE_MS",
        "ORC_OP_DEADLINE_MS",
        "ORC_MAX_ATTEMPTS",
        "ORC_OUTBOX_BATCH",
        "ORC_MAINTENANCE_PERIOD_MS",
        "ORC_RETENTION_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn missing_database_url_is_an_error() {
    clear_env();
    let err = Config::load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingDatabaseUrl));
}

#[test]
#[serial]
fn env_vars_override_defaults() {
    clear_env();
    std::env::set_var("ORC_DATABASE_URL", "postgres://test/db");
    std::env::set_var("ORC_BROKER_URL", "redis://test:6379");
    std::env::set_var("ORC_MAX_ATTEMPTS", "9");

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.database_url, "postgres://test/db");
    assert_eq!(cfg.max_attempts, 9);
    assert_eq!(cfg.lock_lease_ms, 30_000);
    clear_env();
}

#[test]
#[serial]
fn file_values_fill_in_behind_env() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "database_url = \"postgres://file/db\"\nmax_attempts = 3").unwrap();
    std::env::set_var("ORC_CONFIG_PATH", file.path());
    std::env::set_var("ORC_BROKER_URL", "redis://test:6379");

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.database_url, "postgres://file/db");
    assert_eq!(cfg.max_attempts, 3);
    clear_env();
}

#[test]
#[serial]
fn env_wins_over_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "database_url = \"postgres://file/db\"\nmax_attempts = 3").unwrap();
    std::env::set_var("ORC_CONFIG_PATH", file.path());
    std::env::set_var("ORC_BROKER_URL", "redis://test:6379");
    std::env::set_var("ORC_MAX_ATTEMPTS", "11");

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.max_attempts, 11);
    clear_env();
}
