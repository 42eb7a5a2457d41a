use duplicates::config::{ConfigError, Settings};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_settings_defaults_through_figment() {
    // No Env provider, so other tests' variables cannot leak in
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let settings = Settings::extract(&figment).unwrap();

    assert_eq!(settings, Settings::default());
    assert!(settings.prehash);
    assert_eq!(settings.worker_count, None);
}

#[test]
fn test_settings_from_env() {
    // Private prefix keeps this test independent of DUPLICATES_* in the real environment
    std::env::set_var("DUPTEST_ENV_MIN_FILE_SIZE", "2048");
    std::env::set_var("DUPTEST_ENV_PREHASH", "false");
    std::env::set_var("DUPTEST_ENV_WORKER_COUNT", "3");

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed("DUPTEST_ENV_"));
    let settings = Settings::extract(&figment).unwrap();

    assert_eq!(settings.min_file_size, 2048);
    assert!(!settings.prehash);
    assert_eq!(settings.worker_count, Some(3));

    std::env::remove_var("DUPTEST_ENV_MIN_FILE_SIZE");
    std::env::remove_var("DUPTEST_ENV_PREHASH");
    std::env::remove_var("DUPTEST_ENV_WORKER_COUNT");
}

#[test]
fn test_settings_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
follow_symlinks = true
skip_hardlinks = true
prehash_bytes = 8192
queue_capacity = 16
"#,
    )
    .unwrap();

    let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(&path));
    let settings = Settings::extract(&figment).unwrap();

    assert!(settings.follow_symlinks);
    assert!(settings.skip_hardlinks);
    assert_eq!(settings.prehash_bytes, 8192);
    assert_eq!(settings.queue_capacity, 16);
    // Untouched keys keep their defaults
    assert_eq!(settings.min_file_size, 0);
}

#[test]
fn test_env_overrides_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_file_size = 10\n").unwrap();
    std::env::set_var("DUPTEST_LAYER_MIN_FILE_SIZE", "99");

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("DUPTEST_LAYER_"));
    let settings = Settings::extract(&figment).unwrap();
    std::env::remove_var("DUPTEST_LAYER_MIN_FILE_SIZE");

    assert_eq!(settings.min_file_size, 99);
}

#[test]
fn test_load_explicit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "follow_symlinks = true\nprehash = false\n").unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    assert!(settings.follow_symlinks);
    assert!(!settings.prehash);

    let config = settings.to_finder_config();
    assert!(config.follow_symlinks);
    assert!(config.prefilter.is_none());
}

#[test]
fn test_load_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let result = Settings::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");

    fs::write(&path, "worker_count = 0\n").unwrap();
    let err = Settings::load(Some(&path)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::OutOfRange {
            key: "worker_count",
            ..
        }
    ));

    fs::write(&path, "min_file_size = \"lots\"\n").unwrap();
    let err = Settings::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
