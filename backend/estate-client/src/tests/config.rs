use crate::config::{BASE_URL_ENV_VAR, DEFAULT_BASE_URL, EstateConfig, parse_base_url};
use crate::error::ConfigError;
use crate::session::SIGN_IN_PATH;

use std::path::Path;
use std::time::Duration;

use serial_test::serial;
use tempfile::tempdir;

#[test]
fn given_missing_file_when_loaded_then_defaults() {
    let dir = tempdir().unwrap();

    let config = EstateConfig::load(dir.path()).unwrap();

    assert_eq!(config, EstateConfig::default());
    assert_eq!(config.session.sign_in_path, SIGN_IN_PATH);
    assert_eq!(config.timeout(), None, "HTTP client default unless configured");
}

#[test]
fn given_saved_config_when_loaded_then_round_trips() {
    let dir = tempdir().unwrap();
    let mut config = EstateConfig::default();
    config.api.base_url = Some(String::from("https://estate.example.com/api"));
    config.api.timeout_secs = Some(15);

    config.save(dir.path()).unwrap();
    let loaded = EstateConfig::load(dir.path()).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.timeout(), Some(Duration::from_secs(15)));
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn given_partial_json_when_loaded_then_missing_sections_default() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"api":{"base_url":"http://10.0.0.5:9000/api/"}}"#,
    )
    .unwrap();

    let config = EstateConfig::load(dir.path()).unwrap();

    assert_eq!(config.version, 1);
    assert_eq!(config.session.sign_in_path, SIGN_IN_PATH);
}

#[test]
fn given_invalid_values_when_validated_then_rejected() {
    let mut config = EstateConfig::default();
    config.version = 9;
    assert!(matches!(config.validate(), Err(ConfigError::ValidationError { .. })));

    let mut config = EstateConfig::default();
    config.api.base_url = Some(String::from("ftp://files.example.com"));
    assert!(matches!(config.validate(), Err(ConfigError::BaseUrl { .. })));

    let mut config = EstateConfig::default();
    config.session.sign_in_path = String::from("auth/sign-in");
    assert!(config.validate().is_err());

    let mut config = EstateConfig::default();
    config.api.timeout_secs = Some(0);
    assert!(config.validate().is_err());
}

#[test]
fn given_corrupt_file_when_loaded_then_parse_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{").unwrap();

    assert!(matches!(
        EstateConfig::load(dir.path()),
        Err(ConfigError::ParseError { .. })
    ));
}

/// **VALUE**: Verifies base URL precedence: override, then file, then default.
#[test]
fn given_sources_when_resolving_base_url_then_precedence_holds() {
    let mut config = EstateConfig::default();

    assert_eq!(
        config.resolve_base_url_with(None).unwrap().as_str(),
        DEFAULT_BASE_URL
    );

    config.api.base_url = Some(String::from("https://file.example.com/api"));
    assert_eq!(
        config.resolve_base_url_with(None).unwrap().as_str(),
        "https://file.example.com/api/"
    );

    assert_eq!(
        config
            .resolve_base_url_with(Some("http://override.example.com:8081/v2"))
            .unwrap()
            .as_str(),
        "http://override.example.com:8081/v2/"
    );
}

#[test]
#[serial]
fn given_env_override_when_resolving_then_env_wins() {
    let mut config = EstateConfig::default();
    config.api.base_url = Some(String::from("https://file.example.com/api/"));

    // SAFETY: serialised with every other test touching this variable.
    unsafe { std::env::set_var(BASE_URL_ENV_VAR, "http://env.example.com/api") };
    let resolved = config.resolve_base_url();
    unsafe { std::env::remove_var(BASE_URL_ENV_VAR) };

    assert_eq!(resolved.unwrap().as_str(), "http://env.example.com/api/");
}

#[test]
#[serial]
fn given_blank_env_override_when_resolving_then_ignored() {
    let config = EstateConfig::default();

    // SAFETY: serialised with every other test touching this variable.
    unsafe { std::env::set_var(BASE_URL_ENV_VAR, "  ") };
    let resolved = config.resolve_base_url();
    unsafe { std::env::remove_var(BASE_URL_ENV_VAR) };

    assert_eq!(resolved.unwrap().as_str(), DEFAULT_BASE_URL);
}

#[test]
fn given_base_url_without_slash_when_parsed_then_paths_join_beneath() {
    let url = parse_base_url("http://localhost:8080/api").unwrap();

    assert_eq!(url.join("apartments").unwrap().as_str(), "http://localhost:8080/api/apartments");
}

#[test]
fn given_storage_file_settings_when_resolved_then_relative_to_config_dir() {
    let mut config = EstateConfig::default();
    let dir = Path::new("/etc/estate");
    assert_eq!(config.storage_path(dir), dir.join("session.json"));

    config.session.storage_file = Some("state/tokens.json".into());
    assert_eq!(config.storage_path(dir), dir.join("state/tokens.json"));
}
