//! Tests for [`ServiceConfig`] and configuration loading.

use super::*;
use serial_test::serial;
use std::io::Write;

fn sdk() -> SdkConfig {
    SdkConfig::new("https://api.etvas.com", "12345678")
}

fn clear_env() {
    for name in [
        CONFIG_FILE_ENV,
        "ETVAS__SERVER__PORT",
        "ETVAS__SDK__API_KEY",
        "ETVAS__EVENTS__ENDPOINT_PATH",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::new(sdk());

        assert!(config.validate().is_ok());
        assert_eq!(config.events.endpoint_path, "/events");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_relative_endpoint_path_is_rejected() {
        let mut config = ServiceConfig::new(sdk());
        config.events.endpoint_path = "events".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    /// Verify the event endpoint cannot shadow the health check.
    #[test]
    fn test_health_path_is_reserved() {
        let mut config = ServiceConfig::new(sdk());
        config.events.endpoint_path = "/health".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_zero_body_limit_is_rejected() {
        let mut config = ServiceConfig::new(sdk());
        config.server.max_body_size = 0;

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_invalid_sdk_section_is_rejected() {
        let config = ServiceConfig::new(SdkConfig::new("https://api.etvas.com", "123"));

        assert!(matches!(config.validate(), Err(ConfigError::Sdk(_))));
    }
}

// ============================================================================
// Loading
// ============================================================================

mod loading_tests {
    use super::*;

    #[test]
    #[serial]
    fn test_load_from_explicit_file() {
        clear_env();
        let file = write_config(
            r#"
[server]
port = 9090

[events]
endpoint_path = "/etvas/events"

[sdk]
api_url = "https://api.etvas.com"
api_key = "12345678"
event_secret = "event-secret"

[sdk.product_variants]
"prod-1" = "basic"
"#,
        );

        let config = load_config(Some(file.path())).expect("config loads");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.events.endpoint_path, "/etvas/events");
        assert_eq!(config.sdk.api_key, "12345678");
        assert_eq!(
            config.sdk.event_secret.as_ref().map(|s| s.expose_secret()),
            Some("event-secret")
        );
        assert_eq!(config.sdk.product_variant("prod-1"), Ok("basic"));
    }

    #[test]
    #[serial]
    fn test_config_file_env_is_used() {
        clear_env();
        let file = write_config(
            r#"
[sdk]
api_url = "https://api.etvas.com"
api_key = "from-env-file"
"#,
        );
        std::env::set_var(CONFIG_FILE_ENV, file.path());

        let config = load_config(None).expect("config loads");
        clear_env();

        assert_eq!(config.sdk.api_key, "from-env-file");
    }

    /// Verify ETVAS__ environment variables override file values.
    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        clear_env();
        let file = write_config(
            r#"
[server]
port = 9090

[sdk]
api_url = "https://api.etvas.com"
api_key = "12345678"
"#,
        );
        std::env::set_var("ETVAS__SERVER__PORT", "7070");
        std::env::set_var("ETVAS__SDK__API_KEY", "override-key");

        let config = load_config(Some(file.path())).expect("config loads");
        clear_env();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.sdk.api_key, "override-key");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_fails() {
        clear_env();
        let result = load_config(Some(Path::new("/nonexistent/etvas.toml")));

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_invalid_configuration_fails() {
        clear_env();
        let file = write_config(
            r#"
[events]
endpoint_path = "no-slash"

[sdk]
api_url = "https://api.etvas.com"
api_key = "12345678"
"#,
        );

        let error = load_config(Some(file.path())).unwrap_err();

        assert!(format!("{:#}", error).contains("endpoint_path"));
    }

    #[test]
    #[serial]
    fn test_missing_sdk_section_fails() {
        clear_env();
        let file = write_config("[server]\nport = 9090\n");

        assert!(load_config(Some(file.path())).is_err());
    }
}
