//! Building a client from file and environment settings.

use std::io::Write;
use std::time::Duration;

use exesdb_client::{ClientError, ClientSettings, ConfigError, ExesdbClient};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_client_from_settings_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(
        b"server_address: \"127.0.0.1:1\"\nrequest_timeout_ms: 1500\nbearer_token: \"s3cret\"\n",
    )
    .unwrap();

    let settings = ClientSettings::load(file.path().to_str()).unwrap();
    let client = ExesdbClient::from_settings(settings).unwrap();

    assert_eq!(client.server_address(), "127.0.0.1:1");
    assert_eq!(client.config().request_timeout, Duration::from_millis(1500));
    assert_eq!(client.config().bearer_token(), Some("s3cret"));
    assert!(!format!("{:?}", client.config()).contains("s3cret"));
}

#[tokio::test]
#[serial]
async fn test_env_settings_validated_at_construction() {
    std::env::set_var("EXESDB__REQUEST_TIMEOUT_MS", "0");
    let settings = ClientSettings::load(None);
    std::env::remove_var("EXESDB__REQUEST_TIMEOUT_MS");

    let err = ExesdbClient::from_settings(settings.unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Configuration(ConfigError::NonPositiveTimeout {
            field: "request_timeout"
        })
    ));
}
