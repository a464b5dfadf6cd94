//! Construction, probing and shutdown.

use std::time::Duration;

use exesdb_client::proto::StreamForwardRequest;
use exesdb_client::{
    Cancellation, ClientConfig, ClientError, ConfigError, Credentials, ExesdbClient,
    ListStreamsOptions, StreamState, Streams,
};

/// Nothing listens on port 1, so connections are refused immediately.
const UNREACHABLE: &str = "127.0.0.1:1";

fn unreachable_client() -> ExesdbClient {
    let config = ClientConfig::new(UNREACHABLE)
        .with_connect_timeout(Duration::from_secs(2))
        .with_request_timeout(Duration::from_secs(2));
    ExesdbClient::new(config).expect("construction performs no network I/O")
}

#[tokio::test]
async fn test_construction_does_not_connect() {
    let client = unreachable_client();
    assert_eq!(client.server_address(), UNREACHABLE);
    assert!(!client.is_shutdown());
}

#[tokio::test]
async fn test_create_uses_defaults() {
    let client = ExesdbClient::create(UNREACHABLE).unwrap();
    assert_eq!(client.config().connect_timeout, Duration::from_secs(30));
    assert_eq!(client.config().request_timeout, Duration::from_secs(10));
}

#[tokio::test]
async fn test_blank_address_rejected() {
    let err = ExesdbClient::create("  ").unwrap_err();
    assert!(matches!(
        err,
        ClientError::Configuration(ConfigError::EmptyServerAddress)
    ));
}

#[tokio::test]
async fn test_zero_connect_timeout_rejected() {
    let config = ClientConfig::new(UNREACHABLE).with_connect_timeout(Duration::ZERO);
    let err = ExesdbClient::new(config).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Configuration(ConfigError::NonPositiveTimeout {
            field: "connect_timeout"
        })
    ));
}

#[tokio::test]
async fn test_unreadable_ca_rejected_at_construction() {
    let config = ClientConfig::new("db.internal:2113")
        .with_credentials(Credentials::tls("/definitely/not/here/ca.pem"));
    let err = ExesdbClient::new(config).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Configuration(ConfigError::Io { .. })
    ));
}

#[tokio::test]
async fn test_unix_socket_address_accepted() {
    let client = ExesdbClient::create("unix:///tmp/exesdb-missing.sock").unwrap();
    assert!(!client.probe_connectivity(&Cancellation::new()).await);
}

#[tokio::test]
async fn test_probe_unreachable_is_false() {
    let client = unreachable_client();
    assert!(!client.probe_connectivity(&Cancellation::new()).await);
}

#[tokio::test]
async fn test_list_streams_unreachable_is_transport_error() {
    let client = unreachable_client();
    let err = client
        .streams()
        .list_streams(ListStreamsOptions::new(), &Cancellation::new())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ClientError::Transport { .. } | ClientError::Cancelled { .. }
        ),
        "unexpected {err:?}"
    );
}

#[tokio::test]
async fn test_shutdown_twice_then_closed() {
    let client = unreachable_client();
    client.shutdown();
    client.shutdown();
    assert!(client.is_shutdown());

    let err = client
        .streams()
        .get_stream_version("orders-1", None, &Cancellation::new())
        .await
        .unwrap_err();
    assert!(err.is_closed());
}

#[tokio::test]
async fn test_stream_after_shutdown_fails_on_first_pull() {
    let client = unreachable_client();
    let mut batches = client
        .streams()
        .stream_forward(StreamForwardRequest::default(), &Cancellation::new());
    client.shutdown();

    assert_eq!(batches.state(), StreamState::Idle);
    assert!(batches.next().await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_cancelled_before_call() {
    let client = unreachable_client();
    let cancel = Cancellation::new();
    cancel.cancel();

    let err = client
        .streams()
        .list_streams(ListStreamsOptions::new(), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(!err.is_timeout());
}
