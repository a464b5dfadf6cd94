//! Capabilities the server does not serve yet.

use exesdb_client::proto::{NewEvent, SubscribeToStream, WriteEvents, EXPECTED_VERSION_NO_STREAM};
use exesdb_client::{
    Cancellation, Capability, ClientError, EventStore, ExesdbClient, Snapshots, StoreManagement,
    StreamState,
};

fn client() -> ExesdbClient {
    ExesdbClient::create("127.0.0.1:1").unwrap()
}

fn capability_of(err: &ClientError) -> Option<Capability> {
    match err {
        ClientError::Unimplemented { capability, .. } => Some(*capability),
        _ => None,
    }
}

#[tokio::test]
async fn test_write_events_is_unimplemented() {
    let client = client();
    let request = WriteEvents {
        event_stream_id: "orders-1".into(),
        expected_version: EXPECTED_VERSION_NO_STREAM,
        events: vec![NewEvent::json("OrderPlaced", br#"{"total":12}"#.to_vec())],
        require_leader: true,
        store_id: None,
    };

    let err = client
        .event_store()
        .write_events(request, &Cancellation::new())
        .await
        .unwrap_err();
    assert_eq!(capability_of(&err), Some(Capability::EventStore));
    assert!(err.is_unimplemented());
}

#[tokio::test]
async fn test_subscribe_to_stream_is_unimplemented_on_first_pull() {
    let client = client();
    let mut live = client.event_store().subscribe_to_stream(
        SubscribeToStream {
            event_stream_id: "orders-1".into(),
            resolve_link_tos: true,
            store_id: Some("main".into()),
        },
        &Cancellation::new(),
    );

    let err = live.next().await.unwrap_err();
    assert_eq!(capability_of(&err), Some(Capability::EventStore));
    assert_eq!(live.state(), StreamState::Failed);
}

#[tokio::test]
async fn test_snapshots_are_unimplemented() {
    let client = client();
    let err = client
        .snapshots()
        .read_snapshot("orders-1", None, &Cancellation::new())
        .await
        .unwrap_err();
    assert_eq!(capability_of(&err), Some(Capability::Snapshots));
}

#[tokio::test]
async fn test_store_management_is_unimplemented() {
    let client = client();
    let err = client
        .store_management()
        .get_store_context(&Cancellation::new())
        .await
        .unwrap_err();
    assert_eq!(capability_of(&err), Some(Capability::StoreManagement));
}
