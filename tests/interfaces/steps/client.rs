//! Client façade step definitions.

use std::time::Duration;

use cucumber::{given, then, when, World};
use exesdb_client::proto::{AckEventRequest, WriteEvents};
use exesdb_client::{
    Cancellation, ClientConfig, ClientError, EventStore, ExesdbClient, Snapshots,
    StoreManagement, Streams, Subscriptions,
};

/// Test context for client lifecycle scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct ClientWorld {
    config: ClientConfig,
    client: Option<ExesdbClient>,
    construction_error: Option<ClientError>,
    call_error: Option<ClientError>,
    probe: Option<bool>,
}

impl ClientWorld {
    fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            client: None,
            construction_error: None,
            call_error: None,
            probe: None,
        }
    }

    fn configure(&mut self, address: String) {
        self.config = ClientConfig::new(address)
            .with_connect_timeout(Duration::from_secs(2))
            .with_request_timeout(Duration::from_secs(2));
    }

    fn construct(&mut self) {
        match ExesdbClient::new(self.config.clone()) {
            Ok(client) => self.client = Some(client),
            Err(e) => self.construction_error = Some(e),
        }
    }

    fn client(&self) -> &ExesdbClient {
        self.client.as_ref().expect("Client not constructed")
    }

    fn record<T>(&mut self, result: exesdb_client::Result<T>) {
        self.call_error = result.err();
    }

    fn call_error(&self) -> &ClientError {
        self.call_error.as_ref().expect("Call should have failed")
    }
}

// --- Given steps ---

#[given(expr = "a client configuration for address {string}")]
async fn given_configuration(world: &mut ClientWorld, address: String) {
    world.configure(address);
}

#[given(expr = "a request timeout of {int} milliseconds")]
async fn given_request_timeout(world: &mut ClientWorld, millis: u64) {
    world.config.request_timeout = Duration::from_millis(millis);
}

#[given(expr = "a constructed client for address {string}")]
async fn given_constructed_client(world: &mut ClientWorld, address: String) {
    world.configure(address);
    world.construct();
    assert!(
        world.construction_error.is_none(),
        "construction failed: {:?}",
        world.construction_error
    );
}

#[given("the client has been shut down")]
async fn given_shut_down(world: &mut ClientWorld) {
    world.client().shutdown();
}

// --- When steps ---

#[when("the client is constructed")]
async fn when_constructed(world: &mut ClientWorld) {
    world.construct();
}

#[when("connectivity is probed")]
async fn when_probed(world: &mut ClientWorld) {
    let reachable = world
        .client()
        .probe_connectivity(&Cancellation::new())
        .await;
    world.probe = Some(reachable);
}

#[when(expr = "events are written to stream {string}")]
async fn when_events_written(world: &mut ClientWorld, stream_id: String) {
    let request = WriteEvents {
        event_stream_id: stream_id,
        ..Default::default()
    };
    let result = world
        .client()
        .event_store()
        .write_events(request, &Cancellation::new())
        .await;
    world.record(result);
}

#[when(expr = "the snapshot of stream {string} is read")]
async fn when_snapshot_read(world: &mut ClientWorld, stream_name: String) {
    let result = world
        .client()
        .snapshots()
        .read_snapshot(&stream_name, None, &Cancellation::new())
        .await;
    world.record(result);
}

#[when("the stores are listed")]
async fn when_stores_listed(world: &mut ClientWorld) {
    let result = world
        .client()
        .store_management()
        .list_stores(&Cancellation::new())
        .await;
    world.record(result);
}

#[when("the client is shut down")]
async fn when_shut_down(world: &mut ClientWorld) {
    world.client().shutdown();
}

#[when(expr = "the version of stream {string} is requested")]
async fn when_version_requested(world: &mut ClientWorld, stream_id: String) {
    let result = world
        .client()
        .streams()
        .get_stream_version(&stream_id, None, &Cancellation::new())
        .await;
    world.record(result);
}

#[when(expr = "an event is acknowledged for subscription {string} without an event id")]
async fn when_ack_without_event(world: &mut ClientWorld, subscription: String) {
    let request = AckEventRequest {
        subscription_name: subscription,
        ..Default::default()
    };
    let result = world
        .client()
        .subscriptions()
        .ack_event(request, &Cancellation::new())
        .await;
    world.record(result);
}

// --- Then steps ---

#[then("construction fails with a configuration error")]
async fn then_configuration_error(world: &mut ClientWorld) {
    assert!(world.client.is_none());
    assert!(
        matches!(world.construction_error, Some(ClientError::Configuration(_))),
        "expected configuration error, got {:?}",
        world.construction_error
    );
}

#[then("construction succeeds")]
async fn then_construction_succeeds(world: &mut ClientWorld) {
    assert!(world.construction_error.is_none());
    assert!(!world.client().is_shutdown());
}

#[then("the probe reports the server unreachable")]
async fn then_probe_false(world: &mut ClientWorld) {
    assert_eq!(world.probe, Some(false));
}

#[then(expr = "the call fails as unimplemented for {string}")]
async fn then_unimplemented(world: &mut ClientWorld, capability: String) {
    match world.call_error() {
        ClientError::Unimplemented {
            capability: actual, ..
        } => assert_eq!(actual.to_string(), capability),
        other => panic!("expected Unimplemented, got {other:?}"),
    }
}

#[then("the client reports it is shut down")]
async fn then_shut_down(world: &mut ClientWorld) {
    assert!(world.client().is_shutdown());
}

#[then("the call fails because the client is closed")]
async fn then_closed(world: &mut ClientWorld) {
    assert!(world.call_error().is_closed());
}

#[then("the call fails with an invalid argument")]
async fn then_invalid_argument(world: &mut ClientWorld) {
    assert!(matches!(
        world.call_error(),
        ClientError::InvalidArgument(_)
    ));
}
