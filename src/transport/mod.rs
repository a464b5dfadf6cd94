//! Transport handle and the wire-level service seams.
//!
//! The service traits describe what the server answers, one method per RPC.
//! [`grpc`] implements them over a tonic channel; tests implement them with
//! a scripted mock. Every operation group holds a clone of the same
//! [`TransportHandle`]; closing it releases the services for all of them.

mod grpc;
#[cfg(test)]
pub(crate) mod mock;

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::watch;
use tonic::{Request, Status};

use crate::config::{ClientConfig, ConfigError};
use crate::error::{ClientError, Result};
use crate::proto::{
    AckEventRequest, AckEventResponse, CreatePersistentSubscriptionRequest,
    CreatePersistentSubscriptionResponse, DeleteSnapshotRequest, DeleteSnapshotResponse,
    DeleteStream, DeleteStreamCompleted, GetStoreContextRequest, GetStoreContextResponse,
    GetStreamInfoRequest, GetStreamInfoResponse, GetStreamVersionRequest,
    GetStreamVersionResponse, GetStreamsRequest, GetStreamsResponse, HealthCheckRequest,
    HealthCheckResponse, ListSnapshotsRequest, ListSnapshotsResponse, ListStoresRequest,
    ListStoresResponse, ListSubscriptionsRequest, ListSubscriptionsResponse, ReadAllEvents,
    ReadAllEventsCompleted, ReadEvent, ReadEventCompleted, ReadSnapshotRequest,
    ReadSnapshotResponse, ReadStreamEvents, ReadStreamEventsCompleted, RecordSnapshotRequest,
    RecordSnapshotResponse, RemovePersistentSubscriptionRequest,
    RemovePersistentSubscriptionResponse, SetStoreContextRequest, SetStoreContextResponse,
    StreamBackwardRequest, StreamEventAppeared, StreamEventBatch, StreamForwardRequest,
    SubscribeToStream, WriteEvents, WriteEventsCompleted,
};

/// Server-streaming response body.
pub type BatchStream<T> = Pin<Box<dyn Stream<Item = std::result::Result<T, Status>> + Send>>;

type Answer<T> = std::result::Result<T, Status>;

const EVENT_STORE_UNIMPLEMENTED: &str = "EventStore operations not yet implemented";
const STORE_MANAGEMENT_UNIMPLEMENTED: &str = "Store management operations not yet implemented";
const SNAPSHOTS_UNIMPLEMENTED: &str = "Snapshot operations not yet implemented";

/// `StreamOperations` service.
#[async_trait]
pub trait StreamService: Send + Sync {
    async fn get_streams(&self, request: Request<GetStreamsRequest>) -> Answer<GetStreamsResponse>;

    async fn get_stream_version(
        &self,
        request: Request<GetStreamVersionRequest>,
    ) -> Answer<GetStreamVersionResponse>;

    async fn stream_forward(
        &self,
        request: Request<StreamForwardRequest>,
    ) -> Answer<BatchStream<StreamEventBatch>>;

    async fn stream_backward(
        &self,
        request: Request<StreamBackwardRequest>,
    ) -> Answer<BatchStream<StreamEventBatch>>;
}

/// Event store RPCs. The server does not expose them yet, so every method
/// answers `UNIMPLEMENTED` unless an implementation overrides it.
#[async_trait]
pub trait EventStoreService: Send + Sync {
    async fn write_events(&self, _request: Request<WriteEvents>) -> Answer<WriteEventsCompleted> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn read_event(&self, _request: Request<ReadEvent>) -> Answer<ReadEventCompleted> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn read_stream_events(
        &self,
        _request: Request<ReadStreamEvents>,
    ) -> Answer<ReadStreamEventsCompleted> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn read_all_events(
        &self,
        _request: Request<ReadAllEvents>,
    ) -> Answer<ReadAllEventsCompleted> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn subscribe_to_stream(
        &self,
        _request: Request<SubscribeToStream>,
    ) -> Answer<BatchStream<StreamEventAppeared>> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn delete_stream(&self, _request: Request<DeleteStream>) -> Answer<DeleteStreamCompleted> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn get_stream_info(
        &self,
        _request: Request<GetStreamInfoRequest>,
    ) -> Answer<GetStreamInfoResponse> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }

    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Answer<HealthCheckResponse> {
        Err(Status::unimplemented(EVENT_STORE_UNIMPLEMENTED))
    }
}

/// Store management RPCs, not exposed by the server yet.
#[async_trait]
pub trait StoreService: Send + Sync {
    async fn list_stores(&self, _request: Request<ListStoresRequest>) -> Answer<ListStoresResponse> {
        Err(Status::unimplemented(STORE_MANAGEMENT_UNIMPLEMENTED))
    }

    async fn set_store_context(
        &self,
        _request: Request<SetStoreContextRequest>,
    ) -> Answer<SetStoreContextResponse> {
        Err(Status::unimplemented(STORE_MANAGEMENT_UNIMPLEMENTED))
    }

    async fn get_store_context(
        &self,
        _request: Request<GetStoreContextRequest>,
    ) -> Answer<GetStoreContextResponse> {
        Err(Status::unimplemented(STORE_MANAGEMENT_UNIMPLEMENTED))
    }
}

/// Snapshot RPCs, not exposed by the server yet.
#[async_trait]
pub trait SnapshotService: Send + Sync {
    async fn record_snapshot(
        &self,
        _request: Request<RecordSnapshotRequest>,
    ) -> Answer<RecordSnapshotResponse> {
        Err(Status::unimplemented(SNAPSHOTS_UNIMPLEMENTED))
    }

    async fn read_snapshot(
        &self,
        _request: Request<ReadSnapshotRequest>,
    ) -> Answer<ReadSnapshotResponse> {
        Err(Status::unimplemented(SNAPSHOTS_UNIMPLEMENTED))
    }

    async fn delete_snapshot(
        &self,
        _request: Request<DeleteSnapshotRequest>,
    ) -> Answer<DeleteSnapshotResponse> {
        Err(Status::unimplemented(SNAPSHOTS_UNIMPLEMENTED))
    }

    async fn list_snapshots(
        &self,
        _request: Request<ListSnapshotsRequest>,
    ) -> Answer<ListSnapshotsResponse> {
        Err(Status::unimplemented(SNAPSHOTS_UNIMPLEMENTED))
    }
}

/// `SubscriptionManagement` service.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn create_persistent_subscription(
        &self,
        request: Request<CreatePersistentSubscriptionRequest>,
    ) -> Answer<CreatePersistentSubscriptionResponse>;

    async fn remove_persistent_subscription(
        &self,
        request: Request<RemovePersistentSubscriptionRequest>,
    ) -> Answer<RemovePersistentSubscriptionResponse>;

    async fn list_subscriptions(
        &self,
        request: Request<ListSubscriptionsRequest>,
    ) -> Answer<ListSubscriptionsResponse>;

    async fn ack_event(&self, request: Request<AckEventRequest>) -> Answer<AckEventResponse>;
}

/// The set of services reachable through one transport.
#[derive(Clone)]
pub struct Services {
    pub streams: Arc<dyn StreamService>,
    pub events: Arc<dyn EventStoreService>,
    pub stores: Arc<dyn StoreService>,
    pub snapshots: Arc<dyn SnapshotService>,
    pub subscriptions: Arc<dyn SubscriptionService>,
}

impl Services {
    /// Use one value for every service.
    pub fn from_shared<S>(service: Arc<S>) -> Self
    where
        S: StreamService
            + EventStoreService
            + StoreService
            + SnapshotService
            + SubscriptionService
            + 'static,
    {
        Self {
            streams: service.clone(),
            events: service.clone(),
            stores: service.clone(),
            snapshots: service.clone(),
            subscriptions: service,
        }
    }
}

/// Shared, closable handle to the transport.
///
/// Clones share state. [`close`](Self::close) drops the services, wakes every
/// in-flight call and makes later calls fail with [`ClientError::Closed`].
#[derive(Clone)]
pub struct TransportHandle {
    inner: Arc<Shared>,
}

struct Shared {
    endpoint: String,
    services: Mutex<Option<Services>>,
    closed: watch::Sender<bool>,
}

impl TransportHandle {
    /// Open a lazily connected gRPC transport for `config`.
    ///
    /// No network traffic happens here; the connection is established by the
    /// first call. Must be called inside a Tokio runtime.
    pub fn connect(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        let services = grpc::open(config)?;
        Ok(Self::from_services(config.server_address.clone(), services))
    }

    /// Wrap an existing set of services (alternative transports, mocks).
    pub fn from_services(endpoint: impl Into<String>, services: Services) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            inner: Arc::new(Shared {
                endpoint: endpoint.into(),
                services: Mutex::new(Some(services)),
                closed,
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Current services, or [`ClientError::Closed`].
    pub(crate) fn services(&self) -> Result<Services> {
        self.inner
            .services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClientError::Closed)
    }

    /// Release the services. Returns `true` for the call that closed the
    /// handle and `false` for every later call.
    pub fn close(&self) -> bool {
        let released = self
            .inner
            .services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.inner.closed.send_replace(true);
        released.is_some()
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    pub(crate) fn closed_signal(&self) -> ClosedSignal {
        ClosedSignal(self.inner.closed.subscribe())
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("endpoint", &self.inner.endpoint)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Resolves once the transport is closed.
pub(crate) struct ClosedSignal(watch::Receiver<bool>);

impl ClosedSignal {
    pub(crate) async fn wait(&mut self) {
        let _ = self.0.wait_for(|closed| *closed).await;
    }
}
