//! Capability traits, one per operation group.
//!
//! The façade hands out concrete groups that implement these traits.
//! Application code can depend on the traits instead and substitute its own
//! implementations in tests.

use async_trait::async_trait;

use crate::cancel::Cancellation;
use crate::error::Result;
use crate::operations::ListStreamsOptions;
use crate::proto::{
    AckEventRequest, AckEventResponse, CreatePersistentSubscriptionRequest,
    CreatePersistentSubscriptionResponse, DeleteSnapshotResponse, DeleteStream,
    DeleteStreamCompleted, GetStoreContextResponse, GetStreamInfoResponse,
    GetStreamVersionResponse, GetStreamsResponse, HealthCheckResponse, ListSnapshotsResponse,
    ListStoresResponse, ListSubscriptionsResponse, ReadAllEvents, ReadAllEventsCompleted,
    ReadEvent, ReadEventCompleted, ReadSnapshotResponse, ReadStreamEvents,
    ReadStreamEventsCompleted, RecordSnapshotResponse, RemovePersistentSubscriptionRequest,
    RemovePersistentSubscriptionResponse, SetStoreContextResponse, StreamBackwardRequest,
    StreamEventAppeared, StreamEventBatch, StreamForwardRequest, SubscribeToStream, WriteEvents,
    WriteEventsCompleted,
};
use crate::stream::EventStream;

/// Stream metadata and streaming reads.
#[async_trait]
pub trait Streams: Send + Sync {
    /// One page of streams. Unset options are not sent.
    async fn list_streams(
        &self,
        options: ListStreamsOptions,
        cancel: &Cancellation,
    ) -> Result<GetStreamsResponse>;

    /// Current version of a stream. A missing stream is reported as
    /// `success == false`, not as an error.
    async fn get_stream_version(
        &self,
        stream_id: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<GetStreamVersionResponse>;

    /// Read forward from `start_version` in batches.
    fn stream_forward(
        &self,
        request: StreamForwardRequest,
        cancel: &Cancellation,
    ) -> EventStream<StreamEventBatch>;

    /// Read backward from `start_version` in batches.
    fn stream_backward(
        &self,
        request: StreamBackwardRequest,
        cancel: &Cancellation,
    ) -> EventStream<StreamEventBatch>;
}

/// Event writes, reads and live subscriptions.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn write_events(
        &self,
        request: WriteEvents,
        cancel: &Cancellation,
    ) -> Result<WriteEventsCompleted>;

    async fn read_event(&self, request: ReadEvent, cancel: &Cancellation)
        -> Result<ReadEventCompleted>;

    async fn read_stream_events(
        &self,
        request: ReadStreamEvents,
        cancel: &Cancellation,
    ) -> Result<ReadStreamEventsCompleted>;

    async fn read_all_events(
        &self,
        request: ReadAllEvents,
        cancel: &Cancellation,
    ) -> Result<ReadAllEventsCompleted>;

    /// Live events appended to a stream.
    fn subscribe_to_stream(
        &self,
        request: SubscribeToStream,
        cancel: &Cancellation,
    ) -> EventStream<StreamEventAppeared>;

    async fn delete_stream(
        &self,
        request: DeleteStream,
        cancel: &Cancellation,
    ) -> Result<DeleteStreamCompleted>;

    async fn get_stream_info(
        &self,
        stream_id: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<GetStreamInfoResponse>;

    async fn health_check(&self, cancel: &Cancellation) -> Result<HealthCheckResponse>;
}

/// Store listing and the default store context.
#[async_trait]
pub trait StoreManagement: Send + Sync {
    async fn list_stores(&self, cancel: &Cancellation) -> Result<ListStoresResponse>;

    async fn set_store_context(
        &self,
        store_id: &str,
        cancel: &Cancellation,
    ) -> Result<SetStoreContextResponse>;

    async fn get_store_context(&self, cancel: &Cancellation) -> Result<GetStoreContextResponse>;
}

/// Snapshots keyed by stream name and optional store.
#[async_trait]
pub trait Snapshots: Send + Sync {
    async fn record_snapshot(
        &self,
        stream_name: &str,
        data: Vec<u8>,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<RecordSnapshotResponse>;

    async fn read_snapshot(
        &self,
        stream_name: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<ReadSnapshotResponse>;

    async fn delete_snapshot(
        &self,
        stream_name: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<DeleteSnapshotResponse>;

    async fn list_snapshots(
        &self,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<ListSnapshotsResponse>;
}

/// Persistent subscription management.
#[async_trait]
pub trait Subscriptions: Send + Sync {
    /// Fails if the name is empty or (server side) already taken.
    async fn create_persistent_subscription(
        &self,
        request: CreatePersistentSubscriptionRequest,
        cancel: &Cancellation,
    ) -> Result<CreatePersistentSubscriptionResponse>;

    async fn remove_persistent_subscription(
        &self,
        request: RemovePersistentSubscriptionRequest,
        cancel: &Cancellation,
    ) -> Result<RemovePersistentSubscriptionResponse>;

    async fn list_subscriptions(
        &self,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<ListSubscriptionsResponse>;

    /// Acknowledge a processed event. Requires the subscription name and the
    /// event id.
    async fn ack_event(
        &self,
        request: AckEventRequest,
        cancel: &Cancellation,
    ) -> Result<AckEventResponse>;
}
