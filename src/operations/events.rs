//! Event store operations group.
//!
//! The server does not serve these RPCs yet. Calls still run the full
//! pipeline and surface the answer as [`ClientError::Unimplemented`], so
//! callers can feature-detect the capability.
//!
//! [`ClientError::Unimplemented`]: crate::error::ClientError::Unimplemented

use async_trait::async_trait;
use tracing::{debug, error};

use super::store_label;
use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::error::Result;
use crate::proto::{
    DeleteStream, DeleteStreamCompleted, GetStreamInfoRequest, GetStreamInfoResponse,
    HealthCheckRequest, HealthCheckResponse, ReadAllEvents, ReadAllEventsCompleted, ReadEvent,
    ReadEventCompleted, ReadStreamEvents, ReadStreamEventsCompleted, StreamEventAppeared,
    SubscribeToStream, WriteEvents, WriteEventsCompleted,
};
use crate::stream::EventStream;
use crate::traits::EventStore;

#[derive(Clone)]
pub struct EventStoreOperations {
    context: CallContext,
}

impl EventStoreOperations {
    pub(crate) fn new(context: CallContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl EventStore for EventStoreOperations {
    async fn write_events(
        &self,
        request: WriteEvents,
        cancel: &Cancellation,
    ) -> Result<WriteEventsCompleted> {
        let stream_id = request.event_stream_id.clone();
        let store = request.store_id.clone();
        debug!(
            stream_id = %stream_id,
            store_id = store_label(store.as_deref()),
            expected_version = request.expected_version,
            count = request.events.len(),
            "Writing events"
        );

        self.context
            .unary("write_events", cancel, request, |s, req| async move {
                s.events.write_events(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_id = %stream_id,
                    store_id = store_label(store.as_deref()),
                    error = %e,
                    "Failed to write events"
                )
            })
    }

    async fn read_event(
        &self,
        request: ReadEvent,
        cancel: &Cancellation,
    ) -> Result<ReadEventCompleted> {
        let stream_id = request.event_stream_id.clone();
        let store = request.store_id.clone();
        let event_number = request.event_number;
        debug!(
            stream_id = %stream_id,
            store_id = store_label(store.as_deref()),
            event_number,
            "Reading event"
        );

        self.context
            .unary("read_event", cancel, request, |s, req| async move {
                s.events.read_event(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_id = %stream_id,
                    store_id = store_label(store.as_deref()),
                    event_number,
                    error = %e,
                    "Failed to read event"
                )
            })
    }

    async fn read_stream_events(
        &self,
        request: ReadStreamEvents,
        cancel: &Cancellation,
    ) -> Result<ReadStreamEventsCompleted> {
        let stream_id = request.event_stream_id.clone();
        let store = request.store_id.clone();
        debug!(
            stream_id = %stream_id,
            store_id = store_label(store.as_deref()),
            from = request.from_event_number,
            max_count = request.max_count,
            "Reading stream events"
        );

        self.context
            .unary("read_stream_events", cancel, request, |s, req| async move {
                s.events.read_stream_events(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_id = %stream_id,
                    store_id = store_label(store.as_deref()),
                    error = %e,
                    "Failed to read stream events"
                )
            })
    }

    async fn read_all_events(
        &self,
        request: ReadAllEvents,
        cancel: &Cancellation,
    ) -> Result<ReadAllEventsCompleted> {
        let store = request.store_id.clone();
        debug!(
            store_id = store_label(store.as_deref()),
            commit_position = request.commit_position,
            max_count = request.max_count,
            "Reading all events"
        );

        self.context
            .unary("read_all_events", cancel, request, |s, req| async move {
                s.events.read_all_events(req).await
            })
            .await
            .inspect_err(|e| {
                error!(store_id = store_label(store.as_deref()), error = %e, "Failed to read all events")
            })
    }

    fn subscribe_to_stream(
        &self,
        request: SubscribeToStream,
        cancel: &Cancellation,
    ) -> EventStream<StreamEventAppeared> {
        debug!(
            stream_id = %request.event_stream_id,
            store_id = store_label(request.store_id.as_deref()),
            "Subscribing to stream"
        );
        let subject = request.event_stream_id.clone();
        EventStream::new(
            self.context.clone(),
            "subscribe_to_stream",
            subject,
            cancel,
            request,
            |s, req| async move { s.events.subscribe_to_stream(req).await },
        )
    }

    async fn delete_stream(
        &self,
        request: DeleteStream,
        cancel: &Cancellation,
    ) -> Result<DeleteStreamCompleted> {
        let stream_id = request.event_stream_id.clone();
        let store = request.store_id.clone();
        debug!(
            stream_id = %stream_id,
            store_id = store_label(store.as_deref()),
            hard_delete = request.hard_delete,
            "Deleting stream"
        );

        self.context
            .unary("delete_stream", cancel, request, |s, req| async move {
                s.events.delete_stream(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_id = %stream_id,
                    store_id = store_label(store.as_deref()),
                    error = %e,
                    "Failed to delete stream"
                )
            })
    }

    async fn get_stream_info(
        &self,
        stream_id: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<GetStreamInfoResponse> {
        debug!(stream_id, store_id = store_label(store_id), "Getting stream info");

        let request = GetStreamInfoRequest {
            stream_id: stream_id.to_string(),
            store_id: store_id.map(str::to_string),
        };
        self.context
            .unary("get_stream_info", cancel, request, |s, req| async move {
                s.events.get_stream_info(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_id,
                    store_id = store_label(store_id),
                    error = %e,
                    "Failed to get stream info"
                )
            })
    }

    async fn health_check(&self, cancel: &Cancellation) -> Result<HealthCheckResponse> {
        debug!("Checking server health");

        self.context
            .unary("health_check", cancel, HealthCheckRequest {}, |s, req| async move {
                s.events.health_check(req).await
            })
            .await
            .inspect_err(|e| error!(error = %e, "Health check failed"))
    }
}
