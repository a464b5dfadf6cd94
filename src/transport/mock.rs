//! Scripted in-memory services for unit tests.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use tonic::metadata::MetadataMap;
use tonic::{Code, Request, Status};

use super::{
    BatchStream, EventStoreService, Services, SnapshotService, StoreService, StreamService,
    SubscriptionService, TransportHandle,
};
use crate::proto::{
    AckEventRequest, AckEventResponse, CreatePersistentSubscriptionRequest,
    CreatePersistentSubscriptionResponse, GetStreamVersionRequest, GetStreamVersionResponse,
    GetStreamsRequest, GetStreamsResponse, ListSubscriptionsRequest, ListSubscriptionsResponse,
    RemovePersistentSubscriptionRequest, RemovePersistentSubscriptionResponse,
    StreamBackwardRequest, StreamEventBatch, StreamForwardRequest, StreamInfo, SubscriptionInfo,
};

/// One scripted element of a streaming response.
pub(crate) enum Scripted {
    Batch(StreamEventBatch),
    Fail(Code, &'static str),
}

#[derive(Default)]
pub(crate) struct MockServices {
    streams: Vec<StreamInfo>,
    continuation_token: Option<String>,
    versions: HashMap<String, i64>,
    script: Mutex<Vec<Scripted>>,
    hang_after_script: bool,
    subscriptions: Vec<SubscriptionInfo>,
    failure: Option<(Code, &'static str)>,
    open_failure: Option<(Code, &'static str)>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    released: Arc<AtomicBool>,
    metadata: Mutex<Vec<MetadataMap>>,
    pub get_streams_requests: Mutex<Vec<GetStreamsRequest>>,
    pub version_requests: Mutex<Vec<GetStreamVersionRequest>>,
    pub forward_requests: Mutex<Vec<StreamForwardRequest>>,
    pub backward_requests: Mutex<Vec<StreamBackwardRequest>>,
    pub create_requests: Mutex<Vec<CreatePersistentSubscriptionRequest>>,
    pub ack_requests: Mutex<Vec<AckEventRequest>>,
}

impl MockServices {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_streams(mut self, streams: Vec<StreamInfo>, token: Option<&str>) -> Self {
        self.streams = streams;
        self.continuation_token = token.map(str::to_string);
        self
    }

    pub(crate) fn with_version(mut self, stream_id: &str, version: i64) -> Self {
        self.versions.insert(stream_id.to_string(), version);
        self
    }

    pub(crate) fn with_script(self, script: Vec<Scripted>) -> Self {
        *self.script.lock().unwrap() = script;
        self
    }

    /// Keep streaming responses open after the script runs out.
    pub(crate) fn hanging(mut self) -> Self {
        self.hang_after_script = true;
        self
    }

    pub(crate) fn with_subscriptions(mut self, subscriptions: Vec<SubscriptionInfo>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    /// Fail every backed call with `code`.
    pub(crate) fn failing(mut self, code: Code, message: &'static str) -> Self {
        self.failure = Some((code, message));
        self
    }

    /// Fail opening streaming calls with `code`.
    pub(crate) fn failing_open(mut self, code: Code, message: &'static str) -> Self {
        self.open_failure = Some((code, message));
        self
    }

    /// Wait before answering any call.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn into_handle(self) -> (Arc<Self>, TransportHandle) {
        let mock = Arc::new(self);
        let handle = TransportHandle::from_services("mock", Services::from_shared(mock.clone()));
        (mock, handle)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// True once a streaming response handed out by the mock was dropped.
    pub(crate) fn stream_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn last_metadata(&self) -> MetadataMap {
        self.metadata.lock().unwrap().last().cloned().unwrap_or_default()
    }

    async fn answer<M>(&self, request: Request<M>) -> Result<M, Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .lock()
            .unwrap()
            .push(request.metadata().clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((code, message)) = self.failure {
            return Err(Status::new(code, message));
        }
        Ok(request.into_inner())
    }

    fn batches(&self) -> Result<BatchStream<StreamEventBatch>, Status> {
        if let Some((code, message)) = self.open_failure {
            return Err(Status::new(code, message));
        }
        let items: Vec<_> = self
            .script
            .lock()
            .unwrap()
            .drain(..)
            .map(|item| match item {
                Scripted::Batch(batch) => Ok(batch),
                Scripted::Fail(code, message) => Err(Status::new(code, message)),
            })
            .collect();

        let batches: BatchStream<StreamEventBatch> = if self.hang_after_script {
            Box::pin(stream::iter(items).chain(stream::pending()))
        } else {
            Box::pin(stream::iter(items))
        };
        Ok(Box::pin(Tracked {
            inner: batches,
            released: self.released.clone(),
        }))
    }
}

/// Flags the mock when the consumer drops a streaming response.
struct Tracked<T> {
    inner: BatchStream<T>,
    released: Arc<AtomicBool>,
}

impl<T> Stream for Tracked<T> {
    type Item = Result<T, Status>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl StreamService for MockServices {
    async fn get_streams(
        &self,
        request: Request<GetStreamsRequest>,
    ) -> Result<GetStreamsResponse, Status> {
        let request = self.answer(request).await?;
        self.get_streams_requests.lock().unwrap().push(request);
        Ok(GetStreamsResponse {
            streams: self.streams.clone(),
            continuation_token: self.continuation_token.clone(),
        })
    }

    async fn get_stream_version(
        &self,
        request: Request<GetStreamVersionRequest>,
    ) -> Result<GetStreamVersionResponse, Status> {
        let request = self.answer(request).await?;
        let version = self.versions.get(&request.stream_id).copied();
        self.version_requests.lock().unwrap().push(request);
        match version {
            Some(version) => Ok(GetStreamVersionResponse {
                success: true,
                version,
                error_message: None,
            }),
            None => Err(Status::not_found("stream not found")),
        }
    }

    async fn stream_forward(
        &self,
        request: Request<StreamForwardRequest>,
    ) -> Result<BatchStream<StreamEventBatch>, Status> {
        let request = self.answer(request).await?;
        self.forward_requests.lock().unwrap().push(request);
        self.batches()
    }

    async fn stream_backward(
        &self,
        request: Request<StreamBackwardRequest>,
    ) -> Result<BatchStream<StreamEventBatch>, Status> {
        let request = self.answer(request).await?;
        self.backward_requests.lock().unwrap().push(request);
        self.batches()
    }
}

impl EventStoreService for MockServices {}

impl StoreService for MockServices {}

impl SnapshotService for MockServices {}

#[async_trait]
impl SubscriptionService for MockServices {
    async fn create_persistent_subscription(
        &self,
        request: Request<CreatePersistentSubscriptionRequest>,
    ) -> Result<CreatePersistentSubscriptionResponse, Status> {
        let request = self.answer(request).await?;
        let exists = self
            .subscriptions
            .iter()
            .any(|s| s.subscription_name == request.subscription_name);
        self.create_requests.lock().unwrap().push(request);
        if exists {
            return Err(Status::already_exists("subscription already exists"));
        }
        Ok(CreatePersistentSubscriptionResponse {
            success: true,
            error_message: None,
        })
    }

    async fn remove_persistent_subscription(
        &self,
        request: Request<RemovePersistentSubscriptionRequest>,
    ) -> Result<RemovePersistentSubscriptionResponse, Status> {
        self.answer(request).await?;
        Ok(RemovePersistentSubscriptionResponse {
            success: true,
            error_message: None,
        })
    }

    async fn list_subscriptions(
        &self,
        request: Request<ListSubscriptionsRequest>,
    ) -> Result<ListSubscriptionsResponse, Status> {
        self.answer(request).await?;
        Ok(ListSubscriptionsResponse {
            subscriptions: self.subscriptions.clone(),
        })
    }

    async fn ack_event(&self, request: Request<AckEventRequest>) -> Result<AckEventResponse, Status> {
        let request = self.answer(request).await?;
        self.ack_requests.lock().unwrap().push(request);
        Ok(AckEventResponse { success: true })
    }
}
