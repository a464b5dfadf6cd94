//! Stream operations group.

use async_trait::async_trait;
use tracing::{debug, error};

use super::store_label;
use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::error::Result;
use crate::proto::{
    GetStreamVersionRequest, GetStreamVersionResponse, GetStreamsRequest, GetStreamsResponse,
    StreamBackwardRequest, StreamEventBatch, StreamForwardRequest,
};
use crate::stream::EventStream;
use crate::traits::Streams;

/// Version reported for a stream that does not exist.
pub const NO_STREAM_VERSION: i64 = -1;

/// Filters and paging for [`Streams::list_streams`].
///
/// Unset fields are omitted from the request. An explicit empty store id or
/// a zero `max_count` is sent as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListStreamsOptions {
    pub store_id: Option<String>,
    pub max_count: Option<i32>,
    pub continuation_token: Option<String>,
}

impl ListStreamsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_id(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn max_count(mut self, max_count: i32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Continue after the page that returned `token`.
    pub fn continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    fn into_request(self) -> GetStreamsRequest {
        GetStreamsRequest {
            store_id: self.store_id,
            max_count: self.max_count,
            continuation_token: self.continuation_token,
        }
    }
}

/// Read-oriented stream metadata and streaming reads.
#[derive(Clone)]
pub struct StreamOperations {
    context: CallContext,
}

impl StreamOperations {
    pub(crate) fn new(context: CallContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Streams for StreamOperations {
    async fn list_streams(
        &self,
        options: ListStreamsOptions,
        cancel: &Cancellation,
    ) -> Result<GetStreamsResponse> {
        let store = options.store_id.clone();
        debug!(
            store_id = store_label(store.as_deref()),
            max_count = ?options.max_count,
            "Listing streams"
        );

        self.context
            .unary("get_streams", cancel, options.into_request(), |s, req| async move {
                s.streams.get_streams(req).await
            })
            .await
            .inspect_err(|e| {
                error!(store_id = store_label(store.as_deref()), error = %e, "Failed to list streams")
            })
    }

    async fn get_stream_version(
        &self,
        stream_id: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<GetStreamVersionResponse> {
        debug!(stream_id, store_id = store_label(store_id), "Getting stream version");

        let request = GetStreamVersionRequest {
            stream_id: stream_id.to_string(),
            store_id: store_id.map(str::to_string),
        };
        let result = self
            .context
            .unary("get_stream_version", cancel, request, |s, req| async move {
                s.streams.get_stream_version(req).await
            })
            .await;

        match result {
            Err(e) if e.is_not_found() => {
                debug!(stream_id, store_id = store_label(store_id), "Stream not found");
                Ok(GetStreamVersionResponse {
                    success: false,
                    version: NO_STREAM_VERSION,
                    error_message: Some(e.message()),
                })
            }
            other => other.inspect_err(|e| {
                error!(
                    stream_id,
                    store_id = store_label(store_id),
                    error = %e,
                    "Failed to get stream version"
                )
            }),
        }
    }

    fn stream_forward(
        &self,
        request: StreamForwardRequest,
        cancel: &Cancellation,
    ) -> EventStream<StreamEventBatch> {
        debug!(
            stream_id = %request.stream_id,
            store_id = store_label(request.store_id.as_deref()),
            start_version = request.start_version,
            count = request.count,
            "Streaming forward"
        );
        let subject = request.stream_id.clone();
        EventStream::new(
            self.context.clone(),
            "stream_forward",
            subject,
            cancel,
            request,
            |s, req| async move { s.streams.stream_forward(req).await },
        )
    }

    fn stream_backward(
        &self,
        request: StreamBackwardRequest,
        cancel: &Cancellation,
    ) -> EventStream<StreamEventBatch> {
        debug!(
            stream_id = %request.stream_id,
            store_id = store_label(request.store_id.as_deref()),
            start_version = request.start_version,
            count = request.count,
            "Streaming backward"
        );
        let subject = request.stream_id.clone();
        EventStream::new(
            self.context.clone(),
            "stream_backward",
            subject,
            cancel,
            request,
            |s, req| async move { s.streams.stream_backward(req).await },
        )
    }
}
