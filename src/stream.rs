//! Lazily opened, cancellable sequences over server-streaming calls.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use tonic::{Code, Request, Status};
use tracing::{debug, error};

use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::error::{CancelReason, ClientError, Result};
use crate::proto::{StreamEventAppeared, StreamEventBatch};
use crate::transport::{BatchStream, Services};

/// Item delivered by an [`EventStream`].
pub trait StreamItem {
    /// True when this item is the last one of the sequence.
    fn is_end_of_stream(&self) -> bool {
        false
    }
}

impl StreamItem for StreamEventBatch {
    fn is_end_of_stream(&self) -> bool {
        self.is_end_of_stream
    }
}

impl StreamItem for StreamEventAppeared {}

/// Observable lifecycle of an [`EventStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Not pulled yet; no call has been issued.
    Idle,
    Active,
    Completed,
    Cancelled,
    Failed,
}

type OpenFuture<T> = BoxFuture<'static, std::result::Result<BatchStream<T>, Status>>;
type Opener<T> = Box<dyn FnOnce(Services) -> OpenFuture<T> + Send>;

enum State<T> {
    Idle(Opener<T>),
    Active(BatchStream<T>),
    Completed,
    Cancelled,
    Failed,
}

enum Opened<T> {
    Ready(BatchStream<T>),
    Cancelled,
    Closed,
    Failed(Status),
    TimedOut,
}

enum Pulled<T> {
    Item(T),
    Exhausted,
    Cancelled,
    Closed,
    Failed(Status),
}

/// Sequence of items from one server-streaming call.
///
/// The call is issued on the first [`next`](Self::next). Each pull waits for
/// the next item in transport order. The sequence ends with `Ok(None)` when
/// the server finishes, after an item flagged as end-of-stream, or when the
/// cancellation fires. Errors are returned once and end the sequence.
///
/// Dropping the sequence aborts the underlying call. It cannot be restarted;
/// resume by issuing a new read from the last processed version.
pub struct EventStream<T> {
    context: CallContext,
    method: &'static str,
    subject: String,
    cancel: Cancellation,
    state: State<T>,
}

impl<T: StreamItem + Send + 'static> EventStream<T> {
    pub(crate) fn new<M, F, Fut>(
        context: CallContext,
        method: &'static str,
        subject: String,
        cancel: &Cancellation,
        message: M,
        open: F,
    ) -> Self
    where
        M: Send + 'static,
        F: FnOnce(Services, Request<M>) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<BatchStream<T>, Status>> + Send + 'static,
    {
        // The deadline bounds opening the call, not the life of the stream,
        // so no grpc-timeout is sent.
        let request = context.request(message, None);
        let opener: Opener<T> = Box::new(move |services| open(services, request).boxed());
        Self {
            context,
            method,
            subject,
            cancel: cancel.clone(),
            state: State::Idle(opener),
        }
    }

    pub fn state(&self) -> StreamState {
        match self.state {
            State::Idle(_) => StreamState::Idle,
            State::Active(_) => StreamState::Active,
            State::Completed => StreamState::Completed,
            State::Cancelled => StreamState::Cancelled,
            State::Failed => StreamState::Failed,
        }
    }

    /// Pull the next item.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if matches!(self.state, State::Idle(_)) {
            self.open().await?;
        }

        let State::Active(batches) = &mut self.state else {
            return Ok(None);
        };

        let mut closed = self.context.closed_signal();
        let pulled = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Pulled::Cancelled,
            _ = closed.wait() => Pulled::Closed,
            item = batches.next() => match item {
                Some(Ok(item)) => Pulled::Item(item),
                Some(Err(status)) => Pulled::Failed(status),
                None => Pulled::Exhausted,
            },
        };

        match pulled {
            Pulled::Item(item) => {
                if item.is_end_of_stream() {
                    debug!(method = self.method, subject = %self.subject, "End of stream");
                    self.state = State::Completed;
                }
                Ok(Some(item))
            }
            Pulled::Exhausted => {
                self.state = State::Completed;
                Ok(None)
            }
            Pulled::Cancelled => {
                debug!(method = self.method, subject = %self.subject, "Stream cancelled");
                self.state = State::Cancelled;
                Ok(None)
            }
            Pulled::Closed => {
                self.state = State::Failed;
                Err(ClientError::Closed)
            }
            Pulled::Failed(status) => self.fail(status).map(|()| None),
        }
    }

    /// Convert into a [`futures::Stream`] that ends after the first error.
    pub fn into_stream(self) -> BoxStream<'static, Result<T>> {
        futures::stream::unfold(self, |mut events| async move {
            match events.next().await {
                Ok(Some(item)) => Some((Ok(item), events)),
                Ok(None) => None,
                Err(e) => Some((Err(e), events)),
            }
        })
        .boxed()
    }

    async fn open(&mut self) -> Result<()> {
        let State::Idle(opener) = std::mem::replace(&mut self.state, State::Failed) else {
            return Ok(());
        };
        let services = self.context.services()?;
        if self.cancel.is_cancelled() {
            self.state = State::Cancelled;
            return Ok(());
        }

        let deadline = self.cancel.deadline(self.context.request_timeout());
        let mut closed = self.context.closed_signal();
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Opened::Cancelled,
            _ = closed.wait() => Opened::Closed,
            result = tokio::time::timeout(deadline, opener(services)) => match result {
                Ok(Ok(batches)) => Opened::Ready(batches),
                Ok(Err(status)) => Opened::Failed(status),
                Err(_) => Opened::TimedOut,
            },
        };

        match opened {
            Opened::Ready(batches) => {
                self.state = State::Active(batches);
                Ok(())
            }
            Opened::Cancelled => {
                self.state = State::Cancelled;
                Ok(())
            }
            Opened::Closed => Err(ClientError::Closed),
            Opened::Failed(status) => self.fail(status),
            Opened::TimedOut => {
                let err = ClientError::Cancelled {
                    method: self.method,
                    reason: CancelReason::DeadlineExceeded,
                };
                error!(method = self.method, subject = %self.subject, error = %err, "Stream failed to open");
                Err(err)
            }
        }
    }

    /// A transport `CANCELLED` after our own signal fired is a silent stop.
    fn fail(&mut self, status: Status) -> Result<()> {
        if status.code() == Code::Cancelled && self.cancel.is_cancelled() {
            self.state = State::Cancelled;
            return Ok(());
        }
        self.state = State::Failed;
        let err = self.context.classify(self.method, status);
        error!(method = self.method, subject = %self.subject, error = %err, "Stream failed");
        Err(err)
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("method", &self.method)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
