//! Per-call execution policy shared by every operation group.
//!
//! A call fails fast with [`ClientError::Closed`] once the transport is
//! closed, carries the bearer token as `authorization` metadata, and is
//! bounded by `min(explicit timeout, request_timeout)`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tonic::{Code, Request, Status};

use crate::cancel::Cancellation;
use crate::config::{authorization_value, ClientConfig};
use crate::error::{CancelReason, Capability, ClientError, Result};
use crate::transport::{ClosedSignal, Services, TransportHandle};

#[derive(Clone)]
pub(crate) struct CallContext {
    transport: TransportHandle,
    config: Arc<ClientConfig>,
    capability: Capability,
}

impl CallContext {
    pub(crate) fn new(
        transport: TransportHandle,
        config: Arc<ClientConfig>,
        capability: Capability,
    ) -> Self {
        Self {
            transport,
            config,
            capability,
        }
    }

    pub(crate) fn services(&self) -> Result<Services> {
        self.transport.services()
    }

    /// Fail with [`ClientError::Closed`] once the transport is closed.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.transport.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    pub(crate) fn closed_signal(&self) -> ClosedSignal {
        self.transport.closed_signal()
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    /// Wrap `message` with the call metadata. `timeout` becomes the gRPC
    /// deadline sent to the server.
    pub(crate) fn request<M>(&self, message: M, timeout: Option<Duration>) -> Request<M> {
        let mut request = Request::new(message);
        if let Some(timeout) = timeout {
            request.set_timeout(timeout);
        }
        if let Some(value) = self.config.bearer_token().and_then(authorization_value) {
            request.metadata_mut().insert("authorization", value);
        }
        request
    }

    pub(crate) fn classify(&self, method: &'static str, status: Status) -> ClientError {
        ClientError::from_status(self.capability, method, status)
    }

    /// Run one unary call under the cancellation, close and deadline policy.
    pub(crate) async fn unary<M, R, F, Fut>(
        &self,
        method: &'static str,
        cancel: &Cancellation,
        message: M,
        call: F,
    ) -> Result<R>
    where
        F: FnOnce(Services, Request<M>) -> Fut,
        Fut: Future<Output = std::result::Result<R, Status>>,
    {
        let services = self.services()?;
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled {
                method,
                reason: CancelReason::Requested,
            });
        }

        let deadline = cancel.deadline(self.config.request_timeout);
        let request = self.request(message, Some(deadline));
        let mut closed = self.closed_signal();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled {
                method,
                reason: CancelReason::Requested,
            }),
            _ = closed.wait() => Err(ClientError::Closed),
            outcome = tokio::time::timeout(deadline, call(services, request)) => match outcome {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(status)) if status.code() == Code::Cancelled && cancel.is_cancelled() => {
                    Err(ClientError::Cancelled {
                        method,
                        reason: CancelReason::Requested,
                    })
                }
                Ok(Err(status)) => Err(self.classify(method, status)),
                Err(_) => Err(ClientError::Cancelled {
                    method,
                    reason: CancelReason::DeadlineExceeded,
                }),
            },
        }
    }
}
