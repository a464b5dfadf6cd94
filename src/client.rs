//! Client façade: the single entry point to an ExESDB server.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::config::{ClientConfig, ClientSettings};
use crate::error::{Capability, Result};
use crate::operations::{
    EventStoreOperations, ListStreamsOptions, SnapshotOperations, StoreManagementOperations,
    StreamOperations, SubscriptionOperations,
};
use crate::traits::Streams;
use crate::transport::TransportHandle;

/// Client for an ExESDB server.
///
/// Owns the transport handle and exposes one operation group per capability.
/// Construction validates the configuration and performs no network I/O; the
/// connection is established by the first call. Must be constructed inside a
/// Tokio runtime.
///
/// # Example
///
/// ```no_run
/// use exesdb_client::{Cancellation, ExesdbClient, ListStreamsOptions, Streams};
///
/// # async fn run() -> exesdb_client::Result<()> {
/// let client = ExesdbClient::create("localhost:2113")?;
/// let page = client
///     .streams()
///     .list_streams(ListStreamsOptions::new().max_count(50), &Cancellation::new())
///     .await?;
/// for stream in page.streams {
///     println!("{} @ {}", stream.stream_id, stream.current_version);
/// }
/// client.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct ExesdbClient {
    config: Arc<ClientConfig>,
    transport: TransportHandle,
    streams: StreamOperations,
    events: EventStoreOperations,
    stores: StoreManagementOperations,
    snapshots: SnapshotOperations,
    subscriptions: SubscriptionOperations,
}

impl ExesdbClient {
    /// Validate `config` and open a lazily connected gRPC transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = TransportHandle::connect(&config)?;
        Ok(Self::assemble(config, transport))
    }

    /// Client for `server_address` with default settings.
    pub fn create(server_address: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(server_address))
    }

    /// Client from loaded file/environment settings.
    pub fn from_settings(settings: ClientSettings) -> Result<Self> {
        Self::new(settings.into_config())
    }

    /// Client over an existing transport (alternative transports, tests).
    pub fn with_transport(config: ClientConfig, transport: TransportHandle) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: ClientConfig, transport: TransportHandle) -> Self {
        info!(
            server_address = %config.server_address,
            request_timeout_ms = config.request_timeout.as_millis() as u64,
            "ExESDB client created"
        );

        let config = Arc::new(config);
        let context = |capability| CallContext::new(transport.clone(), config.clone(), capability);
        let streams = StreamOperations::new(context(Capability::Streams));
        let events = EventStoreOperations::new(context(Capability::EventStore));
        let stores = StoreManagementOperations::new(context(Capability::StoreManagement));
        let snapshots = SnapshotOperations::new(context(Capability::Snapshots));
        let subscriptions = SubscriptionOperations::new(context(Capability::Subscriptions));

        Self {
            config,
            transport,
            streams,
            events,
            stores,
            snapshots,
            subscriptions,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn server_address(&self) -> &str {
        &self.config.server_address
    }

    pub fn streams(&self) -> &StreamOperations {
        &self.streams
    }

    pub fn event_store(&self) -> &EventStoreOperations {
        &self.events
    }

    pub fn store_management(&self) -> &StoreManagementOperations {
        &self.stores
    }

    pub fn snapshots(&self) -> &SnapshotOperations {
        &self.snapshots
    }

    pub fn subscriptions(&self) -> &SubscriptionOperations {
        &self.subscriptions
    }

    /// Check that the server answers a read-only call.
    ///
    /// Never fails: any error, including a closed client, is reported as
    /// `false`.
    pub async fn probe_connectivity(&self, cancel: &Cancellation) -> bool {
        match self
            .streams
            .list_streams(ListStreamsOptions::new(), cancel)
            .await
        {
            Ok(_) => {
                debug!(server_address = %self.config.server_address, "Connectivity probe succeeded");
                true
            }
            Err(e) => {
                warn!(
                    server_address = %self.config.server_address,
                    error = %e,
                    "Connectivity probe failed"
                );
                false
            }
        }
    }

    /// Release the transport. Safe to call any number of times; operations
    /// issued afterwards fail with [`ClientError::Closed`](crate::ClientError::Closed).
    pub fn shutdown(&self) {
        if self.transport.close() {
            info!(server_address = %self.config.server_address, "ExESDB client shut down");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.transport.is_closed()
    }
}

impl Drop for ExesdbClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ExesdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExesdbClient")
            .field("server_address", &self.config.server_address)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
