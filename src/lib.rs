//! ExESDB client
//!
//! Async client for the ExESDB event store over gRPC. [`ExesdbClient`] owns
//! one transport and exposes an operation group per capability: streams,
//! event store, store management, snapshots and persistent subscriptions.
//! Streaming reads are returned as lazily opened [`EventStream`]s.
//!
//! Capabilities the server does not serve yet answer with
//! [`ClientError::Unimplemented`], so callers can feature-detect them.

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod operations;
pub mod proto;
pub mod stream;
pub mod traits;
pub mod transport;
pub mod utils;

mod call;

pub use cancel::Cancellation;
pub use client::ExesdbClient;
pub use config::{ChannelOptions, ClientConfig, ClientSettings, ConfigError, Credentials};
pub use error::{CancelReason, Capability, ClientError, Result};
pub use operations::{
    EventStoreOperations, ListStreamsOptions, SnapshotOperations, StoreManagementOperations,
    StreamOperations, SubscriptionOperations,
};
pub use stream::{EventStream, StreamItem, StreamState};
pub use traits::{EventStore, Snapshots, StoreManagement, Streams, Subscriptions};
pub use transport::TransportHandle;
