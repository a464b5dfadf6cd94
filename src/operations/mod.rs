//! Concrete operation groups.
//!
//! Each group shares the façade's transport handle and configuration through
//! a [`CallContext`](crate::call::CallContext). Groups are cheap to clone.

mod events;
mod snapshots;
mod stores;
mod streams;
mod subscriptions;

pub use events::EventStoreOperations;
pub use snapshots::SnapshotOperations;
pub use stores::StoreManagementOperations;
pub use streams::{ListStreamsOptions, StreamOperations};
pub use subscriptions::SubscriptionOperations;

/// Store id as it appears in logs.
fn store_label(store_id: Option<&str>) -> &str {
    store_id.unwrap_or("default")
}
