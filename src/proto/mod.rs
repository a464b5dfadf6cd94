//! Wire contract of the `reckondb.client.messages` package.
//!
//! Generated from `proto/reckondb/client/messages.proto`. Fields declared
//! `optional` distinguish "unset" from an explicit empty or zero value:
//! `None` is never put on the wire, while `Some(String::new())` is sent as
//! an explicit empty string.

tonic::include_proto!("reckondb.client.messages");

mod ext;

pub use ext::{
    CONTENT_TYPE_BINARY, CONTENT_TYPE_JSON, EXPECTED_VERSION_ANY, EXPECTED_VERSION_NO_STREAM,
};
pub use stream_operations_client::StreamOperationsClient;
pub use subscription_management_client::SubscriptionManagementClient;
