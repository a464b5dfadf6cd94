//! Convenience methods on generated wire types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    CreatePersistentSubscriptionRequest, GetStreamsResponse, NewEvent, RecordedEvent,
    ResolvedEvent, StreamEventBatch, SubscriptionType,
};

/// Content type marker for binary payloads.
pub const CONTENT_TYPE_BINARY: i32 = 0;
/// Content type marker for JSON payloads.
pub const CONTENT_TYPE_JSON: i32 = 1;

/// Expected version: the stream may or may not exist.
pub const EXPECTED_VERSION_ANY: i64 = -2;
/// Expected version: the stream must not exist yet.
pub const EXPECTED_VERSION_NO_STREAM: i64 = -1;

impl GetStreamsResponse {
    /// True when the server reported more streams after this page.
    pub fn has_more(&self) -> bool {
        self.continuation_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

impl StreamEventBatch {
    /// Highest event number in the batch, if it carries events.
    pub fn last_event_number(&self) -> Option<i64> {
        self.events.iter().map(|e| e.event_number).max()
    }
}

impl NewEvent {
    /// Binary event with a fresh random id.
    pub fn new(event_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            event_id: Uuid::new_v4().as_bytes().to_vec(),
            event_type: event_type.into(),
            data_content_type: CONTENT_TYPE_BINARY,
            metadata_content_type: CONTENT_TYPE_BINARY,
            data,
            metadata: Vec::new(),
        }
    }

    /// JSON event with a fresh random id.
    pub fn json(event_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            data_content_type: CONTENT_TYPE_JSON,
            ..Self::new(event_type, data)
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl RecordedEvent {
    /// Event id as a UUID, if it is one.
    pub fn event_uuid(&self) -> Option<Uuid> {
        Uuid::from_slice(&self.event_id).ok()
    }

    /// Creation time reported by the server.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let ts = self.created.as_ref()?;
        DateTime::from_timestamp(ts.seconds, u32::try_from(ts.nanos).ok()?)
    }

    pub fn is_json(&self) -> bool {
        self.data_content_type == CONTENT_TYPE_JSON
    }
}

impl ResolvedEvent {
    /// The link event when the event was reached through one, otherwise
    /// the event itself.
    pub fn original_event(&self) -> Option<&RecordedEvent> {
        self.link.as_ref().or(self.event.as_ref())
    }
}

impl CreatePersistentSubscriptionRequest {
    pub fn new(
        subscription_name: impl Into<String>,
        subscription_type: SubscriptionType,
        selector: impl Into<String>,
    ) -> Self {
        Self {
            store_id: None,
            subscription_name: subscription_name.into(),
            r#type: subscription_type as i32,
            selector: selector.into(),
            start_from: None,
            pool_size: None,
        }
    }
}
