//! Snapshot operations group. Not served by the server yet.

use async_trait::async_trait;
use tracing::{debug, error};

use super::store_label;
use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::error::Result;
use crate::proto::{
    DeleteSnapshotRequest, DeleteSnapshotResponse, ListSnapshotsRequest, ListSnapshotsResponse,
    ReadSnapshotRequest, ReadSnapshotResponse, RecordSnapshotRequest, RecordSnapshotResponse,
};
use crate::traits::Snapshots;

#[derive(Clone)]
pub struct SnapshotOperations {
    context: CallContext,
}

impl SnapshotOperations {
    pub(crate) fn new(context: CallContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Snapshots for SnapshotOperations {
    async fn record_snapshot(
        &self,
        stream_name: &str,
        data: Vec<u8>,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<RecordSnapshotResponse> {
        debug!(
            stream_name,
            store_id = store_label(store_id),
            size = data.len(),
            "Recording snapshot"
        );

        let request = RecordSnapshotRequest {
            stream_name: stream_name.to_string(),
            data,
            store_id: store_id.map(str::to_string),
            version: None,
        };
        self.context
            .unary("record_snapshot", cancel, request, |s, req| async move {
                s.snapshots.record_snapshot(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_name,
                    store_id = store_label(store_id),
                    error = %e,
                    "Failed to record snapshot"
                )
            })
    }

    async fn read_snapshot(
        &self,
        stream_name: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<ReadSnapshotResponse> {
        debug!(stream_name, store_id = store_label(store_id), "Reading snapshot");

        let request = ReadSnapshotRequest {
            stream_name: stream_name.to_string(),
            store_id: store_id.map(str::to_string),
        };
        self.context
            .unary("read_snapshot", cancel, request, |s, req| async move {
                s.snapshots.read_snapshot(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_name,
                    store_id = store_label(store_id),
                    error = %e,
                    "Failed to read snapshot"
                )
            })
    }

    async fn delete_snapshot(
        &self,
        stream_name: &str,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<DeleteSnapshotResponse> {
        debug!(stream_name, store_id = store_label(store_id), "Deleting snapshot");

        let request = DeleteSnapshotRequest {
            stream_name: stream_name.to_string(),
            store_id: store_id.map(str::to_string),
        };
        self.context
            .unary("delete_snapshot", cancel, request, |s, req| async move {
                s.snapshots.delete_snapshot(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    stream_name,
                    store_id = store_label(store_id),
                    error = %e,
                    "Failed to delete snapshot"
                )
            })
    }

    async fn list_snapshots(
        &self,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<ListSnapshotsResponse> {
        debug!(store_id = store_label(store_id), "Listing snapshots");

        let request = ListSnapshotsRequest {
            store_id: store_id.map(str::to_string),
        };
        self.context
            .unary("list_snapshots", cancel, request, |s, req| async move {
                s.snapshots.list_snapshots(req).await
            })
            .await
            .inspect_err(|e| {
                error!(store_id = store_label(store_id), error = %e, "Failed to list snapshots")
            })
    }
}
