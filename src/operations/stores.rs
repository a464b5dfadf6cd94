//! Store management operations group. Not served by the server yet.

use async_trait::async_trait;
use tracing::{debug, error};

use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::error::{ClientError, Result};
use crate::proto::{
    GetStoreContextRequest, GetStoreContextResponse, ListStoresRequest, ListStoresResponse,
    SetStoreContextRequest, SetStoreContextResponse,
};
use crate::traits::StoreManagement;

#[derive(Clone)]
pub struct StoreManagementOperations {
    context: CallContext,
}

impl StoreManagementOperations {
    pub(crate) fn new(context: CallContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl StoreManagement for StoreManagementOperations {
    async fn list_stores(&self, cancel: &Cancellation) -> Result<ListStoresResponse> {
        debug!("Listing stores");

        self.context
            .unary("list_stores", cancel, ListStoresRequest {}, |s, req| async move {
                s.stores.list_stores(req).await
            })
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list stores"))
    }

    async fn set_store_context(
        &self,
        store_id: &str,
        cancel: &Cancellation,
    ) -> Result<SetStoreContextResponse> {
        self.context.ensure_open()?;
        if store_id.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "store id is required".to_string(),
            ));
        }
        debug!(store_id, "Selecting store");

        let request = SetStoreContextRequest {
            store_id: store_id.to_string(),
        };
        self.context
            .unary("set_store_context", cancel, request, |s, req| async move {
                s.stores.set_store_context(req).await
            })
            .await
            .inspect_err(|e| error!(store_id, error = %e, "Failed to select store"))
    }

    async fn get_store_context(&self, cancel: &Cancellation) -> Result<GetStoreContextResponse> {
        debug!("Getting store context");

        self.context
            .unary(
                "get_store_context",
                cancel,
                GetStoreContextRequest {},
                |s, req| async move { s.stores.get_store_context(req).await },
            )
            .await
            .inspect_err(|e| error!(error = %e, "Failed to get store context"))
    }
}
