//! Persistent subscription management group.
//!
//! Acknowledgement bookkeeping lives on the server; nothing is tracked here.

use async_trait::async_trait;
use tracing::{debug, error};

use super::store_label;
use crate::call::CallContext;
use crate::cancel::Cancellation;
use crate::error::{ClientError, Result};
use crate::proto::{
    AckEventRequest, AckEventResponse, CreatePersistentSubscriptionRequest,
    CreatePersistentSubscriptionResponse, ListSubscriptionsRequest, ListSubscriptionsResponse,
    RemovePersistentSubscriptionRequest, RemovePersistentSubscriptionResponse,
};
use crate::traits::Subscriptions;

#[derive(Clone)]
pub struct SubscriptionOperations {
    context: CallContext,
}

impl SubscriptionOperations {
    pub(crate) fn new(context: CallContext) -> Self {
        Self { context }
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidArgument(format!("{what} is required")));
    }
    Ok(())
}

#[async_trait]
impl Subscriptions for SubscriptionOperations {
    async fn create_persistent_subscription(
        &self,
        request: CreatePersistentSubscriptionRequest,
        cancel: &Cancellation,
    ) -> Result<CreatePersistentSubscriptionResponse> {
        self.context.ensure_open()?;
        require(&request.subscription_name, "subscription name")?;

        let name = request.subscription_name.clone();
        let store = request.store_id.clone();
        debug!(
            subscription = %name,
            store_id = store_label(store.as_deref()),
            subscription_type = request.r#type().as_str_name(),
            selector = %request.selector,
            "Creating persistent subscription"
        );

        self.context
            .unary(
                "create_persistent_subscription",
                cancel,
                request,
                |s, req| async move { s.subscriptions.create_persistent_subscription(req).await },
            )
            .await
            .inspect_err(|e| {
                error!(
                    subscription = %name,
                    store_id = store_label(store.as_deref()),
                    error = %e,
                    "Failed to create persistent subscription"
                )
            })
    }

    async fn remove_persistent_subscription(
        &self,
        request: RemovePersistentSubscriptionRequest,
        cancel: &Cancellation,
    ) -> Result<RemovePersistentSubscriptionResponse> {
        self.context.ensure_open()?;
        require(&request.subscription_name, "subscription name")?;

        let name = request.subscription_name.clone();
        let store = request.store_id.clone();
        debug!(
            subscription = %name,
            store_id = store_label(store.as_deref()),
            "Removing persistent subscription"
        );

        self.context
            .unary(
                "remove_persistent_subscription",
                cancel,
                request,
                |s, req| async move { s.subscriptions.remove_persistent_subscription(req).await },
            )
            .await
            .inspect_err(|e| {
                error!(
                    subscription = %name,
                    store_id = store_label(store.as_deref()),
                    error = %e,
                    "Failed to remove persistent subscription"
                )
            })
    }

    async fn list_subscriptions(
        &self,
        store_id: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<ListSubscriptionsResponse> {
        debug!(store_id = store_label(store_id), "Listing subscriptions");

        let request = ListSubscriptionsRequest {
            store_id: store_id.map(str::to_string),
        };
        self.context
            .unary("list_subscriptions", cancel, request, |s, req| async move {
                s.subscriptions.list_subscriptions(req).await
            })
            .await
            .inspect_err(|e| {
                error!(store_id = store_label(store_id), error = %e, "Failed to list subscriptions")
            })
    }

    async fn ack_event(
        &self,
        request: AckEventRequest,
        cancel: &Cancellation,
    ) -> Result<AckEventResponse> {
        self.context.ensure_open()?;
        require(&request.subscription_name, "subscription name")?;
        require(&request.event_id, "event id")?;

        let name = request.subscription_name.clone();
        let event_id = request.event_id.clone();
        debug!(
            subscription = %name,
            event_id = %event_id,
            event_number = ?request.event_number,
            "Acknowledging event"
        );

        self.context
            .unary("ack_event", cancel, request, |s, req| async move {
                s.subscriptions.ack_event(req).await
            })
            .await
            .inspect_err(|e| {
                error!(
                    subscription = %name,
                    event_id = %event_id,
                    error = %e,
                    "Failed to acknowledge event"
                )
            })
    }
}
