//! gRPC transport over a lazily connected tonic channel.
//!
//! Supports:
//! - TCP: `http://` and `https://` (TLS with a configured CA)
//! - UDS: Unix domain sockets for a co-located server

use std::sync::Arc;

use async_trait::async_trait;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Uri};
use tonic::{Request, Status};
use tower::service_fn;
use tracing::info;

use super::{
    BatchStream, EventStoreService, Services, SnapshotService, StoreService, StreamService,
    SubscriptionService,
};
use crate::config::{ClientConfig, ConfigError, Target, TlsCredentials};
use crate::proto::{
    AckEventRequest, AckEventResponse, CreatePersistentSubscriptionRequest,
    CreatePersistentSubscriptionResponse, GetStreamVersionRequest, GetStreamVersionResponse,
    GetStreamsRequest, GetStreamsResponse, ListSubscriptionsRequest, ListSubscriptionsResponse,
    RemovePersistentSubscriptionRequest, RemovePersistentSubscriptionResponse,
    StreamBackwardRequest, StreamEventBatch, StreamForwardRequest, StreamOperationsClient,
    SubscriptionManagementClient,
};

/// Placeholder authority for UDS connections; the connector ignores it.
const UDS_AUTHORITY: &str = "http://[::]:2113";

/// Build the channel and the typed sub-clients for `config`.
pub(super) fn open(config: &ClientConfig) -> Result<Services, ConfigError> {
    config.validate()?;
    let channel = build_channel(config)?;
    Ok(Services::from_shared(Arc::new(GrpcServices::new(
        channel, config,
    ))))
}

fn build_channel(config: &ClientConfig) -> Result<Channel, ConfigError> {
    match config.target()? {
        Target::Tcp(uri) => {
            let endpoint =
                Endpoint::from_shared(uri.clone()).map_err(|e| ConfigError::InvalidAddress {
                    address: config.server_address.clone(),
                    reason: e.to_string(),
                })?;
            let mut endpoint = tune(endpoint, config)?;

            if let Some(tls) = config.tls() {
                endpoint = endpoint.tls_config(tls_config(tls)?).map_err(|e| {
                    ConfigError::InvalidCredentials(format!("TLS configuration rejected: {e}"))
                })?;
            }

            info!(
                address = %uri,
                transport = "tcp",
                tls = config.tls().is_some(),
                "Configured ExESDB channel"
            );
            Ok(endpoint.connect_lazy())
        }
        Target::Unix(socket_path) => {
            let endpoint = tune(Endpoint::from_static(UDS_AUTHORITY), config)?;

            info!(
                path = %socket_path.display(),
                transport = "uds",
                "Configured ExESDB channel"
            );

            // TokioIo wraps UnixStream to implement hyper's io traits
            Ok(endpoint.connect_with_connector_lazy(service_fn(move |_: Uri| {
                let path = socket_path.clone();
                async move {
                    let stream = UnixStream::connect(path).await?;
                    Ok::<_, std::io::Error>(TokioIo::new(stream))
                }
            })))
        }
    }
}

fn tune(endpoint: Endpoint, config: &ClientConfig) -> Result<Endpoint, ConfigError> {
    let options = &config.channel;
    let mut endpoint = endpoint
        .connect_timeout(config.connect_timeout)
        .tcp_nodelay(options.tcp_nodelay)
        .tcp_keepalive(options.tcp_keepalive)
        .keep_alive_while_idle(options.keep_alive_while_idle);

    if let Some(interval) = options.keep_alive_interval {
        endpoint = endpoint.http2_keep_alive_interval(interval);
    }
    if let Some(timeout) = options.keep_alive_timeout {
        endpoint = endpoint.keep_alive_timeout(timeout);
    }
    if let Some(limit) = options.concurrency_limit {
        endpoint = endpoint.concurrency_limit(limit);
    }
    if let Some(agent) = &options.user_agent {
        endpoint = endpoint
            .user_agent(agent.as_str())
            .map_err(|e| ConfigError::InvalidChannelOption {
                option: "user_agent",
                reason: e.to_string(),
            })?;
    }

    Ok(endpoint)
}

fn tls_config(tls: &TlsCredentials) -> Result<ClientTlsConfig, ConfigError> {
    let pem = std::fs::read(&tls.ca_certificate).map_err(|source| ConfigError::Io {
        context: format!(
            "failed to read CA certificate {}",
            tls.ca_certificate.display()
        ),
        source,
    })?;

    let mut config = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
    if let Some(domain) = &tls.domain {
        config = config.domain_name(domain.clone());
    }
    Ok(config)
}

/// Typed sub-clients sharing one channel.
struct GrpcServices {
    streams: StreamOperationsClient<Channel>,
    subscriptions: SubscriptionManagementClient<Channel>,
}

impl GrpcServices {
    fn new(channel: Channel, config: &ClientConfig) -> Self {
        let mut streams = StreamOperationsClient::new(channel.clone());
        let mut subscriptions = SubscriptionManagementClient::new(channel);

        if let Some(limit) = config.channel.max_decoding_message_size {
            streams = streams.max_decoding_message_size(limit);
            subscriptions = subscriptions.max_decoding_message_size(limit);
        }
        if let Some(limit) = config.channel.max_encoding_message_size {
            streams = streams.max_encoding_message_size(limit);
            subscriptions = subscriptions.max_encoding_message_size(limit);
        }

        Self {
            streams,
            subscriptions,
        }
    }
}

#[async_trait]
impl StreamService for GrpcServices {
    async fn get_streams(
        &self,
        request: Request<GetStreamsRequest>,
    ) -> Result<GetStreamsResponse, Status> {
        let mut client = self.streams.clone();
        Ok(client.get_streams(request).await?.into_inner())
    }

    async fn get_stream_version(
        &self,
        request: Request<GetStreamVersionRequest>,
    ) -> Result<GetStreamVersionResponse, Status> {
        let mut client = self.streams.clone();
        Ok(client.get_stream_version(request).await?.into_inner())
    }

    async fn stream_forward(
        &self,
        request: Request<StreamForwardRequest>,
    ) -> Result<BatchStream<StreamEventBatch>, Status> {
        let mut client = self.streams.clone();
        let batches = client.stream_forward(request).await?.into_inner();
        Ok(Box::pin(batches))
    }

    async fn stream_backward(
        &self,
        request: Request<StreamBackwardRequest>,
    ) -> Result<BatchStream<StreamEventBatch>, Status> {
        let mut client = self.streams.clone();
        let batches = client.stream_backward(request).await?.into_inner();
        Ok(Box::pin(batches))
    }
}

impl EventStoreService for GrpcServices {}

impl StoreService for GrpcServices {}

impl SnapshotService for GrpcServices {}

#[async_trait]
impl SubscriptionService for GrpcServices {
    async fn create_persistent_subscription(
        &self,
        request: Request<CreatePersistentSubscriptionRequest>,
    ) -> Result<CreatePersistentSubscriptionResponse, Status> {
        let mut client = self.subscriptions.clone();
        Ok(client
            .create_persistent_subscription(request)
            .await?
            .into_inner())
    }

    async fn remove_persistent_subscription(
        &self,
        request: Request<RemovePersistentSubscriptionRequest>,
    ) -> Result<RemovePersistentSubscriptionResponse, Status> {
        let mut client = self.subscriptions.clone();
        Ok(client
            .remove_persistent_subscription(request)
            .await?
            .into_inner())
    }

    async fn list_subscriptions(
        &self,
        request: Request<ListSubscriptionsRequest>,
    ) -> Result<ListSubscriptionsResponse, Status> {
        let mut client = self.subscriptions.clone();
        Ok(client.list_subscriptions(request).await?.into_inner())
    }

    async fn ack_event(&self, request: Request<AckEventRequest>) -> Result<AckEventResponse, Status> {
        let mut client = self.subscriptions.clone();
        Ok(client.ack_event(request).await?.into_inner())
    }
}
