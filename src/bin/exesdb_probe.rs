//! exesdb-probe: connectivity and inventory check for an ExESDB server
//!
//! Probes the server, prints the first page of streams and the persistent
//! subscriptions, and optionally reads one stream forward to its end.
//!
//! ## Configuration
//! - `exesdb.yaml` / EXESDB_CONFIG / `EXESDB__*`: client settings
//! - EXESDB_PROBE_STREAM: stream to read forward (optional)
//! - EXESDB_PROBE_STORE: store id for the listing and the read (optional)
//! - EXESDB_LOG: log filter (default: info)
//!
//! Exits with a non-zero status when the server cannot be reached.

use std::process::ExitCode;

use tracing::{error, info};

use exesdb_client::proto::StreamForwardRequest;
use exesdb_client::utils::bootstrap::{cancel_on_ctrl_c, init_tracing};
use exesdb_client::{ClientSettings, ExesdbClient, ListStreamsOptions, Streams, Subscriptions};

const PAGE_SIZE: i32 = 50;
const READ_BATCH: i32 = 100;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "exesdb-probe failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let settings = ClientSettings::load(None)?;
    let client = ExesdbClient::from_settings(settings)?;
    let cancel = cancel_on_ctrl_c();
    let store_id = std::env::var("EXESDB_PROBE_STORE").ok();

    info!(server_address = %client.server_address(), "Probing ExESDB");
    if !client.probe_connectivity(&cancel).await {
        error!(server_address = %client.server_address(), "Server unreachable");
        return Ok(false);
    }

    let mut options = ListStreamsOptions::new().max_count(PAGE_SIZE);
    if let Some(store) = &store_id {
        options = options.store_id(store.clone());
    }
    let page = client.streams().list_streams(options, &cancel).await?;
    println!("streams ({}):", page.streams.len());
    for stream in &page.streams {
        println!(
            "  {} [{}] version {}",
            stream.stream_id, stream.store_id, stream.current_version
        );
    }
    if page.has_more() {
        println!("  ... more streams available");
    }

    let subscriptions = client
        .subscriptions()
        .list_subscriptions(store_id.as_deref(), &cancel)
        .await?;
    println!("subscriptions ({}):", subscriptions.subscriptions.len());
    for subscription in &subscriptions.subscriptions {
        println!(
            "  {} {} {}",
            subscription.subscription_name,
            subscription.r#type().as_str_name(),
            subscription.selector
        );
    }

    if let Ok(stream_id) = std::env::var("EXESDB_PROBE_STREAM") {
        let request = StreamForwardRequest {
            store_id,
            stream_id: stream_id.clone(),
            start_version: 0,
            count: READ_BATCH,
        };
        let mut batches = client.streams().stream_forward(request, &cancel);
        let mut total = 0usize;
        while let Some(batch) = batches.next().await? {
            for event in &batch.events {
                println!(
                    "  {}#{} {} ({} bytes)",
                    event.event_stream_id,
                    event.event_number,
                    event.event_type,
                    event.data.len()
                );
            }
            total += batch.events.len();
        }
        info!(stream_id = %stream_id, events = total, state = ?batches.state(), "Read finished");
    }

    client.shutdown();
    Ok(true)
}
