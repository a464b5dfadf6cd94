//! Bootstrap utilities for binaries built on the client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cancel::Cancellation;
use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the EXESDB_LOG environment variable.
///
/// Defaults to "info" level if EXESDB_LOG is not set. Does nothing if a
/// global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Cancellation that fires on Ctrl-C.
pub fn cancel_on_ctrl_c() -> Cancellation {
    let cancel = Cancellation::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling in-flight calls");
            trigger.cancel();
        }
    });
    cancel
}
