//! Interface tests for the client façade using Cucumber.
//!
//! No server is required; scenarios use addresses that refuse connections.
//!
//! ```bash
//! cargo test --test interfaces
//! ```

mod steps;

use cucumber::World;
use steps::client::ClientWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Client Lifecycle Interface Tests ===\n");
    ClientWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/interfaces/features/client_lifecycle.feature")
        .await;
}
