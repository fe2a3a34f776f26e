//! Basic usage example for the etcd v2 client
//!
//! Run with: cargo run --example basic_usage
//! Point it at a cluster with ETCD_HOSTS=10.0.1.1,10.0.1.2,10.0.1.3

use etcd2_client::{Client, ClientConfig, Host};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    // Get the endpoint list from the environment
    let hosts: Vec<String> = std::env::var("ETCD_HOSTS")
        .unwrap_or_else(|_| "127.0.0.1".to_string())
        .split(',')
        .map(String::from)
        .collect();

    // Create client; the first host is tried first, the rest are failover
    let client = Client::with_config(ClientConfig {
        host: Host::List(hosts),
        ..Default::default()
    })?;

    // Introspect the server
    info!("Server version: {}", client.version().await?);
    info!("Cluster version: {}", client.version_cluster().await?);

    // Store a value
    info!("Writing key '/example/message'...");
    let response = client.write("/example/message", "Hello world", None).await?;
    info!("Written! action: {:?}", response.action());

    // Retrieve the value
    info!("Reading key '/example/message'...");
    let response = client.read("/example/message", false).await?;
    if let Some(node) = response.node() {
        info!("Retrieved: {:?}", node.get("value"));
    }

    // Store a value that expires after 30 seconds
    info!("Writing key '/example/session' with ttl...");
    let response = client.write("/example/session", "abc123", Some(30)).await?;
    info!("Written! node: {:?}", response.node());

    // Create and remove a directory
    info!("Creating directory '/example/dir'...");
    client.mkdir("/example/dir").await?;
    client.rmdir("/example/dir", false).await?;
    info!("Directory removed");

    // Member statistics
    let stats = client.self_stats().await?;
    info!(
        "Member {:?} is in state {:?}",
        stats.name(),
        stats.state()
    );

    // Clean up
    client.delete("/example/message").await?;
    client.delete("/example/session").await?;
    info!("Example completed successfully!");

    Ok(())
}
