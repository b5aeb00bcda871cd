//! Routes keys to their primary node using the cluster's partition map.
//!
//! Run with: `cargo run --example partition_awareness`
//!
//! Requires a multi-node Ignite cluster on localhost:10800..10802 with a
//! `PUBLIC` cache or an SQL table.

use ignite_client::{ClientConfig, IgniteClient, NodeAddress};
use ignite_core::binary::{cache_id, java_hashcode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::builder()
        .addresses((10800..=10802).map(|port| NodeAddress::new("127.0.0.1", port)))
        .partition_aware(true)
        .build()?;
    let client = IgniteClient::connect(config).await?;
    println!("Selection policy: {:?}", client.selection_policy().await);

    let caches = client.cache_names().await?;
    let ids: Vec<i32> = caches.iter().map(|name| cache_id(name)).collect();
    let topology = client.get_partitions(&ids).await?;
    println!("Topology version {}", topology.version());

    for (name, id) in caches.iter().zip(&ids) {
        println!("\n{}:", name);
        for key in ["alpha", "beta", "gamma"] {
            let node = client.node_for_key(*id, java_hashcode(key)).await?;
            println!(
                "  {:>6} -> {} ({:?})",
                key,
                node.address(),
                node.node_uuid().await
            );
        }
    }

    client.close().await;
    Ok(())
}
