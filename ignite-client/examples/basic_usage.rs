//! Registers a type, runs a paged SQL query and lists caches.
//!
//! Run with: `cargo run --example basic_usage`
//!
//! Requires an Ignite node with the thin client connector on localhost:10800.

use std::time::Duration;

use ignite_client::{
    BinaryField, BinaryTypeDescriptor, ClientConfig, IgniteClient, SchemaRef, SqlFieldsQuery,
};
use ignite_core::protocol::{TC_INT, TC_STRING};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Ignite Client Basic Usage Example ===\n");

    let config = ClientConfig::builder()
        .add_address("127.0.0.1:10800".parse()?)
        .connection_timeout(Duration::from_secs(10))
        .build()?;

    println!("Connecting to Ignite cluster...");
    let client = IgniteClient::connect(config).await?;
    if let Some(version) = client.protocol_version().await {
        println!("Connected using protocol {}\n", version);
    }

    // ========== Binary types ==========
    println!("--- Binary Types ---\n");

    let person = BinaryTypeDescriptor::new(
        "org.example.Person",
        vec![
            BinaryField::new("id", TC_INT as i32),
            BinaryField::new("name", TC_STRING as i32),
        ],
    );
    let registered = client.register_type(person, Some("id")).await?;
    println!(
        "Registered {} (type id {}, schema id {})",
        registered.type_name(),
        registered.type_id(),
        registered.schema_id()
    );

    let fields: &[&str] = &["id", "name"];
    if let Some(found) = client
        .resolve_type(registered.type_id(), Some(SchemaRef::Fields(fields)))
        .await?
    {
        println!("Resolved {} schema(s) for the type\n", found.len());
    }

    // ========== SQL ==========
    println!("--- SQL Fields Query ---\n");

    client
        .sql(SqlFieldsQuery::new(
            "CREATE TABLE IF NOT EXISTS City (id INT PRIMARY KEY, name VARCHAR)",
        ))
        .await?
        .close()
        .await?;
    for (id, name) in [(1, "Oslo"), (2, "Lima"), (3, "Pune"), (4, "Graz"), (5, "Cork")] {
        client
            .sql(
                SqlFieldsQuery::new("MERGE INTO City (id, name) VALUES (?, ?)")
                    .arg(id)
                    .arg(name),
            )
            .await?
            .close()
            .await?;
    }

    let mut cursor = client
        .sql(
            SqlFieldsQuery::new("SELECT id, name FROM City ORDER BY id")
                .page_size(2)
                .include_field_names(true),
        )
        .await?;
    println!("Columns: {:?}", cursor.field_names());
    let mut page = 1;
    loop {
        let rows = cursor.advance().await?;
        if rows.is_empty() {
            break;
        }
        println!("Page {}:", page);
        for row in rows {
            println!("  {:?}", row);
        }
        page += 1;
    }
    cursor.close().await?;

    // ========== Caches ==========
    println!("\n--- Caches ---\n");
    for name in client.cache_names().await? {
        println!("  {}", name);
    }

    client.close().await;
    println!("\nDone.");
    Ok(())
}
