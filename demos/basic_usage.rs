//! Basic usage example for the gduck client.
//!
//! Run against a local server with:
//!
//! ```bash
//! RUST_LOG=gduck_client=debug cargo run --example basic_usage
//! ```

use gduck_client::{params, Connection, ConnectionMode, Transaction};
use std::error::Error;
use tracing_subscriber::EnvFilter;

const ADDR: &str = "localhost:50051";
const DATABASE_FILE: &str = "example.duckdb";

/// Opens a read-write transaction on the example database.
async fn example_transaction() -> Result<Transaction, Box<dyn Error>> {
    let connection = Connection::new(ADDR)?;
    let txn = connection
        .begin(DATABASE_FILE, ConnectionMode::ReadWrite)
        .await?;
    Ok(txn)
}

/// Runs a single-value query.
async fn example_simple_select(txn: &mut Transaction) -> Result<(), Box<dyn Error>> {
    let value = txn.query_value("SELECT '1'", params![]).await?;
    println!("SELECT '1' -> {}", value);
    Ok(())
}

/// Creates a table, fills it, copies part of it and reads it back.
async fn example_table(txn: &mut Transaction) -> Result<usize, Box<dyn Error>> {
    txn.execute(
        "CREATE OR REPLACE TABLE videos (id INTEGER, title VARCHAR, comment_count INTEGER)",
        params![],
    )
    .await?;

    for (id, title, comments) in [(1, "intro", 0), (2, "setup", 3), (3, "deep dive", 7)] {
        txn.execute(
            "INSERT INTO videos VALUES (?, ?, ?)",
            params![id, title, comments],
        )
        .await?;
    }

    txn.ctas(
        "popular_videos",
        "SELECT * FROM videos WHERE comment_count > ?",
        params![2],
    )
    .await?;

    let rows = txn
        .query_rows("SELECT * FROM popular_videos ORDER BY id", params![])
        .await?;
    for row in &rows {
        println!("{:?}", row.values());
    }

    let batch = rows.to_record_batch()?;
    println!("Arrow batch: {} row(s), schema {:?}", batch.num_rows(), batch.schema());

    let location = txn
        .local_parquet("popular_videos.parquet", "SELECT * FROM popular_videos", params![])
        .await?;
    println!("Exported to {}", location);

    Ok(rows.len())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut txn = example_transaction().await?;
    println!("Opened transaction on {}", txn.database_file());

    example_simple_select(&mut txn).await?;

    let rows = example_table(&mut txn).await?;
    println!("Popular videos: {} row(s)", rows);

    txn.close().await?;
    println!("Done");

    Ok(())
}
