//! Listing server with seeded in-memory data
//!
//! This example demonstrates:
//! - Loading `ListingConfig` from an optional YAML file
//! - Recording requests, responses and SQL timings into a store
//! - Serving the listing page with graceful shutdown
//!
//! Run with:
//! ```sh
//! RUST_LOG=reqlist=debug,tower_http=debug cargo run --example listing_server
//! ```
//! or, against PostgreSQL:
//! ```sh
//! cargo run --example listing_server --features postgres -- listing.yaml
//! ```

use chrono::Duration;
use reqlist::prelude::*;
use tracing_subscriber::EnvFilter;

/// (method, path, view name, status, time taken, SQL query timings)
type Sample = (&'static str, &'static str, &'static str, i32, f64, &'static [f64]);

const SAMPLES: &[Sample] = &[
    ("GET", "/orders", "orders-list", 200, 84.2, &[12.0, 3.5, 4.1]),
    ("GET", "/orders/42", "orders-detail", 200, 31.0, &[2.2]),
    ("POST", "/orders", "orders-create", 201, 140.7, &[5.0, 48.3, 7.9, 1.1]),
    ("GET", "/users", "users-list", 200, 22.5, &[6.4]),
    ("DELETE", "/users/7", "users-delete", 403, 4.0, &[]),
    ("GET", "/reports/monthly", "reports", 500, 2310.0, &[850.0, 1203.5]),
    ("GET", "/health", "", 200, 0.8, &[]),
];

async fn seed(store: &dyn RequestStore) -> Result<()> {
    let now = Utc::now();
    for (i, (method, path, view, status, took, queries)) in SAMPLES.iter().enumerate() {
        let request = store
            .record_request(
                RequestRecord::new(*method, *path)
                    .with_view_name(*view)
                    .with_start_time(now - Duration::minutes((SAMPLES.len() - i) as i64))
                    .with_time_taken(*took),
            )
            .await?;
        store
            .record_response(ResponseRecord::new(request.id, *status))
            .await?;
        for (n, ms) in queries.iter().enumerate() {
            store
                .record_sql_query(SqlQueryRecord::new(
                    request.id,
                    format!("SELECT * FROM t{} WHERE id = $1", n),
                    Some(*ms),
                ))
                .await?;
        }
    }
    tracing::info!(requests = SAMPLES.len(), "Seeded sample requests");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn postgres_store(url: &str) -> Result<std::sync::Arc<dyn RequestStore>> {
    use reqlist::storage::postgres::ensure_schema;

    let pool = sqlx::PgPool::connect(url).await?;
    ensure_schema(&pool).await?;
    Ok(std::sync::Arc::new(PostgresRequestStore::new(pool)))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_store(_url: &str) -> Result<std::sync::Arc<dyn RequestStore>> {
    anyhow::bail!("database_url is set but the `postgres` feature is disabled")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ListingConfig::from_yaml_file(&path)?,
        None => ListingConfig::default(),
    };

    let store: std::sync::Arc<dyn RequestStore> = match &config.database_url {
        Some(url) => postgres_store(url).await?,
        None => std::sync::Arc::new(InMemoryRequestStore::new()),
    };
    seed(store.as_ref()).await?;

    tracing::info!("Open http://{}/ in a browser", config.bind_address);

    ServerBuilder::new()
        .with_shared_request_store(store)
        .with_config(config)
        .serve()
        .await
}
