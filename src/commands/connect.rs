use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::elapsed;
use crate::config::{ConnectionConfig, ExportConfig};
use crate::models::UsageRecord;
use crate::warehouse::WarehouseClient;

pub const SMOKE_TEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(25);

/// Connect and log how long it took
pub async fn open(config: &ConnectionConfig, timeout: Duration) -> Result<WarehouseClient> {
    info!(server = %config.address(), database = %config.database, "Attempting to connect");
    let start = Instant::now();

    let client = WarehouseClient::connect(config, timeout)
        .await
        .context(format!("Failed to connect to {}", config.address()))?;

    info!(elapsed = %elapsed(start), "Connection successful");
    Ok(client)
}

/// Close the connection. Failures are logged, not returned.
pub async fn close(client: WarehouseClient) {
    info!("Closing database connection");
    match client.close().await {
        Ok(()) => info!("Connection closed"),
        Err(e) => warn!("Failed to close connection cleanly: {}", e),
    }
}

/// Smoke test: connect, ask for the server version, disconnect
pub async fn run(config: &ConnectionConfig) -> Result<String> {
    let mut client = open(config, SMOKE_TEST_TIMEOUT).await?;

    let version = client
        .server_version()
        .await
        .context("Failed to query server version");
    close(client).await;

    let version = version?;
    info!("SQL Server version: {}", version);
    Ok(version)
}

/// Run the usage aggregate and close the connection whatever the outcome
pub async fn fetch_usage(
    connection: &ConnectionConfig,
    export: &ExportConfig,
) -> Result<Vec<UsageRecord>> {
    let mut client = open(connection, EXPORT_TIMEOUT).await?;

    info!(
        table = %export.table,
        program_type_id = export.program_type_id,
        since = %export.drop_date_from,
        "Executing usage count query"
    );
    let start = Instant::now();
    let fetched = client
        .usage_counts(export)
        .await
        .context("Database operation failed");
    close(client).await;

    let records = fetched?;
    info!(rows = records.len(), elapsed = %elapsed(start), "Results fetched");
    Ok(records)
}
