use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::{connect, elapsed, log_sample};
use crate::config::{ConnectionConfig, ExportConfig};
use crate::export::{export_file, write_usage_header, write_usage_row, ExportReport};
use crate::models::UsageRecord;

const SAMPLE_ROWS: usize = 5;
/// Row interval between progress events on large exports
const PROGRESS_INTERVAL: usize = 100;

pub async fn run(connection: &ConnectionConfig, export: &ExportConfig) -> Result<()> {
    let records = connect::fetch_usage(connection, export).await?;
    export_usage_counts(
        &records,
        export.usage_header(),
        &export.output_path(&export.outputs.usage_counts),
    )?;
    Ok(())
}

/// Write the usage aggregate as-is. Nothing is written for an empty result.
pub fn export_usage_counts(
    records: &[UsageRecord],
    header: [&str; 2],
    path: &Path,
) -> Result<Option<ExportReport>> {
    if records.is_empty() {
        info!("No results found for the query");
        return Ok(None);
    }

    let total = records.len();
    info!("Found {} results", total);
    info!("Displaying sample results (first {}):", SAMPLE_ROWS.min(total));
    log_sample(records, header, SAMPLE_ROWS);

    info!("Exporting {} results to CSV", total);
    let start = Instant::now();
    let report = export_file(path, |w| {
        write_usage_header(w, header)?;
        for (i, record) in records.iter().enumerate() {
            write_usage_row(w, record)?;
            let written = i + 1;
            if total > PROGRESS_INTERVAL && written % PROGRESS_INTERVAL == 0 {
                info!(
                    "Exported {}/{} rows ({:.1}%)",
                    written,
                    total,
                    written as f64 / total as f64 * 100.0
                );
            }
        }
        Ok(total)
    })
    .context("Failed to export usage counts")?;

    info!(
        path = %report.path.display(),
        elapsed = %elapsed(start),
        "Results exported"
    );
    info!("CSV file size: {:.2} KB", report.size_kb());
    Ok(Some(report))
}
