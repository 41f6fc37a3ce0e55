use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::connect::{self, EXPORT_TIMEOUT};
use super::elapsed;
use crate::config::{ConnectionConfig, ExportConfig};
use crate::export::{export_file, write_table, ExportReport};
use crate::models::ResultTable;

const PREVIEW_ROWS: usize = 3;

pub async fn run(connection: &ConnectionConfig, export: &ExportConfig, limit: u32) -> Result<()> {
    let mut client = connect::open(connection, EXPORT_TIMEOUT).await?;

    info!(table = %export.table, limit, order_by = %export.date_column, "Executing top rows query");
    let start = Instant::now();
    let fetched = client
        .top_rows(export, limit)
        .await
        .context("Database operation failed");
    connect::close(client).await;

    let table = fetched?;
    info!(rows = table.len(), elapsed = %elapsed(start), "Results fetched");

    export_top_rows(
        &table,
        &export.date_column,
        &export.output_path(&export.outputs.top_rows),
    )?;
    Ok(())
}

/// Log a preview and write the table. Nothing is written for an empty result.
pub fn export_top_rows(
    table: &ResultTable,
    date_column: &str,
    path: &Path,
) -> Result<Option<ExportReport>> {
    info!("Retrieved {} columns", table.columns.len());

    if table.is_empty() {
        info!("No results found for the query");
        return Ok(None);
    }

    info!("Found {} results", table.len());
    info!("Columns: {}", table.columns.join(", "));
    info!("Displaying first {} rows:", PREVIEW_ROWS.min(table.len()));
    for i in 0..PREVIEW_ROWS.min(table.len()) {
        if let Some(preview) = table.preview(i, date_column) {
            info!("  Row {}: {}: {}", i + 1, date_column, preview.focus);
            info!("    {}", preview.fields.join(", "));
            if preview.hidden > 0 {
                info!("    ... and {} more columns", preview.hidden);
            }
        }
    }

    info!("Exporting {} results to CSV", table.len());
    let start = Instant::now();
    let report = export_file(path, |w| write_table(w, table))
        .context("Failed to export top rows")?;

    info!(
        path = %report.path.display(),
        elapsed = %elapsed(start),
        "Results exported"
    );
    info!("CSV file size: {:.2} KB", report.size_kb());
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_result_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.csv");
        let table = ResultTable::new(strings(&["OrderId", "DropDate"]));

        let report = export_top_rows(&table, "DropDate", &path).unwrap();

        assert!(report.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_rows_written_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.csv");
        let mut table = ResultTable::new(strings(&["OrderId", "DropDate", "CorelogicDataId"]));
        table.rows.push(strings(&["2", "2025-03-02 00:00:00", "77"]));
        table.rows.push(strings(&["1", "2025-03-01 00:00:00", ""]));

        let report = export_top_rows(&table, "DropDate", &path).unwrap().unwrap();

        assert_eq!(report.rows, 2);
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written.lines().collect::<Vec<_>>(),
            vec![
                "OrderId,DropDate,CorelogicDataId",
                "2,2025-03-02 00:00:00,77",
                "1,2025-03-01 00:00:00,",
            ]
        );
    }
}
