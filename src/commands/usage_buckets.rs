use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use super::{connect, log_sample, InvalidPolicy};
use crate::config::{ConnectionConfig, ExportConfig};
use crate::error::InvalidRecordError;
use crate::export::{export_file, write_bucket_summary, write_usage_counts, ExportReport};
use crate::models::UsageRecord;
use crate::usage::{build_histogram, build_histogram_skipping, BucketHistogram};

const SAMPLE_ROWS: usize = 3;

/// Everything one bucketing run produced
#[derive(Debug)]
pub struct BucketExport {
    pub histogram: BucketHistogram,
    pub rejected: Vec<InvalidRecordError>,
    pub raw: ExportReport,
    pub summary: ExportReport,
}

pub async fn run(
    connection: &ConnectionConfig,
    export: &ExportConfig,
    policy: InvalidPolicy,
) -> Result<()> {
    let records = connect::fetch_usage(connection, export).await?;

    if records.is_empty() {
        info!("No results found");
    } else {
        info!("Found {} identifiers with usage > 1", records.len());
        info!("Sample of raw data:");
        log_sample(&records, export.usage_header(), SAMPLE_ROWS);
    }

    export_usage_buckets(
        &records,
        export.usage_header(),
        &export.output_path(&export.outputs.usage_raw),
        &export.output_path(&export.outputs.usage_buckets),
        policy,
    )?;
    info!("Export complete");
    Ok(())
}

/// Bucket the records, then write the raw counts (under `header`) and the
/// bucket summary.
///
/// Under [`InvalidPolicy::Abort`] an out-of-domain record fails the run
/// before either file is touched. The raw file always carries every input
/// record unchanged.
pub fn export_usage_buckets(
    records: &[UsageRecord],
    header: [&str; 2],
    raw_path: &Path,
    summary_path: &Path,
    policy: InvalidPolicy,
) -> Result<BucketExport> {
    info!("Grouping results into buckets");
    let (histogram, rejected) = match policy {
        InvalidPolicy::Abort => (
            build_histogram(records).context("Usage record outside the bucket domain")?,
            Vec::new(),
        ),
        InvalidPolicy::Skip => build_histogram_skipping(records),
    };

    for e in &rejected {
        warn!(
            identifier = e.identifier,
            count = e.count,
            "Skipping record outside the bucket domain"
        );
    }

    info!("Usage distribution:");
    for (category, count) in histogram.iter() {
        info!("  Identifiers with usage {}: {}", category, count);
    }

    info!("Exporting raw data to {}", raw_path.display());
    let raw = export_file(raw_path, |w| write_usage_counts(w, header, records))
        .context("Failed to export raw usage counts")?;

    info!("Exporting bucket summary to {}", summary_path.display());
    let summary = export_file(summary_path, |w| write_bucket_summary(w, &histogram))
        .context("Failed to export bucket summary")?;

    Ok(BucketExport {
        histogram,
        rejected,
        raw,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: [&str; 2] = ["CorelogicDataId", "Usage"];

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    fn records(pairs: &[(i64, i64)]) -> Vec<UsageRecord> {
        pairs.iter().copied().map(UsageRecord::from).collect()
    }

    #[test]
    fn test_writes_raw_and_summary() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("corelogic_usage_counts.csv");
        let summary = dir.path().join("corelogic_usage_buckets.csv");
        let input = records(&[(1, 2), (2, 3), (3, 3), (4, 7), (5, 10)]);

        let out = export_usage_buckets(&input, HEADER, &raw, &summary, InvalidPolicy::Abort).unwrap();

        assert_eq!(out.histogram.total(), 5);
        assert!(out.rejected.is_empty());
        assert_eq!(out.raw.rows, 5);
        assert_eq!(out.summary.rows, 6);
        assert_eq!(
            lines(&raw),
            vec!["CorelogicDataId,Usage", "1,2", "2,3", "3,3", "4,7", "5,10"]
        );
        assert_eq!(
            lines(&summary),
            vec!["UsageCategory,Count", "2,1", "3,2", "4,0", "5,0", "6,0", "7+,2"]
        );
    }

    #[test]
    fn test_empty_input_still_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.csv");
        let summary = dir.path().join("buckets.csv");

        export_usage_buckets(&[], HEADER, &raw, &summary, InvalidPolicy::Abort).unwrap();

        assert_eq!(lines(&raw), vec!["CorelogicDataId,Usage"]);
        assert_eq!(
            lines(&summary),
            vec!["UsageCategory,Count", "2,0", "3,0", "4,0", "5,0", "6,0", "7+,0"]
        );
    }

    #[test]
    fn test_abort_policy_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.csv");
        let summary = dir.path().join("buckets.csv");
        let input = records(&[(1, 2), (99, 1)]);

        let err = export_usage_buckets(&input, HEADER, &raw, &summary, InvalidPolicy::Abort).unwrap_err();

        let cause = err.downcast_ref::<InvalidRecordError>().unwrap();
        assert_eq!(cause.identifier, 99);
        assert!(!raw.exists());
        assert!(!summary.exists());
    }

    #[test]
    fn test_skip_policy_keeps_raw_rows() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.csv");
        let summary = dir.path().join("buckets.csv");
        let input = records(&[(1, 6), (99, 1), (2, 7)]);

        let out = export_usage_buckets(&input, HEADER, &raw, &summary, InvalidPolicy::Skip).unwrap();

        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.histogram.six, 1);
        assert_eq!(out.histogram.seven_plus, 1);
        assert_eq!(lines(&raw), vec!["CorelogicDataId,Usage", "1,6", "99,1", "2,7"]);
        assert_eq!(lines(&summary)[5..], ["6,1".to_string(), "7+,1".to_string()]);
    }

    #[test]
    fn test_raw_header_follows_column_names() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.csv");
        let summary = dir.path().join("buckets.csv");

        export_usage_buckets(
            &records(&[(5, 4)]),
            ["ParcelId", "Orders"],
            &raw,
            &summary,
            InvalidPolicy::Abort,
        )
        .unwrap();

        assert_eq!(lines(&raw), vec!["ParcelId,Orders", "5,4"]);
        assert_eq!(lines(&summary)[0], "UsageCategory,Count");
    }
}
