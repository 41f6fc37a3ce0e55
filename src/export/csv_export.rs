use csv::Writer;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::models::{ResultTable, UsageRecord};
use crate::usage::BucketHistogram;

pub const BUCKET_HEADER: [&str; 2] = ["UsageCategory", "Count"];

/// Outcome of writing one CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Data rows, header excluded
    pub rows: usize,
    pub bytes: u64,
}

impl ExportReport {
    pub fn size_kb(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }
}

/// Header from the table's columns, then every row as-is
pub fn write_table<W: Write>(wtr: &mut Writer<W>, table: &ResultTable) -> csv::Result<usize> {
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    Ok(table.rows.len())
}

/// `header` is the identifier and usage column names, in that order
pub fn write_usage_header<W: Write>(wtr: &mut Writer<W>, header: [&str; 2]) -> csv::Result<()> {
    wtr.write_record(header)
}

pub fn write_usage_row<W: Write>(wtr: &mut Writer<W>, record: &UsageRecord) -> csv::Result<()> {
    wtr.write_record([record.identifier.to_string(), record.count.to_string()])
}

/// Raw usage counts in input order
pub fn write_usage_counts<W: Write>(
    wtr: &mut Writer<W>,
    header: [&str; 2],
    records: &[UsageRecord],
) -> csv::Result<usize> {
    write_usage_header(wtr, header)?;
    for record in records {
        write_usage_row(wtr, record)?;
    }
    Ok(records.len())
}

/// Six rows, one per category, in the order 2, 3, 4, 5, 6, 7+
pub fn write_bucket_summary<W: Write>(
    wtr: &mut Writer<W>,
    histogram: &BucketHistogram,
) -> csv::Result<usize> {
    wtr.write_record(BUCKET_HEADER)?;
    let mut rows = 0;
    for (category, count) in histogram.iter() {
        wtr.write_record([category.as_str().to_string(), count.to_string()])?;
        rows += 1;
    }
    Ok(rows)
}

/// Create (or truncate) `path`, run `write` against it and report the result
pub fn export_file<P, F>(path: P, write: F) -> Result<ExportReport, ExportError>
where
    P: AsRef<Path>,
    F: FnOnce(&mut Writer<File>) -> csv::Result<usize>,
{
    let path = path.as_ref();
    let display = path.display().to_string();
    let io_err = |source: std::io::Error| ExportError::Io {
        path: display.clone(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = File::create(path).map_err(io_err)?;
    let mut wtr = Writer::from_writer(file);

    let rows = write(&mut wtr).map_err(|source| ExportError::Csv {
        path: display.clone(),
        source,
    })?;
    wtr.flush().map_err(io_err)?;
    drop(wtr);

    let bytes = fs::metadata(path).map_err(io_err)?.len();

    Ok(ExportReport {
        path: path.to_path_buf(),
        rows,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::build_histogram;
    use tempfile::TempDir;

    const HEADER: [&str; 2] = ["CorelogicDataId", "Usage"];

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Writer<Vec<u8>>) -> csv::Result<usize>,
    {
        let mut wtr = Writer::from_writer(vec![]);
        write(&mut wtr).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    fn sample_records() -> Vec<UsageRecord> {
        [(1, 2), (2, 3), (3, 3), (4, 7), (5, 10)]
            .into_iter()
            .map(UsageRecord::from)
            .collect()
    }

    #[test]
    fn test_usage_counts_keep_order() {
        let records = sample_records();
        let out = render(|w| write_usage_counts(w, HEADER, &records));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["CorelogicDataId,Usage", "1,2", "2,3", "3,3", "4,7", "5,10"]);
    }

    #[test]
    fn test_usage_counts_empty() {
        let out = render(|w| write_usage_counts(w, HEADER, &[]));
        assert_eq!(out.lines().collect::<Vec<_>>(), vec!["CorelogicDataId,Usage"]);
    }

    #[test]
    fn test_bucket_summary() {
        let histogram = build_histogram(&sample_records()).unwrap();
        let out = render(|w| write_bucket_summary(w, &histogram));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec!["UsageCategory,Count", "2,1", "3,2", "4,0", "5,0", "6,0", "7+,2"]
        );
    }

    #[test]
    fn test_bucket_summary_empty_has_six_rows() {
        let out = render(|w| write_bucket_summary(w, &BucketHistogram::default()));
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let counts: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[1].to_string())
            .collect();
        assert_eq!(counts, vec!["0"; 6]);
    }

    #[test]
    fn test_table_quotes_embedded_commas() {
        let mut table = ResultTable::new(vec!["Id".to_string(), "Address".to_string()]);
        table.rows.push(vec!["7".to_string(), "12 Main St, Unit 4".to_string()]);
        let out = render(|w| write_table(w, &table));

        assert!(out.contains("\"12 Main St, Unit 4\""));
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "12 Main St, Unit 4");
    }

    #[test]
    fn test_export_file_reports_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("counts.csv");
        let records = sample_records();

        let report = export_file(&path, |w| write_usage_counts(w, HEADER, &records)).unwrap();

        assert_eq!(report.rows, 5);
        assert_eq!(report.path, path);
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(report.bytes, written.len() as u64);
        assert!(written.starts_with("CorelogicDataId,Usage\n1,2\n"));
    }

    #[test]
    fn test_usage_header_uses_given_names() {
        let records = sample_records();
        let out = render(|w| write_usage_counts(w, ["ParcelId", "Orders"], &records[..1]));
        assert_eq!(out, "ParcelId,Orders\n1,2\n");
    }
}
