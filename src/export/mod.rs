pub mod csv_export;

pub use csv_export::{
    export_file, write_bucket_summary, write_table, write_usage_counts, write_usage_header,
    write_usage_row, ExportReport,
};
