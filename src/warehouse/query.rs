//! SQL text for the fixed export queries.
//!
//! Table and column names come from a validated [`ExportConfig`]; values are
//! passed as `@P` parameters.

use crate::config::ExportConfig;

pub const SERVER_VERSION: &str = "SELECT @@version";

/// Most recent rows by date column. `@P1` is the row limit.
pub fn top_rows(config: &ExportConfig) -> String {
    format!(
        "SELECT TOP (@P1) * FROM {table} ORDER BY {date} DESC",
        table = config.table,
        date = config.date_column,
    )
}

/// Identifiers used more than once since a date. `@P1` is the program type,
/// `@P2` the earliest date.
pub fn usage_counts(config: &ExportConfig) -> String {
    format!(
        "SELECT {id}, COUNT(*) AS {usage} \
         FROM {table} \
         WHERE {program_type} = @P1 AND {date} >= @P2 \
         GROUP BY {id} \
         HAVING COUNT(*) > 1",
        id = config.identifier_column,
        usage = config.usage_column,
        table = config.table,
        program_type = config.program_type_column,
        date = config.date_column,
    )
}
