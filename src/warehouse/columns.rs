use tiberius::ColumnData;

use super::values::cell_to_i64;
use crate::error::WarehouseError;
use crate::models::UsageRecord;

/// Positions of the identifier and usage columns in a usage query result.
///
/// Resolved once from result metadata so rows can be mapped by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageColumns {
    pub identifier: usize,
    pub usage: usize,
    identifier_name: String,
    usage_name: String,
}

impl UsageColumns {
    /// Find both columns by case-insensitive name
    pub fn resolve<S: AsRef<str>>(
        columns: &[S],
        identifier_name: &str,
        usage_name: &str,
    ) -> Result<Self, WarehouseError> {
        let find = |wanted: &str| {
            columns
                .iter()
                .position(|c| c.as_ref().eq_ignore_ascii_case(wanted))
        };

        match (find(identifier_name), find(usage_name)) {
            (Some(identifier), Some(usage)) => Ok(Self {
                identifier,
                usage,
                identifier_name: identifier_name.to_string(),
                usage_name: usage_name.to_string(),
            }),
            _ => Err(WarehouseError::MissingColumns {
                available: columns.iter().map(|c| c.as_ref().to_lowercase()).collect(),
            }),
        }
    }

    /// Build a typed record from one row's cells
    pub fn record(&self, cells: &[ColumnData<'static>]) -> Result<UsageRecord, WarehouseError> {
        let identifier = self.cell(cells, self.identifier, &self.identifier_name)?;
        let count = self.cell(cells, self.usage, &self.usage_name)?;
        Ok(UsageRecord { identifier, count })
    }

    fn cell(
        &self,
        cells: &[ColumnData<'static>],
        index: usize,
        name: &str,
    ) -> Result<i64, WarehouseError> {
        let data = cells.get(index).ok_or_else(|| WarehouseError::UnexpectedValue {
            column: name.to_string(),
            found: format!("row with {} cells", cells.len()),
        })?;
        cell_to_i64(name, data)
    }
}
