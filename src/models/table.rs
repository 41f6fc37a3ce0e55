/// Columns shown per row by [`ResultTable::preview`].
const PREVIEW_COLUMNS: usize = 4;

/// Result of an untyped `SELECT *`, every cell rendered as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Short human-readable view of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPreview {
    /// Value of the focus column, `N/A` when the table has no such column
    pub focus: String,
    /// `column: value` pairs for the leading columns, focus column excluded
    pub fields: Vec<String>,
    /// Number of columns left out of `fields`
    pub hidden: usize,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Describe row `index` around `focus_column` plus the first few other columns
    pub fn preview(&self, index: usize, focus_column: &str) -> Option<RowPreview> {
        let row = self.rows.get(index)?;

        let focus = self
            .column_index(focus_column)
            .and_then(|i| row.get(i).cloned())
            .unwrap_or_else(|| "N/A".to_string());

        let fields = self
            .columns
            .iter()
            .zip(row.iter())
            .take(PREVIEW_COLUMNS)
            .filter(|(column, _)| !column.eq_ignore_ascii_case(focus_column))
            .map(|(column, value)| format!("{}: {}", column, value))
            .collect();

        Some(RowPreview {
            focus,
            fields,
            hidden: self.columns.len().saturating_sub(PREVIEW_COLUMNS + 1),
        })
    }
}
