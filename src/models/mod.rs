pub mod table;
pub mod usage;

pub use table::ResultTable;
pub use usage::UsageRecord;
