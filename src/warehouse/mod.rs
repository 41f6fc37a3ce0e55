pub mod client;
pub mod columns;
pub mod query;
pub mod values;

pub use client::WarehouseClient;
pub use columns::UsageColumns;
