pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod usage;
pub mod warehouse;

pub use config::{ConnectionConfig, ExportConfig};
pub use error::{ConfigError, ExportError, InvalidRecordError, WarehouseError};
pub use models::{ResultTable, UsageRecord};
