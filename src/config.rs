use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 1433;
const DEFAULT_APP_NAME: &str = "warehouse-export";

/// Connection settings for the SQL Server warehouse, read from the environment
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub app_name: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    /// Load `.env` if present, then read `DB_*` and `APP_NAME` from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let (server, server_port) = split_server(&require("DB_SERVER")?)?;
        let port = match server_port {
            Some(port) => port,
            None => match lookup("DB_PORT") {
                Some(value) => parse_port("DB_PORT", &value)?,
                None => DEFAULT_PORT,
            },
        };

        Ok(Self {
            server,
            port,
            database: require("DB_NAME")?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
            app_name: lookup("APP_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        })
    }

    /// `host:port` for display and for opening the TCP stream
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

/// Split ADO-style `host,port`; a `tcp:` prefix is tolerated
fn split_server(value: &str) -> Result<(String, Option<u16>), ConfigError> {
    let value = value.trim();
    let value = value.strip_prefix("tcp:").unwrap_or(value);

    match value.split_once(',') {
        Some((host, port)) => Ok((host.trim().to_string(), Some(parse_port("DB_SERVER", port)?))),
        None => Ok((value.to_string(), None)),
    }
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidPort {
        var,
        value: value.to_string(),
    })
}

/// Output file names for each job
#[derive(Debug, Clone, Deserialize)]
pub struct OutputFiles {
    #[serde(default = "default_top_rows_file")]
    pub top_rows: String,
    #[serde(default = "default_usage_counts_file")]
    pub usage_counts: String,
    #[serde(default = "default_usage_raw_file")]
    pub usage_raw: String,
    #[serde(default = "default_usage_buckets_file")]
    pub usage_buckets: String,
}

fn default_top_rows_file() -> String {
    "unuseddataorder_top50_by_date.csv".to_string()
}

fn default_usage_counts_file() -> String {
    "corelogic_usage_results.csv".to_string()
}

fn default_usage_raw_file() -> String {
    "corelogic_usage_counts.csv".to_string()
}

fn default_usage_buckets_file() -> String {
    "corelogic_usage_buckets.csv".to_string()
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            top_rows: default_top_rows_file(),
            usage_counts: default_usage_counts_file(),
            usage_raw: default_usage_raw_file(),
            usage_buckets: default_usage_buckets_file(),
        }
    }
}

/// Query and output settings, optionally loaded from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_identifier_column")]
    pub identifier_column: String,
    #[serde(default = "default_usage_column")]
    pub usage_column: String,
    #[serde(default = "default_program_type_column")]
    pub program_type_column: String,
    #[serde(default = "default_program_type_id")]
    pub program_type_id: i32,
    #[serde(default = "default_drop_date_from")]
    pub drop_date_from: NaiveDate,
    #[serde(default = "default_top_n")]
    pub top_n: u32,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub outputs: OutputFiles,
}

fn default_table() -> String {
    "MonsterDataGeneration.dbo.UnusedDataOrder".to_string()
}

fn default_date_column() -> String {
    "DropDate".to_string()
}

fn default_identifier_column() -> String {
    "CorelogicDataId".to_string()
}

fn default_usage_column() -> String {
    "Usage".to_string()
}

fn default_program_type_column() -> String {
    "ProgramTypeId".to_string()
}

fn default_program_type_id() -> i32 {
    95
}

fn default_drop_date_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 1).unwrap_or_default()
}

fn default_top_n() -> u32 {
    50
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            date_column: default_date_column(),
            identifier_column: default_identifier_column(),
            usage_column: default_usage_column(),
            program_type_column: default_program_type_column(),
            program_type_id: default_program_type_id(),
            drop_date_from: default_drop_date_from(),
            top_n: default_top_n(),
            output_dir: default_output_dir(),
            outputs: OutputFiles::default(),
        }
    }
}

impl ExportConfig {
    /// Load export settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: display,
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: ExportConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Table and column names are spliced into SQL text and must be plain identifiers
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [
            &self.table,
            &self.date_column,
            &self.identifier_column,
            &self.usage_column,
            &self.program_type_column,
        ] {
            if !is_plain_identifier(name) {
                return Err(ConfigError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(())
    }

    /// Header for the usage count files: the identifier and usage column names
    pub fn usage_header(&self) -> [&str; 2] {
        [self.identifier_column.as_str(), self.usage_column.as_str()]
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Dot-separated segments of ASCII letters, digits and underscores
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
