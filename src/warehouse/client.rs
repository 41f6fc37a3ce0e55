use futures_util::TryStreamExt;
use std::time::Duration;
use tiberius::{AuthMethod, Client, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::columns::UsageColumns;
use super::query;
use super::values::cell_to_text;
use crate::config::{ConnectionConfig, ExportConfig};
use crate::error::WarehouseError;
use crate::models::{ResultTable, UsageRecord};

/// Wrapper around the tiberius SQL Server client
pub struct WarehouseClient {
    client: Client<Compat<TcpStream>>,
}

impl WarehouseClient {
    /// Open a TCP stream and log in, giving up after `timeout`
    pub async fn connect(config: &ConnectionConfig, timeout: Duration) -> Result<Self, WarehouseError> {
        let mut tds = tiberius::Config::new();
        tds.host(&config.server);
        tds.port(config.port);
        tds.database(&config.database);
        tds.application_name(&config.app_name);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));
        tds.trust_cert();

        let login = async move {
            let tcp = TcpStream::connect(tds.get_addr()).await?;
            tcp.set_nodelay(true)?;
            let client = Client::connect(tds, tcp.compat_write()).await?;
            Ok::<_, WarehouseError>(client)
        };

        let client = tokio::time::timeout(timeout, login)
            .await
            .map_err(|_| WarehouseError::ConnectTimeout {
                server: config.address(),
                timeout,
            })??;

        Ok(Self { client })
    }

    /// `SELECT @@version`
    pub async fn server_version(&mut self) -> Result<String, WarehouseError> {
        let row = self
            .client
            .simple_query(query::SERVER_VERSION)
            .await?
            .into_row()
            .await?;

        match row {
            Some(row) => Ok(row.try_get::<&str, _>(0)?.unwrap_or_default().to_string()),
            None => Ok(String::new()),
        }
    }

    /// Most recent `limit` rows of the configured table, all columns as text
    pub async fn top_rows(&mut self, config: &ExportConfig, limit: u32) -> Result<ResultTable, WarehouseError> {
        let sql = query::top_rows(config);
        let limit = i64::from(limit);
        let params: [&dyn ToSql; 1] = [&limit];

        let mut stream = self.client.query(sql, &params).await?;
        let columns: Vec<String> = stream
            .columns()
            .await?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let mut table = ResultTable::new(columns);
        let mut rows = stream.into_row_stream();
        while let Some(row) = rows.try_next().await? {
            table.rows.push(row.into_iter().map(|cell| cell_to_text(&cell)).collect());
        }

        Ok(table)
    }

    /// Per-identifier usage counts, in the order the server returns them
    pub async fn usage_counts(&mut self, config: &ExportConfig) -> Result<Vec<UsageRecord>, WarehouseError> {
        let sql = query::usage_counts(config);
        let params: [&dyn ToSql; 2] = [&config.program_type_id, &config.drop_date_from];

        let mut stream = self.client.query(sql, &params).await?;
        let names: Vec<String> = stream
            .columns()
            .await?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let columns = UsageColumns::resolve(&names, &config.identifier_column, &config.usage_column)?;

        let mut records = Vec::new();
        let mut rows = stream.into_row_stream();
        while let Some(row) = rows.try_next().await? {
            let cells: Vec<_> = row.into_iter().collect();
            records.push(columns.record(&cells)?);
        }

        Ok(records)
    }

    pub async fn close(self) -> Result<(), WarehouseError> {
        self.client.close().await?;
        Ok(())
    }
}
