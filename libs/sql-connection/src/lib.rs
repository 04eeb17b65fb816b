//! Shared MySQL connection handling for the schema describer and the sync engine.

#![deny(rust_2018_idioms, unsafe_code)]

mod error;
mod mysql;
mod mysql_url;
mod result_set;

pub use error::SqlError;
pub use mysql::Mysql;
pub use mysql_url::MysqlUrl;
pub use result_set::{ResultRow, ResultSet, Value};

/// An asynchronous connection to a MySQL server.
///
/// The describer and the sync flow only talk to the database through this
/// trait, so tests can substitute a canned implementation.
#[async_trait::async_trait]
pub trait SqlConnection: Send + Sync {
    /// Execute a query, binding the parameters server-side, and return all rows.
    async fn query_raw(&self, sql: &str, params: &[&str]) -> Result<ResultSet, SqlError>;

    /// Execute a statement and return the number of affected rows.
    async fn execute_raw(&self, sql: &str) -> Result<u64, SqlError>;

    /// The server version string, e.g. `8.0.32-log` or `10.6.4-MariaDB`.
    async fn version(&self) -> Result<Option<String>, SqlError> {
        let result_set = self.query_raw("SELECT @@GLOBAL.version version", &[]).await?;

        Ok(result_set
            .first()
            .and_then(|row| row.get("version").and_then(|val| val.to_string())))
    }
}
