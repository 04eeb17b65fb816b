/// Error type for connection handling and query execution.
#[derive(Debug, thiserror::Error)]
pub enum SqlError {
    #[error("'{url}' is not a valid MySQL connection URL: {reason}")]
    InvalidConnectionUrl { url: String, reason: String },

    #[error("error connecting to {host}:{port}: {source}")]
    ConnectionError {
        host: String,
        port: u16,
        #[source]
        source: mysql_async::Error,
    },

    #[error("error querying the database: {0}")]
    QueryError(#[from] mysql_async::Error),
}

impl SqlError {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        SqlError::InvalidConnectionUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
