use std::path::PathBuf;

pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for a whole sync run, from connecting to saving the scripts.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Connection(#[from] sql_connection::SqlError),

    #[error(transparent)]
    Describer(#[from] sql_schema_describer::DescriberError),

    #[error("could not determine the server version of the {role} database")]
    UnknownServerVersion { role: &'static str },

    #[error("Schema Sync requires MySQL version 5.0+ ({role} is v{version})")]
    UnsupportedServerVersion { role: &'static str, version: String },

    #[error("output directory does not exist: {}", path.display())]
    OutputDirectoryMissing { path: PathBuf },

    #[error("wildcard databases must be used on both the source and the target URL")]
    WildcardMismatch,

    #[error("could not read the config file at {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse the config file at {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed writing the migration script: {source}")]
    ScriptWrite {
        #[source]
        source: std::io::Error,
    },

    #[error("error sending the alert: {0}")]
    Alert(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
