use sql_connection::SqlError;
use std::{
    error::Error,
    fmt::{self, Display},
};
use tracing_error::SpanTrace;

/// The result type.
pub type DescriberResult<T> = Result<T, DescriberError>;

/// Description errors.
#[derive(Debug)]
pub struct DescriberError {
    kind: DescriberErrorKind,
    context: SpanTrace,
}

impl DescriberError {
    /// The `DescriberErrorKind` wrapped by the error.
    pub fn into_kind(self) -> DescriberErrorKind {
        self.kind
    }

    /// The `DescriberErrorKind` wrapped by the error.
    pub fn kind(&self) -> &DescriberErrorKind {
        &self.kind
    }

    /// The `tracing_error::SpanTrace` contained in the error.
    pub fn span_trace(&self) -> SpanTrace {
        self.context.clone()
    }

    /// Construct an error about an input schema not existing in the database.
    pub fn new_schema_does_not_exist(name: String) -> Self {
        DescriberErrorKind::SchemaDoesNotExist(name).into()
    }
}

impl From<DescriberErrorKind> for DescriberError {
    fn from(kind: DescriberErrorKind) -> Self {
        Self {
            kind,
            context: SpanTrace::capture(),
        }
    }
}

/// Variants of DescriberError.
#[derive(Debug)]
pub enum DescriberErrorKind {
    /// An error originating from the database connection.
    ConnectionError(SqlError),
    /// An input schema for description does not exist.
    SchemaDoesNotExist(String),
}

impl Display for DescriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            DescriberErrorKind::ConnectionError(_) => {
                self.kind().fmt(f)?;
                self.context.fmt(f)
            }
            _ => self.kind().fmt(f),
        }
    }
}

impl Display for DescriberErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionError(err) => err.fmt(f),
            Self::SchemaDoesNotExist(unknown_schema) => {
                f.write_str("The following schema does not exist in the database: ")?;
                f.write_str(unknown_schema)
            }
        }
    }
}

impl Error for DescriberError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DescriberErrorKind::ConnectionError(err) => Some(err),
            DescriberErrorKind::SchemaDoesNotExist(_) => None,
        }
    }
}

impl From<SqlError> for DescriberError {
    fn from(err: SqlError) -> Self {
        DescriberError {
            kind: DescriberErrorKind::ConnectionError(err),
            context: SpanTrace::capture(),
        }
    }
}
