use crate::{MysqlUrl, ResultSet, SqlConnection, SqlError, Value};
use mysql_async::{prelude::Queryable, Conn, Opts, OptsBuilder, Params, Pool, Row};

/// A pool of connections to one MySQL server.
///
/// For a wildcard URL no database is selected at connect time; every query
/// issued through the describer names its schema explicitly.
pub struct Mysql {
    url: MysqlUrl,
    pool: Pool,
}

impl Mysql {
    pub fn new(url: MysqlUrl) -> Self {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(url.host())
            .tcp_port(url.port())
            .user(Some(url.user()))
            .pass(url.password())
            .prefer_socket(false);

        if !url.is_wildcard() {
            builder = builder.db_name(Some(url.dbname()));
        }

        let pool = Pool::new(Opts::from(builder));

        Mysql { url, pool }
    }

    pub fn url(&self) -> &MysqlUrl {
        &self.url
    }

    async fn conn(&self) -> Result<Conn, SqlError> {
        self.pool
            .get_conn()
            .await
            .map_err(|source| SqlError::ConnectionError {
                host: self.url.host().to_owned(),
                port: self.url.port(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl SqlConnection for Mysql {
    async fn query_raw(&self, sql: &str, params: &[&str]) -> Result<ResultSet, SqlError> {
        tracing::trace!(sql, ?params, "query_raw");

        let mut conn = self.conn().await?;

        let rows: Vec<Row> = if params.is_empty() {
            conn.query(sql).await?
        } else {
            let params = Params::Positional(
                params
                    .iter()
                    .map(|param| mysql_async::Value::Bytes(param.as_bytes().to_vec()))
                    .collect(),
            );

            conn.exec(sql, params).await?
        };

        Ok(to_result_set(rows))
    }

    async fn execute_raw(&self, sql: &str) -> Result<u64, SqlError> {
        tracing::trace!(sql, "execute_raw");

        let mut conn = self.conn().await?;
        conn.query_drop(sql).await?;

        Ok(conn.affected_rows())
    }
}

fn to_result_set(rows: Vec<Row>) -> ResultSet {
    let columns: Vec<String> = rows
        .first()
        .map(|row| {
            row.columns_ref()
                .iter()
                .map(|col| col.name_str().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .into_iter()
        .map(|row| row.unwrap().into_iter().map(to_value).collect())
        .collect();

    ResultSet::new(columns, rows)
}

fn to_value(value: mysql_async::Value) -> Value {
    use mysql_async::Value as V;

    match value {
        V::NULL => Value::Null,
        V::Int(i) => Value::Integer(i),
        V::UInt(u) => i64::try_from(u)
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(u.to_string())),
        V::Float(f) => Value::Real(f64::from(f)),
        V::Double(d) => Value::Real(d),
        V::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Value::Text(s),
            Err(err) => Value::Bytes(err.into_bytes()),
        },
        V::Date(year, month, day, hour, minute, second, _) => Value::Text(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        )),
        V::Time(negative, days, hours, minutes, seconds, _) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            Value::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}
