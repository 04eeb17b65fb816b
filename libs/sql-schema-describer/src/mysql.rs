//! MySQL schema description.

use crate::{getters::Getter, *};
use enumflags2::BitFlags;
use once_cell::sync::Lazy;
use regex::Regex;
use sql_connection::SqlConnection;
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashSet},
};
use tracing::trace;

/// Schemas that belong to the server itself and are never sync candidates.
pub const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "mysql", "performance_schema", "sys"];

fn is_mariadb(version: &str) -> bool {
    version.contains("MariaDB")
}

enum Flavour {
    Mysql,
    MariaDb,
}

impl Flavour {
    fn from_circumstances(circumstances: BitFlags<Circumstances>) -> Self {
        if circumstances.contains(Circumstances::MariaDb) {
            Self::MariaDb
        } else {
            Self::Mysql
        }
    }
}

#[enumflags2::bitflags]
#[derive(Clone, Copy, Debug)]
#[repr(u8)]
pub enum Circumstances {
    MariaDb,
    MySql56,
    MySql57,
}

/// Infer the server's circumstances from its reported version string.
pub fn circumstances(version: &str) -> BitFlags<Circumstances> {
    let mut circumstances = BitFlags::<Circumstances>::default();

    if is_mariadb(version) {
        circumstances |= Circumstances::MariaDb;
    }

    if version.contains("5.6") {
        circumstances |= Circumstances::MySql56;
    }

    if version.contains("5.7") {
        circumstances |= Circumstances::MySql57;
    }

    circumstances
}

pub struct SqlSchemaDescriber<'a> {
    conn: &'a dyn SqlConnection,
    circumstances: BitFlags<Circumstances>,
}

impl<'a> SqlSchemaDescriber<'a> {
    /// Constructor.
    pub fn new(conn: &'a dyn SqlConnection, circumstances: BitFlags<Circumstances>) -> SqlSchemaDescriber<'a> {
        SqlSchemaDescriber { conn, circumstances }
    }

    #[tracing::instrument(skip(self))]
    pub async fn describe(&self, schema: &str) -> DescriberResult<SqlSchema> {
        if !self.schema_exists(schema).await? {
            return Err(DescriberError::new_schema_does_not_exist(schema.to_owned()));
        }

        let flavour = Flavour::from_circumstances(self.circumstances);
        let mut sql_schema = SqlSchema::default();

        let mut tables = self.get_tables(schema).await?;
        let mut columns = self.get_all_columns(schema, &flavour).await?;
        let mut foreign_keys = self.get_foreign_keys(schema).await?;
        let mut indexes = self.get_indexes(schema).await?;

        for table in &mut tables {
            if let Some(cols) = columns.remove(&table.name) {
                table.columns = cols;
            }
            if let Some(fks) = foreign_keys.remove(&table.name) {
                table.foreign_keys = fks;
            }
            if let Some((indices, primary_key)) = indexes.remove(&table.name) {
                table.indices = indices;
                table.primary_key = primary_key;
            }
        }

        sql_schema.tables = tables;
        sql_schema.views = self.get_views(schema).await?;
        sql_schema.triggers = self.get_triggers(schema).await?;
        sql_schema.procedures = self.get_procedures(schema).await?;

        Ok(sql_schema)
    }

    /// The names of the databases on the server, without the system schemas.
    #[tracing::instrument(skip(self))]
    pub async fn list_databases(&self) -> DescriberResult<Vec<String>> {
        let sql = "
            SELECT schema_name AS schema_name
            FROM information_schema.schemata
            WHERE schema_name NOT IN ('information_schema', 'mysql', 'performance_schema', 'sys')
            ORDER BY schema_name
        ";
        let rows = self.conn.query_raw(sql, &[]).await?;
        let names = rows
            .into_iter()
            .map(|row| row.get_expect_string("schema_name"))
            .collect();

        trace!("Found schema names: {names:?}");

        Ok(names)
    }

    /// The names of the base tables in `schema`.
    #[tracing::instrument(skip(self))]
    pub async fn table_names(&self, schema: &str) -> DescriberResult<Vec<String>> {
        let sql = "
            SELECT table_name AS table_name
            FROM information_schema.tables
            WHERE table_schema = ? AND table_type = 'BASE TABLE'
            ORDER BY BINARY table_name
        ";
        let rows = self.conn.query_raw(sql, &[schema]).await?;
        let names = rows
            .into_iter()
            .map(|row| row.get_expect_string("table_name"))
            .collect();

        trace!("Found table names: {names:?}");

        Ok(names)
    }

    async fn schema_exists(&self, schema: &str) -> DescriberResult<bool> {
        let sql = "SELECT schema_name AS schema_name FROM information_schema.schemata WHERE schema_name = ?";
        Ok(!self.conn.query_raw(sql, &[schema]).await?.is_empty())
    }

    #[tracing::instrument(skip(self))]
    async fn get_tables(&self, schema: &str) -> DescriberResult<Vec<Table>> {
        // Only consider tables for which we can read at least one column.
        let sql = "
            SELECT DISTINCT
              BINARY table_info.table_name AS table_name,
              NULLIF(table_info.table_comment, '') AS table_comment,
              table_info.engine AS engine,
              table_info.auto_increment AS auto_increment,
              table_info.table_collation AS table_collation,
              ccsa.character_set_name AS character_set_name
            FROM information_schema.tables AS table_info
            JOIN information_schema.columns AS column_info
                ON BINARY column_info.table_name = BINARY table_info.table_name
            LEFT JOIN information_schema.collation_character_set_applicability AS ccsa
                ON table_info.table_collation = ccsa.collation_name
            WHERE
                table_info.table_schema = ?
                AND column_info.table_schema = ?
                -- Exclude views.
                AND table_info.table_type = 'BASE TABLE'
            ORDER BY BINARY table_info.table_name
        ";
        let rows = self.conn.query_raw(sql, &[schema, schema]).await?;
        let tables = rows
            .into_iter()
            .map(|row| Table {
                name: row.get_expect_string("table_name"),
                comment: row.get_string("table_comment"),
                engine: row.get_string("engine"),
                charset: row.get_string("character_set_name"),
                collation: row.get_string("table_collation"),
                auto_increment: row.get_u64("auto_increment"),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        trace!("Found {} tables", tables.len());

        Ok(tables)
    }

    async fn get_all_columns(
        &self,
        schema: &str,
        flavour: &Flavour,
    ) -> DescriberResult<BTreeMap<String, Vec<Column>>> {
        // We alias all the columns because MySQL column names are case-insensitive in queries, but
        // the information schema column names became upper-case in MySQL 8, causing the code
        // fetching the result values by column name below to fail.
        let sql = "
            SELECT
                column_name column_name,
                data_type data_type,
                column_type full_data_type,
                column_default column_default,
                is_nullable is_nullable,
                extra extra,
                table_name table_name,
                NULLIF(column_comment, '') AS column_comment
            FROM information_schema.columns
            WHERE table_schema = ?
            ORDER BY BINARY table_name, ordinal_position
        ";

        let mut map: BTreeMap<String, Vec<Column>> = BTreeMap::new();
        let rows = self.conn.query_raw(sql, &[schema]).await?;

        for col in rows {
            trace!("Got column: {col:?}");
            let table_name = col.get_expect_string("table_name");
            let name = col.get_expect_string("column_name");
            let data_type = col.get_expect_string("data_type");
            let full_data_type = col.get_expect_string("full_data_type");

            let is_nullable = col.get_expect_string("is_nullable").to_lowercase();
            let is_required = match is_nullable.as_ref() {
                "no" => true,
                "yes" => false,
                x => panic!("unrecognized is_nullable variant '{x}'"),
            };

            let arity = if is_required {
                ColumnArity::Required
            } else {
                ColumnArity::Nullable
            };

            let extra = col.get_expect_string("extra").to_lowercase();
            let auto_increment = extra.as_str() == "auto_increment";

            let default = match col.get_string("column_default") {
                None => None,
                Some(x) if x == "NULL" => None,
                Some(default_string) => Some(classify_default(default_string, &extra, flavour)),
            };

            map.entry(table_name).or_default().push(Column {
                name,
                tpe: ColumnType {
                    data_type,
                    full_data_type,
                    arity,
                },
                default,
                auto_increment,
                comment: col.get_string("column_comment"),
            });
        }

        Ok(map)
    }

    async fn get_foreign_keys(&self, schema: &str) -> DescriberResult<BTreeMap<String, Vec<ForeignKey>>> {
        // We alias all the columns because MySQL column names are case-insensitive in queries, but
        // the information schema column names became upper-case in MySQL 8, causing the code
        // fetching the result values by column name below to fail.
        let sql = "
            SELECT
                kcu.constraint_name constraint_name,
                kcu.column_name column_name,
                kcu.referenced_table_name referenced_table_name,
                kcu.referenced_column_name referenced_column_name,
                kcu.ordinal_position ordinal_position,
                kcu.table_name table_name,
                rc.delete_rule delete_rule,
                rc.update_rule update_rule
            FROM information_schema.key_column_usage AS kcu
            INNER JOIN information_schema.referential_constraints AS rc ON
                BINARY kcu.constraint_name = BINARY rc.constraint_name
            WHERE
                BINARY kcu.table_schema = ?
                AND BINARY rc.constraint_schema = ?
                AND kcu.referenced_column_name IS NOT NULL
            ORDER BY
                BINARY kcu.table_name,
                BINARY kcu.constraint_name,
                kcu.ordinal_position
        ";

        let result_set = self.conn.query_raw(sql, &[schema, schema]).await?;
        let mut map: BTreeMap<String, Vec<ForeignKey>> = BTreeMap::new();

        for row in result_set.into_iter() {
            trace!("Got description FK row {row:#?}");
            let table_name = row.get_expect_string("table_name");
            let constraint_name = row.get_expect_string("constraint_name");
            let column_name = row.get_expect_string("column_name");
            let referenced_table_name = row.get_expect_string("referenced_table_name");
            let referenced_column_name = row.get_expect_string("referenced_column_name");
            let on_delete_action = parse_referential_action(&row.get_expect_string("delete_rule"));
            let on_update_action = parse_referential_action(&row.get_expect_string("update_rule"));

            let fks = map.entry(table_name).or_default();

            match fks.last_mut() {
                Some(fk) if fk.constraint_name.as_deref() == Some(constraint_name.as_str()) => {
                    fk.columns.push(column_name);
                    fk.referenced_columns.push(referenced_column_name);
                }
                _ => fks.push(ForeignKey {
                    constraint_name: Some(constraint_name),
                    columns: vec![column_name],
                    referenced_table: referenced_table_name,
                    referenced_columns: vec![referenced_column_name],
                    on_delete_action,
                    on_update_action,
                }),
            }
        }

        Ok(map)
    }

    async fn get_indexes(&self, schema: &str) -> DescriberResult<BTreeMap<String, (Vec<Index>, Option<PrimaryKey>)>> {
        // We alias all the columns because MySQL column names are case-insensitive in queries, but
        // the information schema column names became upper-case in MySQL 8, causing the code
        // fetching the result values by column name below to fail.
        let sql = "
            SELECT DISTINCT
                table_name AS table_name,
                index_name AS index_name,
                non_unique AS non_unique,
                column_name AS column_name,
                seq_in_index AS seq_in_index,
                sub_part AS partial,
                index_type AS index_type
            FROM information_schema.statistics
            WHERE table_schema = ?
            ORDER BY BINARY table_name, index_name, seq_in_index
        ";
        let rows = self.conn.query_raw(sql, &[schema]).await?;

        // Multi-column indexes return one row per column. Expression indexes
        // have no column name and are filtered out wholesale.
        let mut indexes_map: BTreeMap<(String, String), Index> = BTreeMap::new();
        let mut primary_keys: BTreeMap<String, PrimaryKey> = BTreeMap::new();
        let mut filtered_out: HashSet<(String, String)> = HashSet::new();

        for row in rows {
            trace!("Got index row: {row:?}");
            let table_name = row.get_expect_string("table_name");
            let index_name = row.get_expect_string("index_name");
            let index_type = row.get_string("index_type");

            let column_name = match row.get_string("column_name") {
                Some(name) => name,
                None => {
                    filtered_out.insert((table_name, index_name));
                    continue;
                }
            };

            if index_type.as_deref() == Some("SPATIAL") {
                filtered_out.insert((table_name, index_name));
                continue;
            }

            let length = row.get_u32("partial");
            let is_unique = !row.get_expect_bool("non_unique");

            if index_name.eq_ignore_ascii_case("primary") {
                primary_keys
                    .entry(table_name)
                    .or_insert_with(|| PrimaryKey { columns: Vec::new() })
                    .columns
                    .push(column_name);
                continue;
            }

            let tpe = if is_unique {
                IndexType::Unique
            } else if index_type.as_deref() == Some("FULLTEXT") {
                IndexType::Fulltext
            } else {
                IndexType::Normal
            };

            indexes_map
                .entry((table_name, index_name.clone()))
                .or_insert_with(|| Index {
                    name: index_name,
                    columns: Vec::new(),
                    tpe,
                })
                .columns
                .push(IndexColumn { name: column_name, length });
        }

        for key in &filtered_out {
            indexes_map.remove(key);
        }

        let mut map: BTreeMap<String, (Vec<Index>, Option<PrimaryKey>)> = BTreeMap::new();

        for ((table_name, _), index) in indexes_map {
            map.entry(table_name).or_default().0.push(index);
        }

        for (table_name, pk) in primary_keys {
            map.entry(table_name).or_default().1 = Some(pk);
        }

        Ok(map)
    }

    #[tracing::instrument(skip(self))]
    async fn get_views(&self, schema: &str) -> DescriberResult<Vec<View>> {
        let sql = "
            SELECT TABLE_NAME AS view_name, VIEW_DEFINITION AS view_sql
            FROM INFORMATION_SCHEMA.VIEWS
            WHERE TABLE_SCHEMA = ?
            ORDER BY BINARY TABLE_NAME
        ";

        let result_set = self.conn.query_raw(sql, &[schema]).await?;
        let mut views = Vec::with_capacity(result_set.len());

        // The server qualifies every reference in the definition with the
        // schema name. Strip the qualification so definitions compare equal
        // across databases.
        let own_schema_prefix = format!("`{schema}`.");

        for row in result_set.into_iter() {
            views.push(View {
                name: row.get_expect_string("view_name"),
                definition: row.get_string("view_sql").map(|d| d.replace(&own_schema_prefix, "")),
            })
        }

        Ok(views)
    }

    #[tracing::instrument(skip(self))]
    async fn get_triggers(&self, schema: &str) -> DescriberResult<Vec<Trigger>> {
        let sql = "
            SELECT
                trigger_name AS trigger_name,
                action_timing AS action_timing,
                event_manipulation AS event_manipulation,
                event_object_table AS event_object_table,
                action_statement AS action_statement
            FROM information_schema.triggers
            WHERE trigger_schema = ?
            ORDER BY BINARY trigger_name
        ";

        let rows = self.conn.query_raw(sql, &[schema]).await?;
        let mut triggers = Vec::with_capacity(rows.len());

        for row in rows.into_iter() {
            triggers.push(Trigger {
                name: row.get_expect_string("trigger_name"),
                timing: row.get_expect_string("action_timing"),
                event: row.get_expect_string("event_manipulation"),
                table: row.get_expect_string("event_object_table"),
                statement: row.get_expect_string("action_statement"),
            });
        }

        Ok(triggers)
    }

    #[tracing::instrument(skip(self))]
    async fn get_procedures(&self, schema: &str) -> DescriberResult<Vec<Procedure>> {
        let sql = "
            SELECT routine_name AS name
            FROM information_schema.routines
            WHERE ROUTINE_SCHEMA = ?
            AND ROUTINE_TYPE = 'PROCEDURE'
            ORDER BY BINARY routine_name
        ";

        let rows = self.conn.query_raw(sql, &[schema]).await?;
        let mut procedures = Vec::with_capacity(rows.len());

        for row in rows.into_iter() {
            let name = row.get_expect_string("name");

            // routines.routine_definition only holds the body, without the
            // parameter list. SHOW CREATE PROCEDURE returns the complete
            // statement.
            let show_create = format!(
                "SHOW CREATE PROCEDURE `{}`.`{}`",
                schema.replace('`', "``"),
                name.replace('`', "``")
            );
            let create_rows = self.conn.query_raw(&show_create, &[]).await?;
            let definition = create_rows
                .first()
                .and_then(|row| row.get_string("Create Procedure"))
                .map(|definition| strip_definer(&definition));

            procedures.push(Procedure { name, definition });
        }

        Ok(procedures)
    }
}

/// Remove the DEFINER clause so definitions compare equal across servers
/// with different users.
fn strip_definer(create_statement: &str) -> String {
    static DEFINER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"DEFINER=\S+\s+").unwrap());

    DEFINER_RE.replace(create_statement, "").into_owned()
}

fn parse_referential_action(s: &str) -> ForeignKeyAction {
    match s.to_lowercase().as_str() {
        "cascade" => ForeignKeyAction::Cascade,
        "set null" => ForeignKeyAction::SetNull,
        "set default" => ForeignKeyAction::SetDefault,
        "restrict" => ForeignKeyAction::Restrict,
        "no action" => ForeignKeyAction::NoAction,
        s => panic!("Unrecognized referential action '{s}'"),
    }
}

fn classify_default(default_string: String, extra: &str, flavour: &Flavour) -> DefaultValue {
    if default_is_current_timestamp(&default_string) {
        return DefaultValue::Now;
    }

    match flavour {
        Flavour::MariaDb => {
            // MariaDB 10.2+ stores string literals quoted and everything else
            // as an expression.
            if matches!(default_string.chars().next(), Some('\'')) {
                DefaultValue::Value(unescape_and_unquote_default_string(default_string, flavour))
            } else if default_string.parse::<f64>().is_ok() {
                DefaultValue::Value(default_string)
            } else {
                dbgenerated_expression(&default_string)
            }
        }
        Flavour::Mysql => {
            if extra == "default_generated" {
                dbgenerated_expression(&default_string)
            } else {
                DefaultValue::Value(unescape_and_unquote_default_string(default_string, flavour))
            }
        }
    }
}

fn dbgenerated_expression(default_string: &str) -> DefaultValue {
    if matches!(default_string.chars().next(), Some('(')) {
        DefaultValue::DbGenerated(default_string.to_owned())
    } else {
        let mut introspected_default = String::with_capacity(default_string.len());
        introspected_default.push('(');
        introspected_default.push_str(default_string);
        introspected_default.push(')');
        DefaultValue::DbGenerated(introspected_default)
    }
}

// See https://dev.mysql.com/doc/refman/8.0/en/string-literals.html
//
// In addition, MariaDB will return string literals with the quotes and extra backslashes around
// control characters like `\n`.
fn unescape_and_unquote_default_string(default: String, flavour: &Flavour) -> String {
    static MYSQL_ESCAPING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\('|\\[^\\])|'(')").unwrap());
    static MARIADB_NEWLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\n").unwrap());
    static MARIADB_DEFAULT_QUOTE_UNESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(.*)'").unwrap());

    let maybe_unquoted: Cow<'_, str> = if matches!(flavour, Flavour::MariaDb) {
        let unquoted = MARIADB_DEFAULT_QUOTE_UNESCAPE_RE
            .captures(&default)
            .and_then(|cap| cap.get(1).map(|x| x.as_str()))
            .unwrap_or(&default);

        MARIADB_NEWLINE_RE.replace_all(unquoted, "\n")
    } else {
        default.into()
    };

    MYSQL_ESCAPING_RE.replace_all(&maybe_unquoted, "$1$2").into()
}

/// Tests whether an introspected default value should be categorized as current_timestamp.
fn default_is_current_timestamp(default_str: &str) -> bool {
    static MYSQL_CURRENT_TIMESTAMP_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^current_timestamp(\([0-9]*\))?$").unwrap());

    MYSQL_CURRENT_TIMESTAMP_RE.is_match(default_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sql_connection::{ResultSet, SqlError, Value};

    struct FakeConnection {
        responses: Vec<(&'static str, Vec<&'static str>, Vec<Vec<Value>>)>,
    }

    #[async_trait::async_trait]
    impl SqlConnection for FakeConnection {
        async fn query_raw(&self, sql: &str, _params: &[&str]) -> Result<ResultSet, SqlError> {
            for (needle, columns, rows) in &self.responses {
                if sql.contains(needle) {
                    let columns = columns.iter().map(|s| s.to_string()).collect();
                    return Ok(ResultSet::new(columns, rows.clone()));
                }
            }

            Ok(ResultSet::new(Vec::new(), Vec::new()))
        }

        async fn execute_raw(&self, _sql: &str) -> Result<u64, SqlError> {
            Ok(0)
        }
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_owned())
    }

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    #[test]
    fn circumstances_detect_mariadb_and_old_mysql() {
        assert!(circumstances("5.7.40-log").contains(Circumstances::MySql57));
        assert!(circumstances("5.6.51").contains(Circumstances::MySql56));
        assert!(circumstances("10.6.12-MariaDB").contains(Circumstances::MariaDb));
        assert!(circumstances("8.0.33").is_empty());
    }

    #[test]
    fn current_timestamp_defaults_are_detected() {
        assert!(default_is_current_timestamp("CURRENT_TIMESTAMP"));
        assert!(default_is_current_timestamp("current_timestamp()"));
        assert!(default_is_current_timestamp("CURRENT_TIMESTAMP(3)"));
        assert!(!default_is_current_timestamp("'CURRENT_TIMESTAMP'"));
    }

    #[test]
    fn mysql_string_defaults_are_unescaped() {
        let out = unescape_and_unquote_default_string(r"it\'s".to_owned(), &Flavour::Mysql);
        assert_eq!(out, "it's");
    }

    #[test]
    fn mariadb_quoted_defaults_are_unquoted() {
        let out = unescape_and_unquote_default_string("'hello'".to_owned(), &Flavour::MariaDb);
        assert_eq!(out, "hello");

        let with_newline = unescape_and_unquote_default_string(r"'a\nb'".to_owned(), &Flavour::MariaDb);
        assert_eq!(with_newline, "a\nb");
    }

    #[test]
    fn mysql8_expression_defaults_are_classified_as_generated() {
        let default = classify_default("uuid()".to_owned(), "default_generated", &Flavour::Mysql);
        assert_eq!(default, DefaultValue::DbGenerated("(uuid())".to_owned()));

        let default = classify_default("0".to_owned(), "", &Flavour::Mysql);
        assert_eq!(default, DefaultValue::Value("0".to_owned()));
    }

    #[tokio::test]
    async fn describe_fails_when_the_schema_does_not_exist() {
        let conn = FakeConnection { responses: Vec::new() };
        let describer = SqlSchemaDescriber::new(&conn, BitFlags::default());

        let err = describer.describe("missing").await.unwrap_err();

        match err.into_kind() {
            DescriberErrorKind::SchemaDoesNotExist(name) => assert_eq!(name, "missing"),
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn describe_assembles_tables_columns_and_indexes() {
        let conn = FakeConnection {
            responses: vec![
                (
                    "FROM information_schema.schemata WHERE schema_name = ?",
                    vec!["schema_name"],
                    vec![vec![text("biz")]],
                ),
                (
                    "collation_character_set_applicability",
                    vec![
                        "table_name",
                        "table_comment",
                        "engine",
                        "auto_increment",
                        "table_collation",
                        "character_set_name",
                    ],
                    vec![vec![
                        text("user"),
                        text("user accounts"),
                        text("InnoDB"),
                        int(42),
                        text("utf8mb4_general_ci"),
                        text("utf8mb4"),
                    ]],
                ),
                (
                    "FROM information_schema.columns",
                    vec![
                        "column_name",
                        "data_type",
                        "full_data_type",
                        "column_default",
                        "is_nullable",
                        "extra",
                        "table_name",
                        "column_comment",
                    ],
                    vec![
                        vec![
                            text("id"),
                            text("bigint"),
                            text("bigint(20) unsigned"),
                            Value::Null,
                            text("NO"),
                            text("auto_increment"),
                            text("user"),
                            Value::Null,
                        ],
                        vec![
                            text("email"),
                            text("varchar"),
                            text("varchar(191)"),
                            text(""),
                            text("NO"),
                            text(""),
                            text("user"),
                            text("login email"),
                        ],
                        vec![
                            text("created_at"),
                            text("datetime"),
                            text("datetime(3)"),
                            text("CURRENT_TIMESTAMP(3)"),
                            text("YES"),
                            text(""),
                            text("user"),
                            Value::Null,
                        ],
                    ],
                ),
                (
                    "FROM information_schema.statistics",
                    vec![
                        "table_name",
                        "index_name",
                        "non_unique",
                        "column_name",
                        "seq_in_index",
                        "partial",
                        "index_type",
                    ],
                    vec![
                        vec![text("user"), text("PRIMARY"), int(0), text("id"), int(1), Value::Null, text("BTREE")],
                        vec![
                            text("user"),
                            text("user_email_key"),
                            int(0),
                            text("email"),
                            int(1),
                            Value::Null,
                            text("BTREE"),
                        ],
                    ],
                ),
            ],
        };

        let describer = SqlSchemaDescriber::new(&conn, BitFlags::default());
        let schema = describer.describe("biz").await.unwrap();

        assert_eq!(schema.tables.len(), 1);

        let table = schema.table("user").unwrap();
        assert_eq!(table.comment.as_deref(), Some("user accounts"));
        assert_eq!(table.engine.as_deref(), Some("InnoDB"));
        assert_eq!(table.charset.as_deref(), Some("utf8mb4"));
        assert_eq!(table.auto_increment, Some(42));
        assert_eq!(table.columns.len(), 3);

        let id = table.column("id").unwrap();
        assert!(id.auto_increment);
        assert!(id.tpe.arity.is_required());
        assert_eq!(id.default, None);

        let email = table.column("email").unwrap();
        assert_eq!(email.default, Some(DefaultValue::Value(String::new())));
        assert_eq!(email.comment.as_deref(), Some("login email"));

        let created_at = table.column("created_at").unwrap();
        assert!(created_at.tpe.arity.is_nullable());
        assert_eq!(created_at.default, Some(DefaultValue::Now));

        assert_eq!(table.primary_key_columns(), &["id".to_owned()]);
        assert_eq!(table.indices.len(), 1);
        assert!(table.indices[0].is_unique());
    }

    #[tokio::test]
    async fn expression_indexes_are_filtered_out() {
        let conn = FakeConnection {
            responses: vec![
                (
                    "FROM information_schema.schemata WHERE schema_name = ?",
                    vec!["schema_name"],
                    vec![vec![text("biz")]],
                ),
                (
                    "collation_character_set_applicability",
                    vec![
                        "table_name",
                        "table_comment",
                        "auto_increment",
                        "table_collation",
                        "character_set_name",
                    ],
                    vec![vec![text("event"), Value::Null, Value::Null, Value::Null, Value::Null]],
                ),
                (
                    "FROM information_schema.statistics",
                    vec![
                        "table_name",
                        "index_name",
                        "non_unique",
                        "column_name",
                        "seq_in_index",
                        "partial",
                        "index_type",
                    ],
                    vec![
                        vec![
                            text("event"),
                            text("functional_idx"),
                            int(1),
                            Value::Null,
                            int(1),
                            Value::Null,
                            text("BTREE"),
                        ],
                        vec![
                            text("event"),
                            text("payload_prefix"),
                            int(1),
                            text("payload"),
                            int(1),
                            int(10),
                            text("BTREE"),
                        ],
                    ],
                ),
            ],
        };

        let describer = SqlSchemaDescriber::new(&conn, BitFlags::default());
        let schema = describer.describe("biz").await.unwrap();
        let table = schema.table("event").unwrap();

        assert_eq!(table.indices.len(), 1);
        assert_eq!(table.indices[0].name, "payload_prefix");
        assert_eq!(table.indices[0].columns[0].length, Some(10));
    }
}
