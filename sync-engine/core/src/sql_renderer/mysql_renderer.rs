use super::common::{
    render_nullability, render_on_delete, render_on_update, IteratorJoin, Quoted, SQL_INDENTATION,
};
use crate::{
    pair::Pair,
    sql_schema_differ::{ColumnChanges, DiffOptions},
    sql_sync_step::{
        AddForeignKey, AlterTable, CreateIndex, DropForeignKey, DropIndex, SqlSyncStep, TableChange,
    },
};
use once_cell::sync::Lazy;
use regex::Regex;
use sql_schema_describer::{Column, DefaultValue, ForeignKey, Index, IndexType, SqlSchema, Table};
use std::{borrow::Cow, fmt::Write as _};

const MYSQL_IDENTIFIER_SIZE_LIMIT: usize = 64;

pub(super) fn render_step(step: &SqlSyncStep, schemas: Pair<&SqlSchema>, opts: DiffOptions) -> String {
    match step {
        SqlSyncStep::DropForeignKey(drop_foreign_key) => render_drop_foreign_key(drop_foreign_key),
        SqlSyncStep::DropIndex(drop_index) => render_drop_index(drop_index),
        SqlSyncStep::AlterTable(alter_table) => render_alter_table(alter_table, schemas, opts),
        SqlSyncStep::DropView { view } => format!("DROP VIEW {}", Quoted::mysql_ident(view)),
        SqlSyncStep::DropTrigger { trigger } => format!("DROP TRIGGER {}", Quoted::mysql_ident(trigger)),
        SqlSyncStep::DropProcedure { procedure } => {
            format!("DROP PROCEDURE {}", Quoted::mysql_ident(procedure))
        }
        SqlSyncStep::DropTable { table } => format!("DROP TABLE {}", Quoted::mysql_ident(table)),
        SqlSyncStep::CreateTable { table } => render_create_table(next_table(&schemas, table), opts),
        SqlSyncStep::CreateIndex(create_index) => render_create_index(create_index, &schemas),
        SqlSyncStep::AddForeignKey(add_foreign_key) => render_add_foreign_key(add_foreign_key, &schemas),
        SqlSyncStep::CreateView { view } => render_create_view(&schemas, view),
        SqlSyncStep::CreateTrigger { trigger } => render_create_trigger(&schemas, trigger),
        SqlSyncStep::CreateProcedure { procedure } => schemas
            .next
            .procedure(procedure)
            .and_then(|procedure| procedure.definition.clone())
            .expect("CreateProcedure step without a procedure definition"),
    }
}

fn next_table<'a>(schemas: &Pair<&'a SqlSchema>, name: &str) -> &'a Table {
    schemas
        .next
        .table(name)
        .expect("step references a table missing from the next schema")
}

fn render_drop_foreign_key(drop_foreign_key: &DropForeignKey) -> String {
    format!(
        "ALTER TABLE {} DROP FOREIGN KEY {}",
        Quoted::mysql_ident(&drop_foreign_key.table),
        Quoted::mysql_ident(&drop_foreign_key.constraint_name),
    )
}

fn render_drop_index(drop_index: &DropIndex) -> String {
    format!(
        "DROP INDEX {} ON {}",
        Quoted::mysql_ident(&drop_index.index),
        Quoted::mysql_ident(&drop_index.table),
    )
}

fn render_alter_table(alter_table: &AlterTable, schemas: Pair<&SqlSchema>, opts: DiffOptions) -> String {
    let tables = schemas.map(|schema| {
        schema
            .table(&alter_table.table)
            .expect("AlterTable on a table missing from one of the schemas")
    });

    let mut lines = Vec::with_capacity(alter_table.changes.len());

    for change in &alter_table.changes {
        match change {
            TableChange::DropPrimaryKey => lines.push("DROP PRIMARY KEY".to_owned()),
            TableChange::DropColumn { column } => {
                lines.push(format!("DROP COLUMN {}", Quoted::mysql_ident(column)))
            }
            TableChange::AddColumn { column } => {
                let column = tables
                    .next
                    .column(column)
                    .expect("AddColumn with a column missing from the next table");
                lines.push(format!("ADD COLUMN {}", render_column(column, opts)));
            }
            TableChange::AlterColumn(alter_column) => {
                let columns = tables.map(|table| {
                    table
                        .column(&alter_column.column)
                        .expect("AlterColumn on a column missing from one of the tables")
                });
                lines.push(render_alter_column(&columns, &alter_column.changes, opts));
            }
            TableChange::AddPrimaryKey { columns } => lines.push(format!(
                "ADD PRIMARY KEY ({})",
                columns.iter().map(Quoted::mysql_ident).join(", ")
            )),
            TableChange::SetEngine { engine } => lines.push(format!("ENGINE={engine}")),
            TableChange::SetDefaultCharset { charset, collation } => {
                let mut line = format!("DEFAULT CHARACTER SET {charset}");
                if let Some(collation) = collation {
                    write!(line, " COLLATE {collation}").unwrap();
                }
                lines.push(line);
            }
            TableChange::SetComment { comment } => lines.push(format!(
                "COMMENT={}",
                Quoted::mysql_string(escape_string_literal(comment.as_deref().unwrap_or_default()))
            )),
            TableChange::SetAutoIncrement { value } => lines.push(format!("AUTO_INCREMENT={value}")),
        }
    }

    format!(
        "ALTER TABLE {} {}",
        Quoted::mysql_ident(&alter_table.table),
        lines.join(",\n    ")
    )
}

// We don't use SET DEFAULT because it can't be used to set the default to an
// expression on most MySQL versions. We use MODIFY for default changes
// instead.
fn render_alter_column(columns: &Pair<&Column>, changes: &ColumnChanges, opts: DiffOptions) -> String {
    if changes.only_default_changed() && columns.next.default.is_none() {
        format!("ALTER COLUMN {} DROP DEFAULT", Quoted::mysql_ident(&columns.next.name))
    } else {
        format!("MODIFY {}", render_column(columns.next, opts))
    }
}

fn render_create_table(table: &Table, opts: DiffOptions) -> String {
    let columns = table
        .columns
        .iter()
        .map(|column| format!("{SQL_INDENTATION}{}", render_column(column, opts)))
        .join(",\n");

    let indexes = if table.indices.is_empty() {
        String::new()
    } else {
        let rendered = table
            .indices
            .iter()
            .map(|index| {
                format!(
                    "{}INDEX {}({})",
                    render_index_type(index),
                    Quoted::mysql_ident(truncate_index_name(&index.name)),
                    render_index_columns(index),
                )
            })
            .join(&format!(",\n{SQL_INDENTATION}"));

        format!(",\n{SQL_INDENTATION}{rendered}")
    };

    let primary_key = if table.primary_key_columns().is_empty() {
        String::new()
    } else {
        format!(
            ",\n{SQL_INDENTATION}PRIMARY KEY ({})",
            table.primary_key_columns().iter().map(Quoted::mysql_ident).join(",")
        )
    };

    format!(
        "CREATE TABLE {} (\n{columns}{indexes}{primary_key}\n){}",
        Quoted::mysql_ident(&table.name),
        render_table_options(table, opts),
    )
}

fn render_table_options(table: &Table, opts: DiffOptions) -> String {
    let mut options = String::new();

    if let Some(engine) = &table.engine {
        write!(options, " ENGINE={engine}").unwrap();
    }

    if let Some(charset) = &table.charset {
        write!(options, " DEFAULT CHARACTER SET {charset}").unwrap();

        if let Some(collation) = &table.collation {
            write!(options, " COLLATE {collation}").unwrap();
        }
    }

    if opts.sync_auto_increment {
        if let Some(value) = table.auto_increment {
            write!(options, " AUTO_INCREMENT={value}").unwrap();
        }
    }

    if opts.sync_comments {
        if let Some(comment) = &table.comment {
            write!(
                options,
                " COMMENT={}",
                Quoted::mysql_string(escape_string_literal(comment))
            )
            .unwrap();
        }
    }

    options
}

fn render_column(column: &Column, opts: DiffOptions) -> String {
    let default = column
        .default
        .as_ref()
        .map(|default| format!(" DEFAULT {}", render_default(default, column)))
        .unwrap_or_default();
    let auto_increment = if column.auto_increment { " AUTO_INCREMENT" } else { "" };
    let comment = match &column.comment {
        Some(comment) if opts.sync_comments => format!(
            " COMMENT {}",
            Quoted::mysql_string(escape_string_literal(comment))
        ),
        _ => String::new(),
    };

    format!(
        "{} {}{}{default}{auto_increment}{comment}",
        Quoted::mysql_ident(&column.name),
        render_column_type(column),
        render_nullability(column),
    )
}

fn render_column_type(column: &Column) -> &str {
    if !column.tpe.full_data_type.is_empty() {
        &column.tpe.full_data_type
    } else {
        &column.tpe.data_type
    }
}

fn render_default<'a>(default: &'a DefaultValue, column: &Column) -> Cow<'a, str> {
    match default {
        DefaultValue::DbGenerated(expression) => expression.as_str().into(),
        DefaultValue::Now => render_current_timestamp(column).into(),
        DefaultValue::Value(value) if default_needs_quoting(&column.tpe.data_type) => {
            Quoted::mysql_string(escape_string_literal(value)).to_string().into()
        }
        DefaultValue::Value(value) => value.as_str().into(),
    }
}

// The rendered CURRENT_TIMESTAMP must carry the fractional seconds precision
// of the column, otherwise the server rejects the default.
fn render_current_timestamp(column: &Column) -> String {
    static PRECISION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([0-9]+)\)").unwrap());

    match PRECISION_RE.captures(&column.tpe.full_data_type) {
        Some(captures) => format!("CURRENT_TIMESTAMP({})", &captures[1]),
        None => "CURRENT_TIMESTAMP".to_owned(),
    }
}

fn default_needs_quoting(data_type: &str) -> bool {
    matches!(
        data_type,
        "char"
            | "varchar"
            | "tinytext"
            | "text"
            | "mediumtext"
            | "longtext"
            | "enum"
            | "set"
            | "date"
            | "datetime"
            | "timestamp"
            | "time"
            | "json"
    )
}

fn truncate_index_name(name: &str) -> &str {
    if name.len() > MYSQL_IDENTIFIER_SIZE_LIMIT {
        &name[0..MYSQL_IDENTIFIER_SIZE_LIMIT]
    } else {
        name
    }
}

fn render_index_type(index: &Index) -> &'static str {
    match index.tpe {
        IndexType::Unique => "UNIQUE ",
        IndexType::Fulltext => "FULLTEXT ",
        IndexType::Normal => "",
    }
}

fn render_index_columns(index: &Index) -> String {
    index
        .columns
        .iter()
        .map(|column| match column.length {
            Some(length) => format!("{}({length})", Quoted::mysql_ident(&column.name)),
            None => Quoted::mysql_ident(&column.name).to_string(),
        })
        .join(", ")
}

fn render_create_index(create_index: &CreateIndex, schemas: &Pair<&SqlSchema>) -> String {
    let table = next_table(schemas, &create_index.table);
    let index = table
        .index(&create_index.index)
        .expect("CreateIndex with an index missing from the next table");

    let index_name = truncate_index_name(&index.name);

    format!(
        "CREATE {}INDEX {} ON {}({})",
        render_index_type(index),
        Quoted::mysql_ident(index_name),
        Quoted::mysql_ident(&table.name),
        render_index_columns(index),
    )
}

fn render_add_foreign_key(add_foreign_key: &AddForeignKey, schemas: &Pair<&SqlSchema>) -> String {
    let table = next_table(schemas, &add_foreign_key.table);
    let foreign_key = &table.foreign_keys[add_foreign_key.foreign_key_index];

    let constraint_clause = foreign_key
        .constraint_name
        .as_ref()
        .map(|name| format!("CONSTRAINT {} ", Quoted::mysql_ident(name)))
        .unwrap_or_default();

    format!(
        "ALTER TABLE {} ADD {constraint_clause}FOREIGN KEY ({}){}",
        Quoted::mysql_ident(&table.name),
        foreign_key.columns.iter().map(Quoted::mysql_ident).join(", "),
        render_references(foreign_key),
    )
}

fn render_references(foreign_key: &ForeignKey) -> String {
    let mut out = format!(
        " REFERENCES {}({})",
        Quoted::mysql_ident(&foreign_key.referenced_table),
        foreign_key.referenced_columns.iter().map(Quoted::mysql_ident).join(","),
    );

    let on_delete = render_on_delete(&foreign_key.on_delete_action);
    if !on_delete.is_empty() {
        out.push(' ');
        out.push_str(on_delete);
    }

    let on_update = render_on_update(&foreign_key.on_update_action);
    if !on_update.is_empty() {
        out.push(' ');
        out.push_str(on_update);
    }

    out
}

fn render_create_view(schemas: &Pair<&SqlSchema>, name: &str) -> String {
    let definition = schemas
        .next
        .view(name)
        .and_then(|view| view.definition.as_deref())
        .expect("CreateView step without a view definition");

    format!("CREATE OR REPLACE VIEW {} AS {definition}", Quoted::mysql_ident(name))
}

fn render_create_trigger(schemas: &Pair<&SqlSchema>, name: &str) -> String {
    let trigger = schemas
        .next
        .trigger(name)
        .expect("CreateTrigger step without a trigger");

    format!(
        "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {}",
        Quoted::mysql_ident(&trigger.name),
        trigger.timing,
        trigger.event,
        Quoted::mysql_ident(&trigger.table),
        trigger.statement,
    )
}

static STRING_LITERAL_CHARACTERS_TO_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'").unwrap());

fn escape_string_literal(s: &str) -> Cow<'_, str> {
    STRING_LITERAL_CHARACTERS_TO_ESCAPE_RE.replace_all(s, "'$0")
}
