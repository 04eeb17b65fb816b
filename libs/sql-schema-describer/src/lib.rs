//! Database description. This crate introspects a MySQL schema into an owned
//! model the sync engine can diff.

#![deny(rust_2018_idioms, unsafe_code)]

pub mod mysql;

mod error;
mod getters;

pub use error::{DescriberError, DescriberErrorKind, DescriberResult};

use serde::{Deserialize, Serialize};

/// The result of describing a database schema.
#[derive(Serialize, Deserialize, PartialEq, Debug, Default)]
pub struct SqlSchema {
    /// The schema's tables.
    pub tables: Vec<Table>,
    /// The schema's views.
    pub views: Vec<View>,
    /// The schema's triggers.
    pub triggers: Vec<Trigger>,
    /// The schema's stored procedures.
    pub procedures: Vec<Procedure>,
}

impl SqlSchema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }

    /// No objects of any kind.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty() && self.triggers.is_empty() && self.procedures.is_empty()
    }

    /// Drop every table whose name is not in `names`. Used for the
    /// exists-tables restriction and the name filters.
    pub fn retain_tables(&mut self, names: &[String]) {
        self.tables.retain(|t| names.contains(&t.name));
    }

    pub fn retain_views(&mut self, names: &[String]) {
        self.views.retain(|v| names.contains(&v.name));
    }

    pub fn retain_triggers(&mut self, names: &[String]) {
        self.triggers.retain(|t| names.contains(&t.name));
    }

    pub fn retain_procedures(&mut self, names: &[String]) {
        self.procedures.retain(|p| names.contains(&p.name));
    }
}

/// A table found in a schema.
#[derive(Serialize, Deserialize, PartialEq, Debug, Default)]
pub struct Table {
    /// The table's name.
    pub name: String,
    /// The table comment, when non-empty.
    pub comment: Option<String>,
    /// The storage engine, e.g. `InnoDB`.
    pub engine: Option<String>,
    /// The table's default character set.
    pub charset: Option<String>,
    /// The table's default collation.
    pub collation: Option<String>,
    /// The next AUTO_INCREMENT value, if the table has an auto-incrementing column.
    pub auto_increment: Option<u64>,
    /// The table's columns.
    pub columns: Vec<Column>,
    /// The table's indices.
    pub indices: Vec<Index>,
    /// The table's foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
    /// The table's primary key.
    pub primary_key: Option<PrimaryKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indices.iter().find(|i| i.name == name)
    }

    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_key.as_ref().map(|pk| pk.columns.as_slice()).unwrap_or(&[])
    }
}

/// A column of a table.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    pub tpe: ColumnType,
    /// Column default.
    pub default: Option<DefaultValue>,
    /// Is the column auto-incrementing?
    pub auto_increment: bool,
    /// The column comment, when non-empty.
    pub comment: Option<String>,
}

/// The type of a column.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct ColumnType {
    /// The base data type, e.g. `int` or `varchar`.
    pub data_type: String,
    /// The full SQL type necessary to recreate the column, drawn directly
    /// from the database, e.g. `int(10) unsigned` or `varchar(191)`.
    pub full_data_type: String,
    /// The arity of the column.
    pub arity: ColumnArity,
}

/// A column's arity.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub enum ColumnArity {
    /// Required column.
    Required,
    /// Nullable column.
    Nullable,
}

impl ColumnArity {
    pub fn is_nullable(&self) -> bool {
        matches!(self, ColumnArity::Nullable)
    }

    pub fn is_required(&self) -> bool {
        matches!(self, ColumnArity::Required)
    }
}

/// A default value for a column.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub enum DefaultValue {
    /// A constant literal.
    Value(String),
    /// An expression generating the current timestamp.
    Now,
    /// A database-generated expression default.
    DbGenerated(String),
}

impl DefaultValue {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            DefaultValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_now(&self) -> bool {
        matches!(self, DefaultValue::Now)
    }
}

/// The type of an index.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub enum IndexType {
    /// Unique type.
    Unique,
    /// Normal type.
    Normal,
    /// Fulltext type.
    Fulltext,
}

/// One column of an index, with an optional prefix length.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct IndexColumn {
    pub name: String,
    /// Prefix length for string columns, e.g. the 10 in `KEY (body(10))`.
    pub length: Option<u32>,
}

/// An index on a table.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// The index columns, in order.
    pub columns: Vec<IndexColumn>,
    /// The index type.
    pub tpe: IndexType,
}

impl Index {
    pub fn is_unique(&self) -> bool {
        matches!(self.tpe, IndexType::Unique)
    }
}

/// The primary key of a table.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct PrimaryKey {
    /// The primary key columns, in order.
    pub columns: Vec<String>,
}

/// Foreign key action types (for ON DELETE / ON UPDATE).
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub enum ForeignKeyAction {
    /// Produce an error indicating that the deletion or update would create
    /// a foreign key constraint violation. This is the default action.
    NoAction,
    /// Same as NoAction, checked immediately.
    Restrict,
    /// Delete or update the referencing rows along with the referenced row.
    Cascade,
    /// Set the referencing column(s) to null.
    SetNull,
    /// Set the referencing column(s) to their default values.
    SetDefault,
}

/// A foreign key constraint.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct ForeignKey {
    /// The constraint name, when available.
    pub constraint_name: Option<String>,
    /// The constrained columns, in order.
    pub columns: Vec<String>,
    /// The referenced table.
    pub referenced_table: String,
    /// The referenced columns, in order.
    pub referenced_columns: Vec<String>,
    pub on_delete_action: ForeignKeyAction,
    pub on_update_action: ForeignKeyAction,
}

/// An SQL view.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct View {
    /// Name of the view.
    pub name: String,
    /// The SQL definition of the view, with references to its own schema
    /// unqualified so definitions compare across databases.
    pub definition: Option<String>,
}

/// A trigger on a table.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Trigger {
    /// Name of the trigger.
    pub name: String,
    /// `BEFORE` or `AFTER`.
    pub timing: String,
    /// `INSERT`, `UPDATE` or `DELETE`.
    pub event: String,
    /// The table the trigger fires on.
    pub table: String,
    /// The trigger body.
    pub statement: String,
}

/// A stored procedure.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Procedure {
    /// Procedure name.
    pub name: String,
    /// The definition of the procedure.
    pub definition: Option<String>,
}
