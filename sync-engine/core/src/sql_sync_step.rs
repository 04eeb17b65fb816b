use crate::sql_schema_differ::ColumnChanges;

// The order of the variants matters for sorting. The steps are sorted _first_
// by variant, then by the contents.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SqlSyncStep {
    DropForeignKey(DropForeignKey),
    DropIndex(DropIndex),
    AlterTable(AlterTable),
    DropView { view: String },
    DropTrigger { trigger: String },
    DropProcedure { procedure: String },
    DropTable { table: String },
    CreateTable { table: String },
    CreateIndex(CreateIndex),
    AddForeignKey(AddForeignKey),
    CreateView { view: String },
    CreateTrigger { trigger: String },
    CreateProcedure { procedure: String },
}

impl SqlSyncStep {
    /// A human-readable name for the step.
    pub fn description(&self) -> &'static str {
        match self {
            SqlSyncStep::DropForeignKey(_) => "DropForeignKey",
            SqlSyncStep::DropIndex(_) => "DropIndex",
            SqlSyncStep::AlterTable(_) => "AlterTable",
            SqlSyncStep::DropView { .. } => "DropView",
            SqlSyncStep::DropTrigger { .. } => "DropTrigger",
            SqlSyncStep::DropProcedure { .. } => "DropProcedure",
            SqlSyncStep::DropTable { .. } => "DropTable",
            SqlSyncStep::CreateTable { .. } => "CreateTable",
            SqlSyncStep::CreateIndex(_) => "CreateIndex",
            SqlSyncStep::AddForeignKey(_) => "AddForeignKey",
            SqlSyncStep::CreateView { .. } => "CreateView",
            SqlSyncStep::CreateTrigger { .. } => "CreateTrigger",
            SqlSyncStep::CreateProcedure { .. } => "CreateProcedure",
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DropForeignKey {
    pub table: String,
    pub constraint_name: String,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DropIndex {
    pub table: String,
    pub index: String,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CreateIndex {
    pub table: String,
    pub index: String,
}

/// The foreign key is identified by its position in the next schema's table,
/// so unnamed constraints can be added too.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddForeignKey {
    pub table: String,
    pub foreign_key_index: usize,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AlterTable {
    pub table: String,
    pub changes: Vec<TableChange>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TableChange {
    DropPrimaryKey,
    DropColumn { column: String },
    AddColumn { column: String },
    AlterColumn(AlterColumn),
    AddPrimaryKey { columns: Vec<String> },
    SetEngine { engine: String },
    SetDefaultCharset { charset: String, collation: Option<String> },
    SetComment { comment: Option<String> },
    SetAutoIncrement { value: u64 },
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AlterColumn {
    pub column: String,
    pub changes: ColumnChanges,
}
