mod column;
mod table;

pub use column::{ColumnChange, ColumnChanges};

use crate::{
    pair::Pair,
    sql_sync_step::{
        AddForeignKey, AlterColumn, AlterTable, CreateIndex, DropForeignKey, DropIndex, SqlSyncStep, TableChange,
    },
};
use sql_schema_describer::{Procedure, SqlSchema, Table, View};
use table::TableDiffer;

/// Which optional attributes take part in the comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    /// Compare table and column comments.
    pub sync_comments: bool,
    /// Compare AUTO_INCREMENT counters.
    pub sync_auto_increment: bool,
}

/// Compute the steps that turn the `previous` schema into the `next` schema.
///
/// Steps are returned in execution order. Swapping the sides of the pair
/// yields the revert steps.
pub fn calculate_steps(schemas: Pair<&SqlSchema>, opts: DiffOptions) -> Vec<SqlSyncStep> {
    let differ = SqlSchemaDiffer { schemas, opts };

    let (dropped_tables, mut dropped_foreign_keys) = differ.drop_tables();
    differ.drop_foreign_keys(&mut dropped_foreign_keys);

    let dropped_indexes = differ.drop_indexes();
    let created_indexes = differ.create_indexes();
    let alter_tables = differ.alter_tables();
    let added_foreign_keys = differ.add_foreign_keys();

    let (dropped_views, created_views) = differ.view_steps();
    let (dropped_triggers, created_triggers) = differ.trigger_steps();
    let (dropped_procedures, created_procedures) = differ.procedure_steps();

    // Order matters.
    dropped_foreign_keys
        .into_iter()
        .map(SqlSyncStep::DropForeignKey)
        .chain(dropped_indexes.into_iter().map(SqlSyncStep::DropIndex))
        .chain(alter_tables.into_iter().map(SqlSyncStep::AlterTable))
        .chain(dropped_views.into_iter().map(|view| SqlSyncStep::DropView { view }))
        .chain(
            dropped_triggers
                .into_iter()
                .map(|trigger| SqlSyncStep::DropTrigger { trigger }),
        )
        .chain(
            dropped_procedures
                .into_iter()
                .map(|procedure| SqlSyncStep::DropProcedure { procedure }),
        )
        .chain(dropped_tables.into_iter().map(|table| SqlSyncStep::DropTable { table }))
        .chain(differ.created_tables().map(|table| SqlSyncStep::CreateTable {
            table: table.name.clone(),
        }))
        .chain(created_indexes.into_iter().map(SqlSyncStep::CreateIndex))
        .chain(added_foreign_keys.into_iter().map(SqlSyncStep::AddForeignKey))
        .chain(created_views.into_iter().map(|view| SqlSyncStep::CreateView { view }))
        .chain(
            created_triggers
                .into_iter()
                .map(|trigger| SqlSyncStep::CreateTrigger { trigger }),
        )
        .chain(
            created_procedures
                .into_iter()
                .map(|procedure| SqlSyncStep::CreateProcedure { procedure }),
        )
        .collect()
}

struct SqlSchemaDiffer<'a> {
    schemas: Pair<&'a SqlSchema>,
    opts: DiffOptions,
}

impl<'a> SqlSchemaDiffer<'a> {
    fn table_pairs(&self) -> impl Iterator<Item = TableDiffer<'a>> + '_ {
        self.schemas.previous.tables.iter().filter_map(move |previous_table| {
            self.schemas
                .next
                .table(&previous_table.name)
                .map(|next_table| TableDiffer {
                    tables: Pair::new(previous_table, next_table),
                    opts: self.opts,
                })
        })
    }

    fn created_tables(&self) -> impl Iterator<Item = &'a Table> + '_ {
        self.schemas
            .next
            .tables
            .iter()
            .filter(move |next_table| !self.schemas.previous.has_table(&next_table.name))
    }

    fn dropped_tables(&self) -> impl Iterator<Item = &'a Table> + '_ {
        self.schemas
            .previous
            .tables
            .iter()
            .filter(move |previous_table| !self.schemas.next.has_table(&previous_table.name))
    }

    // We drop the foreign keys of dropped tables first, so we can drop the
    // tables in whatever order we please later.
    fn drop_tables(&self) -> (Vec<String>, Vec<DropForeignKey>) {
        let mut dropped_tables = Vec::new();
        let mut dropped_foreign_keys = Vec::new();

        for dropped_table in self.dropped_tables() {
            dropped_tables.push(dropped_table.name.clone());

            for fk in &dropped_table.foreign_keys {
                if let Some(constraint_name) = &fk.constraint_name {
                    dropped_foreign_keys.push(DropForeignKey {
                        table: dropped_table.name.clone(),
                        constraint_name: constraint_name.clone(),
                    });
                }
            }
        }

        (dropped_tables, dropped_foreign_keys)
    }

    fn drop_foreign_keys(&self, dropped_foreign_keys: &mut Vec<DropForeignKey>) {
        for tables in self.table_pairs() {
            for dropped_fk in tables.dropped_foreign_keys() {
                if let Some(constraint_name) = &dropped_fk.constraint_name {
                    dropped_foreign_keys.push(DropForeignKey {
                        table: tables.previous().name.clone(),
                        constraint_name: constraint_name.clone(),
                    });
                }
            }
        }
    }

    fn drop_indexes(&self) -> Vec<DropIndex> {
        let mut dropped_indexes = Vec::new();

        for tables in self.table_pairs() {
            for index in tables.dropped_indexes() {
                // On MySQL, foreign keys automatically create indexes. These
                // foreign-key-created indexes should only be dropped as part
                // of the foreign key.
                if table::index_covers_fk(tables.previous(), index) {
                    continue;
                }

                dropped_indexes.push(DropIndex {
                    table: tables.previous().name.clone(),
                    index: index.name.clone(),
                });
            }
        }

        dropped_indexes
    }

    // Indexes on created tables are rendered inside their CREATE TABLE
    // statement, so only table pairs contribute steps here.
    fn create_indexes(&self) -> Vec<CreateIndex> {
        let mut created_indexes = Vec::new();

        for tables in self.table_pairs() {
            for index in tables.created_indexes() {
                created_indexes.push(CreateIndex {
                    table: tables.next().name.clone(),
                    index: index.name.clone(),
                });
            }
        }

        created_indexes
    }

    fn alter_tables(&self) -> Vec<AlterTable> {
        let mut alter_tables = Vec::new();

        for tables in self.table_pairs() {
            // Order matters.
            let changes: Vec<TableChange> = tables
                .dropped_primary_key()
                .map(|_| TableChange::DropPrimaryKey)
                .into_iter()
                .chain(tables.dropped_columns().map(|column| TableChange::DropColumn {
                    column: column.name.clone(),
                }))
                .chain(tables.added_columns().map(|column| TableChange::AddColumn {
                    column: column.name.clone(),
                }))
                .chain(tables.column_pairs().filter_map(|columns| {
                    let changes = column::all_changes(columns, self.opts);

                    if !changes.differs_in_something() {
                        return None;
                    }

                    Some(TableChange::AlterColumn(AlterColumn {
                        column: columns.next.name.clone(),
                        changes,
                    }))
                }))
                .chain(tables.created_primary_key().map(|pk| TableChange::AddPrimaryKey {
                    columns: pk.columns.clone(),
                }))
                .chain(table_option_changes(&tables))
                .collect();

            if !changes.is_empty() {
                alter_tables.push(AlterTable {
                    table: tables.next().name.clone(),
                    changes,
                });
            }
        }

        alter_tables
    }

    fn add_foreign_keys(&self) -> Vec<AddForeignKey> {
        let mut added_foreign_keys = Vec::new();

        for created_table in self.created_tables() {
            for (foreign_key_index, _) in created_table.foreign_keys.iter().enumerate() {
                added_foreign_keys.push(AddForeignKey {
                    table: created_table.name.clone(),
                    foreign_key_index,
                });
            }
        }

        for tables in self.table_pairs() {
            for (foreign_key_index, _) in tables.created_foreign_keys() {
                added_foreign_keys.push(AddForeignKey {
                    table: tables.next().name.clone(),
                    foreign_key_index,
                });
            }
        }

        added_foreign_keys
    }

    fn view_steps(&self) -> (Vec<String>, Vec<String>) {
        let dropped = self
            .schemas
            .previous
            .views
            .iter()
            .filter(|previous_view| self.schemas.next.view(&previous_view.name).is_none())
            .map(|view| view.name.clone())
            .collect();

        // CREATE OR REPLACE covers both new and changed views.
        let created = self
            .schemas
            .next
            .views
            .iter()
            .filter(|next_view| next_view.definition.is_some())
            .filter(|next_view| match self.schemas.previous.view(&next_view.name) {
                Some(previous_view) => !views_match(previous_view, next_view),
                None => true,
            })
            .map(|view| view.name.clone())
            .collect();

        (dropped, created)
    }

    // MySQL has no CREATE OR REPLACE TRIGGER. A changed trigger is dropped
    // and recreated.
    fn trigger_steps(&self) -> (Vec<String>, Vec<String>) {
        let mut dropped = Vec::new();
        let mut created = Vec::new();

        for previous_trigger in &self.schemas.previous.triggers {
            match self.schemas.next.trigger(&previous_trigger.name) {
                Some(next_trigger) if previous_trigger != next_trigger => {
                    dropped.push(previous_trigger.name.clone());
                    created.push(next_trigger.name.clone());
                }
                Some(_) => (),
                None => dropped.push(previous_trigger.name.clone()),
            }
        }

        for next_trigger in &self.schemas.next.triggers {
            if self.schemas.previous.trigger(&next_trigger.name).is_none() {
                created.push(next_trigger.name.clone());
            }
        }

        (dropped, created)
    }

    fn procedure_steps(&self) -> (Vec<String>, Vec<String>) {
        let mut dropped = Vec::new();
        let mut created = Vec::new();

        for previous_procedure in &self.schemas.previous.procedures {
            match self.schemas.next.procedure(&previous_procedure.name) {
                Some(next_procedure) if !procedures_match(previous_procedure, next_procedure) => {
                    dropped.push(previous_procedure.name.clone());
                    created.push(next_procedure.name.clone());
                }
                Some(_) => (),
                None => dropped.push(previous_procedure.name.clone()),
            }
        }

        for next_procedure in &self.schemas.next.procedures {
            if self.schemas.previous.procedure(&next_procedure.name).is_none()
                && next_procedure.definition.is_some()
            {
                created.push(next_procedure.name.clone());
            }
        }

        (dropped, created)
    }
}

fn table_option_changes(tables: &TableDiffer<'_>) -> Vec<TableChange> {
    let mut changes = Vec::new();

    if tables.engine_changed() {
        if let Some(engine) = &tables.next().engine {
            changes.push(TableChange::SetEngine { engine: engine.clone() });
        }
    }

    if tables.charset_changed() {
        if let Some(charset) = &tables.next().charset {
            changes.push(TableChange::SetDefaultCharset {
                charset: charset.clone(),
                collation: tables.next().collation.clone(),
            });
        }
    }

    if tables.comment_changed() {
        changes.push(TableChange::SetComment {
            comment: tables.next().comment.clone(),
        });
    }

    if tables.auto_increment_changed() {
        if let Some(value) = tables.next().auto_increment {
            changes.push(TableChange::SetAutoIncrement { value });
        }
    }

    changes
}

fn views_match(previous: &View, next: &View) -> bool {
    match (&previous.definition, &next.definition) {
        (Some(previous), Some(next)) => previous.eq_ignore_ascii_case(next),
        // Without read access to one of the definitions we cannot compare.
        _ => true,
    }
}

fn procedures_match(previous: &Procedure, next: &Procedure) -> bool {
    match (&previous.definition, &next.definition) {
        (Some(previous), Some(next)) => previous.eq_ignore_ascii_case(next),
        _ => true,
    }
}
