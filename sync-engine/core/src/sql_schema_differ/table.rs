use super::{column, DiffOptions};
use crate::pair::Pair;
use sql_schema_describer::{Column, ForeignKey, Index, PrimaryKey, Table};

pub(crate) struct TableDiffer<'a> {
    pub(crate) tables: Pair<&'a Table>,
    pub(crate) opts: DiffOptions,
}

impl<'a> TableDiffer<'a> {
    pub(crate) fn previous(&self) -> &'a Table {
        self.tables.previous
    }

    pub(crate) fn next(&self) -> &'a Table {
        self.tables.next
    }

    pub(crate) fn added_columns(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.next()
            .columns
            .iter()
            .filter(move |next_column| !self.previous().has_column(&next_column.name))
    }

    pub(crate) fn dropped_columns(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.previous()
            .columns
            .iter()
            .filter(move |previous_column| !self.next().has_column(&previous_column.name))
    }

    pub(crate) fn column_pairs(&self) -> impl Iterator<Item = Pair<&'a Column>> + '_ {
        self.previous().columns.iter().filter_map(move |previous_column| {
            self.next()
                .column(&previous_column.name)
                .map(|next_column| Pair::new(previous_column, next_column))
        })
    }

    /// Indexes in `next` that have no identical counterpart in `previous`. A
    /// same-named index whose columns or kind changed shows up here _and_ in
    /// `dropped_indexes()`: it gets dropped and recreated.
    pub(crate) fn created_indexes(&self) -> impl Iterator<Item = &'a Index> + '_ {
        self.next()
            .indices
            .iter()
            .filter(move |next_index| match self.previous().index(&next_index.name) {
                Some(previous_index) => !indexes_match(previous_index, next_index),
                None => true,
            })
    }

    pub(crate) fn dropped_indexes(&self) -> impl Iterator<Item = &'a Index> + '_ {
        self.previous()
            .indices
            .iter()
            .filter(move |previous_index| match self.next().index(&previous_index.name) {
                Some(next_index) => !indexes_match(previous_index, next_index),
                None => true,
            })
    }

    pub(crate) fn created_foreign_keys(&self) -> impl Iterator<Item = (usize, &'a ForeignKey)> + '_ {
        self.next().foreign_keys.iter().enumerate().filter(move |(_, next_fk)| {
            !self
                .previous()
                .foreign_keys
                .iter()
                .any(|previous_fk| foreign_keys_match(previous_fk, next_fk))
        })
    }

    pub(crate) fn dropped_foreign_keys(&self) -> impl Iterator<Item = &'a ForeignKey> + '_ {
        self.previous().foreign_keys.iter().filter(move |previous_fk| {
            !self
                .next()
                .foreign_keys
                .iter()
                .any(|next_fk| foreign_keys_match(previous_fk, next_fk))
        })
    }

    pub(crate) fn created_primary_key(&self) -> Option<&'a PrimaryKey> {
        match self.tables.map(|t| t.primary_key.as_ref()).into_tuple() {
            (None, Some(next_pk)) => Some(next_pk),
            (Some(previous_pk), Some(next_pk)) if previous_pk.columns != next_pk.columns => Some(next_pk),
            (Some(previous_pk), Some(next_pk)) if self.primary_key_column_changed(previous_pk) => Some(next_pk),
            _ => None,
        }
    }

    pub(crate) fn dropped_primary_key(&self) -> Option<&'a PrimaryKey> {
        match self.tables.map(|t| t.primary_key.as_ref()).into_tuple() {
            (Some(previous_pk), None) => Some(previous_pk),
            (Some(previous_pk), Some(next_pk)) if previous_pk.columns != next_pk.columns => Some(previous_pk),
            (Some(previous_pk), Some(_)) if self.primary_key_column_changed(previous_pk) => Some(previous_pk),
            _ => None,
        }
    }

    /// The primary key columns are not changing, but the type of one of them
    /// is. The constraint must be dropped and recreated around the change.
    fn primary_key_column_changed(&self, previous_pk: &PrimaryKey) -> bool {
        self.column_pairs()
            .filter(|columns| {
                previous_pk
                    .columns
                    .iter()
                    .any(|pk_column| *pk_column == columns.previous.name)
            })
            .any(|columns| column::all_changes(columns, self.opts).type_changed())
    }

    pub(crate) fn comment_changed(&self) -> bool {
        self.opts.sync_comments && self.previous().comment != self.next().comment
    }

    pub(crate) fn engine_changed(&self) -> bool {
        match (&self.previous().engine, &self.next().engine) {
            (Some(previous), Some(next)) => previous != next,
            _ => false,
        }
    }

    pub(crate) fn charset_changed(&self) -> bool {
        match (&self.previous().charset, &self.next().charset) {
            (Some(previous), Some(next)) => {
                previous != next || self.previous().collation != self.next().collation
            }
            _ => false,
        }
    }

    pub(crate) fn auto_increment_changed(&self) -> bool {
        self.opts.sync_auto_increment
            && self.next().auto_increment.is_some()
            && self.previous().auto_increment != self.next().auto_increment
    }
}

fn indexes_match(previous: &Index, next: &Index) -> bool {
    previous.tpe == next.tpe
        && previous.columns.len() == next.columns.len()
        && previous
            .columns
            .iter()
            .zip(next.columns.iter())
            .all(|(previous_col, next_col)| {
                previous_col.name == next_col.name && previous_col.length == next_col.length
            })
}

fn foreign_keys_match(previous: &ForeignKey, next: &ForeignKey) -> bool {
    previous.constraint_name == next.constraint_name
        && previous.columns == next.columns
        && previous.referenced_table == next.referenced_table
        && previous.referenced_columns == next.referenced_columns
        && previous.on_delete_action == next.on_delete_action
        && previous.on_update_action == next.on_update_action
}

pub(crate) fn index_covers_fk(table: &Table, index: &Index) -> bool {
    table.foreign_keys.iter().any(|fk| {
        fk.columns.len() == index.columns.len()
            && fk
                .columns
                .iter()
                .zip(index.columns.iter())
                .all(|(fk_column, index_column)| *fk_column == index_column.name)
    })
}
