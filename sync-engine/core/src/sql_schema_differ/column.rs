use super::DiffOptions;
use crate::pair::Pair;
use enumflags2::BitFlags;
use sql_schema_describer::{Column, DefaultValue};

pub(crate) fn all_changes(columns: Pair<&Column>, opts: DiffOptions) -> ColumnChanges {
    let mut changes = BitFlags::empty();

    if columns.previous.tpe.arity != columns.next.tpe.arity {
        changes |= ColumnChange::Arity;
    }

    if !column_types_match(columns.previous, columns.next) {
        changes |= ColumnChange::TypeChanged;
    }

    if !defaults_match(&columns) {
        changes |= ColumnChange::Default;
    }

    if columns.previous.auto_increment != columns.next.auto_increment {
        changes |= ColumnChange::Autoincrement;
    }

    if opts.sync_comments && columns.previous.comment != columns.next.comment {
        changes |= ColumnChange::Comment;
    }

    ColumnChanges { changes }
}

/// The full data type as reported by the server, so display width, precision
/// and unsignedness are all part of the comparison.
fn column_types_match(previous: &Column, next: &Column) -> bool {
    previous.tpe.full_data_type.eq_ignore_ascii_case(&next.tpe.full_data_type)
}

fn defaults_match(columns: &Pair<&Column>) -> bool {
    match (&columns.previous.default, &columns.next.default) {
        (Some(DefaultValue::Value(previous)), Some(DefaultValue::Value(next))) => previous == next,
        (Some(DefaultValue::Now), Some(DefaultValue::Now)) => true,
        // Expression defaults come back with inconsistent casing between
        // server versions.
        (Some(DefaultValue::DbGenerated(previous)), Some(DefaultValue::DbGenerated(next))) => {
            previous.eq_ignore_ascii_case(next)
        }
        (None, None) => true,
        _ => false,
    }
}

#[enumflags2::bitflags]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnChange {
    Arity,
    Default,
    TypeChanged,
    Autoincrement,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnChanges {
    changes: BitFlags<ColumnChange>,
}

impl PartialOrd for ColumnChanges {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ColumnChanges {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.changes.bits().cmp(&other.changes.bits())
    }
}

impl ColumnChanges {
    pub fn differs_in_something(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ColumnChange> + '_ {
        self.changes.iter()
    }

    pub fn type_changed(&self) -> bool {
        self.changes.contains(ColumnChange::TypeChanged)
    }

    pub fn arity_changed(&self) -> bool {
        self.changes.contains(ColumnChange::Arity)
    }

    pub fn default_changed(&self) -> bool {
        self.changes.contains(ColumnChange::Default)
    }

    pub fn only_default_changed(&self) -> bool {
        self.changes == BitFlags::from(ColumnChange::Default)
    }

    pub fn autoincrement_changed(&self) -> bool {
        self.changes.contains(ColumnChange::Autoincrement)
    }

    pub fn comment_changed(&self) -> bool {
        self.changes.contains(ColumnChange::Comment)
    }
}
