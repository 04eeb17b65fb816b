use sql_schema_describer::{Column, ForeignKeyAction};
use std::fmt::{self, Display, Write as _};

pub(crate) const SQL_INDENTATION: &str = "    ";

#[derive(Debug)]
pub(crate) enum Quoted<T> {
    Single(T),
    Backticks(T),
}

impl<T> Quoted<T> {
    pub(crate) fn mysql_ident(name: T) -> Quoted<T> {
        Quoted::Backticks(name)
    }

    pub(crate) fn mysql_string(contents: T) -> Quoted<T> {
        Quoted::Single(contents)
    }
}

impl<T> Display for Quoted<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quoted::Single(inner) => write!(f, "'{inner}'"),
            Quoted::Backticks(inner) => write!(f, "`{inner}`"),
        }
    }
}

pub(crate) fn render_nullability(column: &Column) -> &'static str {
    if column.tpe.arity.is_required() {
        " NOT NULL"
    } else {
        ""
    }
}

pub(crate) fn render_on_delete(on_delete: &ForeignKeyAction) -> &'static str {
    match on_delete {
        ForeignKeyAction::NoAction => "",
        ForeignKeyAction::Restrict => "ON DELETE RESTRICT",
        ForeignKeyAction::Cascade => "ON DELETE CASCADE",
        ForeignKeyAction::SetNull => "ON DELETE SET NULL",
        ForeignKeyAction::SetDefault => "ON DELETE SET DEFAULT",
    }
}

pub(crate) fn render_on_update(on_update: &ForeignKeyAction) -> &'static str {
    match on_update {
        ForeignKeyAction::NoAction => "",
        ForeignKeyAction::Restrict => "ON UPDATE RESTRICT",
        ForeignKeyAction::Cascade => "ON UPDATE CASCADE",
        ForeignKeyAction::SetNull => "ON UPDATE SET NULL",
        ForeignKeyAction::SetDefault => "ON UPDATE SET DEFAULT",
    }
}

pub(crate) trait IteratorJoin {
    fn join(self, sep: &str) -> String;
}

impl<T, I> IteratorJoin for T
where
    T: Iterator<Item = I>,
    I: Display,
{
    fn join(mut self, sep: &str) -> String {
        let (lower_bound, _) = self.size_hint();
        let mut out = String::with_capacity(sep.len() * lower_bound);

        if let Some(first_item) = self.next() {
            write!(out, "{first_item}").unwrap();
        }

        for item in self {
            out.push_str(sep);
            write!(out, "{item}").unwrap();
        }

        out
    }
}
