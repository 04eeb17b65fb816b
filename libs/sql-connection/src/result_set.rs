use std::sync::Arc;

/// An owned database value, as returned by a query.
///
/// MySQL's text protocol hands most scalars over as strings, so the
/// accessors are tolerant: `as_i64` parses digit strings, `as_bool`
/// accepts integers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// The value rendered as an owned string, `None` for NULL.
    pub fn to_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(i) => u64::try_from(*i).ok(),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_i64().map(|i| i != 0)
    }
}

/// A set of rows with their column names.
#[derive(Debug, Default)]
pub struct ResultSet {
    columns: Arc<Vec<String>>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        ResultSet {
            columns: Arc::new(columns),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn first(&self) -> Option<ResultRow> {
        self.get(0)
    }

    pub fn get(&self, index: usize) -> Option<ResultRow> {
        self.rows.get(index).map(|values| ResultRow {
            columns: Arc::clone(&self.columns),
            values: values.clone(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ResultRow> + '_ {
        (0..self.rows.len()).filter_map(move |idx| self.get(idx))
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultRow;
    type IntoIter = ResultSetIterator;

    fn into_iter(self) -> Self::IntoIter {
        ResultSetIterator {
            columns: self.columns,
            rows: self.rows.into_iter(),
        }
    }
}

pub struct ResultSetIterator {
    columns: Arc<Vec<String>>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl Iterator for ResultSetIterator {
    type Item = ResultRow;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.rows.next()?;
        Some(ResultRow {
            columns: Arc::clone(&self.columns),
            values,
        })
    }
}

/// One row of a [`ResultSet`], with access by column name or position.
#[derive(Debug)]
pub struct ResultRow {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl ResultRow {
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|col| col == name)?;
        self.values.get(idx)
    }

    /// `get`, treating NULL as absent.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|val| val.to_string())
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name)
            .and_then(|val| val.as_i64())
            .and_then(|i| u32::try_from(i).ok())
    }
}
