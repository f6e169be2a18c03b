//! Canned query results.
//!
//! Tests hand a `QueryResult` a pre-built list of nodes (or rows); it then
//! behaves like an executed query. `nodes()` and `rows()` are independent
//! and restartable: each call starts a fresh lazy iterator.

use chrono::{DateTime, FixedOffset};

use crate::model::{Decimal, Node, Value};
use crate::{Error, Result};

/// Pseudo-column holding the row's node path.
pub const PATH_COLUMN: &str = "jcr:path";
/// Pseudo-column holding the row's relevance score.
pub const SCORE_COLUMN: &str = "jcr:score";

/// Query result over a fixed, ordered set of rows.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl QueryResult {
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self::from_rows(nodes.into_iter().map(ResultRow::new))
    }

    pub fn from_rows(rows: impl IntoIterator<Item = ResultRow>) -> Self {
        Self { columns: Vec::new(), rows: rows.into_iter().collect() }
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fresh iterator over the result nodes.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.rows.iter().map(|r| r.node.clone())
    }

    /// Fresh iterator over the result rows.
    pub fn rows(&self) -> impl Iterator<Item = &ResultRow> + '_ {
        self.rows.iter()
    }
}

/// A single row: one node plus a relevance score (0 unless set).
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    node: Node,
    score: f64,
}

impl ResultRow {
    pub fn new(node: Node) -> Self {
        Self { node, score: 0.0 }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn node(&self) -> &Node { &self.node }
    pub fn path(&self) -> String { self.node.path() }
    pub fn score(&self) -> f64 { self.score }

    /// Column value: the pseudo-columns, else the first value of the node's
    /// property of that name.
    pub fn value(&self, column: &str) -> Option<Value> {
        match column {
            PATH_COLUMN => Some(Value::string(self.path())),
            SCORE_COLUMN => Some(Value::from(self.score)),
            _ => self.node.get_property(column).map(|p| p.get_value()),
        }
    }

    pub fn values(&self, columns: &[&str]) -> Vec<Option<Value>> {
        columns.iter().map(|c| self.value(c)).collect()
    }

    /// Get a typed value from the row.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        let val = self.value(column)
            .ok_or_else(|| Error::NotFound(format!("Column '{column}'")))?;
        T::from_value(&val)
    }
}

/// Convert from Value to concrete types.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Self> { Ok(val.clone()) }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        val.get_string().ok_or_else(|| Error::ValueFormat {
            expected: "String".into(),
            got: "null".into(),
        })
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> { val.get_long() }
}

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<Self> { val.get_double() }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<Self> { val.get_boolean() }
}

impl FromValue for Decimal {
    fn from_value(val: &Value) -> Result<Self> { val.get_decimal() }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(val: &Value) -> Result<Self> {
        val.get_date()?.ok_or_else(|| Error::ValueFormat {
            expected: "Date".into(),
            got: "null".into(),
        })
    }
}
