//! Query result type definitions

use serde::{Deserialize, Serialize};

/// A single positional result row
pub type Row = Vec<serde_json::Value>;

/// Rows returned by a driver for one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names, in result order
    #[serde(default)]
    pub columns: Vec<String>,
    /// Result rows
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set from column names and rows
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Create an empty result set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project one column of every row as text
    ///
    /// Returns the zero-based index of the first row that is too short to
    /// hold `column`. String cells are taken verbatim, nulls become empty
    /// strings and any other value uses its JSON rendering.
    pub fn project(&self, column: usize) -> Result<Vec<String>, usize> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| row.get(column).map(value_to_text).ok_or(i))
            .collect()
    }
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
