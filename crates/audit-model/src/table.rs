use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One cell of already-parsed tabular input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// A parsed row keyed by raw column header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, CellValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Input handed to the analysis engine by the parsing layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    /// Headers in file order.
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
    /// Field name to column name overrides that bypass detection.
    #[serde(default)]
    pub column_mapping: BTreeMap<String, String>,
}

impl AnalysisInput {
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            column_names,
            rows,
            column_mapping: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_column_mapping(mut self, mapping: BTreeMap<String, String>) -> Self {
        self.column_mapping = mapping;
        self
    }
}
