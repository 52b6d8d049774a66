//! Value types crossing the database boundary

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tabular result of a query.
///
/// The header lives in `columns` and never appears in `rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&serde_json::Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }
}

/// A named query parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Named parameters for a query, ordered by name
pub type QueryParams = BTreeMap<String, ParamValue>;

/// The two failure classes the healing loop distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The query is not valid in the target language. Recoverable by healing.
    Syntax,
    /// Anything else: missing data, timeouts, lost connections.
    Other,
}

/// A classified query execution failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    /// Server status code when the database supplied one
    /// (e.g. `Neo.ClientError.Statement.SyntaxError`)
    pub code: Option<String>,
    pub message: String,
}

impl ExecutionFailure {
    pub fn syntax(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Syntax,
            code,
            message: message.into(),
        }
    }

    pub fn other(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            code,
            message: message.into(),
        }
    }

    /// Build a failure from a server status code, classifying it.
    pub fn from_status(code: &str, message: impl Into<String>) -> Self {
        Self {
            kind: classify_status_code(code),
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == FailureKind::Syntax
    }

    /// True when the server reported a missing procedure (e.g. APOC not installed)
    pub fn is_procedure_missing(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| c.ends_with("Procedure.ProcedureNotFound"))
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ExecutionFailure {}

/// Map a Neo4j status code to a failure class.
///
/// Only statement-level client errors that describe malformed query text
/// count as syntax failures. Semantic errors such as an unknown variable
/// are included because the model can fix them by reading the message.
pub fn classify_status_code(code: &str) -> FailureKind {
    const SYNTAX_CODES: &[&str] = &[
        "Neo.ClientError.Statement.SyntaxError",
        "Neo.ClientError.Statement.InvalidSyntax",
        "Neo.ClientError.Statement.SemanticError",
        "Neo.ClientError.Statement.InvalidSemantics",
        "Neo.ClientError.Statement.TypeError",
    ];
    if SYNTAX_CODES.contains(&code) {
        FailureKind::Syntax
    } else {
        FailureKind::Other
    }
}
