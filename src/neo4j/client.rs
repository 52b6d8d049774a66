//! Neo4j-backed implementation of the database boundary

use super::models::*;
use super::traits::{GraphConnection, GraphSession};
use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query, Txn};
use std::sync::Arc;

/// Connection to a Neo4j server (cheaply cloneable, pooled by neo4rs)
#[derive(Clone)]
pub struct Neo4jConnection {
    graph: Arc<Graph>,
}

impl Neo4jConnection {
    /// Connect to Neo4j, optionally routing every session to a named database.
    pub async fn new(
        uri: &str,
        user: &str,
        password: &str,
        database: Option<&str>,
    ) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password);
        if let Some(db) = database {
            builder = builder.db(db);
        }
        let config = builder.build().context("Invalid Neo4j configuration")?;

        let graph = Graph::connect(config)
            .await
            .context("Failed to connect to Neo4j")?;

        tracing::info!("Connected to Neo4j at {}", uri);

        Ok(Self {
            graph: Arc::new(graph),
        })
    }
}

#[async_trait]
impl GraphConnection for Neo4jConnection {
    async fn open_session(&self) -> Result<Box<dyn GraphSession>> {
        let txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to open Neo4j session")?;
        Ok(Box::new(Neo4jSession {
            txn: Some(txn),
            failed: false,
        }))
    }
}

/// One transaction on a pooled connection.
///
/// Successful work is committed on close, mirroring auto-commit sessions;
/// a failed transaction is rolled back.
struct Neo4jSession {
    txn: Option<Txn>,
    failed: bool,
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn run(
        &mut self,
        cypher: &str,
        params: &QueryParams,
    ) -> std::result::Result<QueryResult, ExecutionFailure> {
        let txn = self
            .txn
            .as_mut()
            .ok_or_else(|| ExecutionFailure::other(None, "Session already closed"))?;

        let result = collect_rows(txn, cypher, build_query(cypher, params)).await;
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    async fn close(mut self: Box<Self>) {
        let Some(txn) = self.txn.take() else {
            return;
        };
        let outcome = if self.failed {
            txn.rollback().await
        } else {
            txn.commit().await
        };
        if let Err(e) = outcome {
            tracing::warn!("Failed to release Neo4j session cleanly: {}", e);
        }
    }
}

fn build_query(cypher: &str, params: &QueryParams) -> Query {
    let mut q = query(cypher);
    for (key, value) in params {
        q = match value {
            ParamValue::Boolean(b) => q.param(key, *b),
            ParamValue::Integer(i) => q.param(key, *i),
            ParamValue::Float(f) => q.param(key, *f),
            ParamValue::String(s) => q.param(key, s.clone()),
            ParamValue::List(items) => q.param(key, items.clone()),
        };
    }
    q
}

async fn collect_rows(
    txn: &mut Txn,
    cypher: &str,
    q: Query,
) -> std::result::Result<QueryResult, ExecutionFailure> {
    let mut stream = txn.execute(q).await.map_err(|e| classify_error(&e))?;

    let mut records = Vec::new();
    while let Some(row) = stream
        .next(txn.handle())
        .await
        .map_err(|e| classify_error(&e))?
    {
        let record = row.to_strict::<Record>().map_err(|e| {
            ExecutionFailure::other(None, format!("Failed to decode row: {}", e))
        })?;
        records.push(record);
    }

    let columns = header(return_columns(cypher), records.first());
    let rows = records
        .into_iter()
        .map(|mut record| {
            columns
                .iter()
                .map(|c| record.remove(c).unwrap_or(serde_json::Value::Null))
                .collect()
        })
        .collect();

    Ok(QueryResult::new(columns, rows))
}

type Record = serde_json::Map<String, serde_json::Value>;

/// Column header for a result.
///
/// neo4rs hands rows back as hash maps and keeps the field list private, so
/// the order comes from the query's own `RETURN` clause. It is used when it
/// names exactly the keys of the first row, or when there are no rows at all.
/// Otherwise the row keys are used, sorted.
fn header(declared: Option<Vec<String>>, first: Option<&Record>) -> Vec<String> {
    match (declared, first) {
        (Some(columns), None) => columns,
        (Some(columns), Some(record))
            if columns.len() == record.len() && columns.iter().all(|c| record.contains_key(c)) =>
        {
            columns
        }
        (_, Some(record)) => {
            let mut keys: Vec<String> = record.keys().cloned().collect();
            keys.sort();
            keys
        }
        (None, None) => Vec::new(),
    }
}

/// Column names projected by the last top-level `RETURN`, in order.
///
/// `None` when there is no such clause or it projects `*`. Unaliased items
/// are named by their expression text, as the server names them.
fn return_columns(cypher: &str) -> Option<Vec<String>> {
    let top = top_level_mask(cypher);
    let bytes = cypher.as_bytes();

    let start = *find_keyword(cypher, &top, "RETURN", 0..cypher.len()).last()? + "RETURN".len();
    let end = ["ORDER", "SKIP", "LIMIT"]
        .iter()
        .flat_map(|kw| find_keyword(cypher, &top, kw, start..cypher.len()))
        .chain((start..cypher.len()).filter(|&i| top[i] && bytes[i] == b';'))
        .min()
        .unwrap_or(cypher.len());

    let mut items = Vec::new();
    let mut item_start = start;
    for i in start..=end {
        if i == end || (top[i] && bytes[i] == b',') {
            items.push(item_start..i);
            item_start = i + 1;
        }
    }

    let mut columns = Vec::with_capacity(items.len());
    for (n, mut range) in items.into_iter().enumerate() {
        if n == 0 {
            if let Some(&at) = find_keyword(cypher, &top, "DISTINCT", range.clone()).first() {
                if cypher[range.start..at].trim().is_empty() {
                    range.start = at + "DISTINCT".len();
                }
            }
        }
        let name = match find_keyword(cypher, &top, "AS", range.clone()).last() {
            Some(&at) => cypher[at + "AS".len()..range.end].trim().trim_matches('`'),
            None => cypher[range].trim(),
        };
        if name.is_empty() || name == "*" {
            return None;
        }
        columns.push(name.to_string());
    }
    Some(columns)
}

/// Per byte: true when outside string literals, quoted names and brackets.
fn top_level_mask(cypher: &str) -> Vec<bool> {
    let bytes = cypher.as_bytes();
    let mut mask = Vec::with_capacity(bytes.len());
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for &b in bytes {
        if let Some(q) = quote {
            mask.push(false);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => {
                quote = Some(b);
                mask.push(false);
            }
            b'(' | b'[' | b'{' => {
                mask.push(false);
                depth += 1;
            }
            b')' | b']' | b'}' => {
                mask.push(false);
                depth = depth.saturating_sub(1);
            }
            _ => mask.push(depth == 0),
        }
    }
    mask
}

/// Top-level, whole-word, case-insensitive occurrences of `keyword` in `range`.
fn find_keyword(
    cypher: &str,
    top: &[bool],
    keyword: &str,
    range: std::ops::Range<usize>,
) -> Vec<usize> {
    let bytes = cypher.as_bytes();
    let kw = keyword.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'$';

    range
        .filter(|&i| {
            let end = i + kw.len();
            end <= bytes.len()
                && top[i]
                && bytes[i..end].eq_ignore_ascii_case(kw)
                && (i == 0 || !is_word(bytes[i - 1]))
                && bytes.get(end).map_or(true, |&b| !is_word(b))
        })
        .collect()
}

/// Map a neo4rs error onto the two-kind failure taxonomy.
pub fn classify_error(err: &neo4rs::Error) -> ExecutionFailure {
    match err {
        neo4rs::Error::Neo4j(e) => ExecutionFailure::from_status(e.code(), e.message()),
        other => classify_message(&other.to_string()),
    }
}

/// Fallback for errors that carry the server status only inside their text.
fn classify_message(message: &str) -> ExecutionFailure {
    let code = message
        .split(|c: char| c.is_whitespace() || c == ',' || c == '"' || c == ':')
        .find(|token| token.starts_with("Neo."));
    match code {
        Some(code) => ExecutionFailure::from_status(code, message),
        None => ExecutionFailure::other(None, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_message_with_embedded_syntax_code() {
        let failure = classify_message(
            "Neo.ClientError.Statement.SyntaxError: Invalid input 'RETRN' (line 1, column 20)",
        );
        assert_eq!(failure.kind, FailureKind::Syntax);
        assert_eq!(
            failure.code.as_deref(),
            Some("Neo.ClientError.Statement.SyntaxError")
        );
    }

    #[test]
    fn test_classify_message_without_code_is_other() {
        let failure = classify_message("connection reset by peer");
        assert_eq!(failure.kind, FailureKind::Other);
        assert!(failure.code.is_none());
        assert_eq!(failure.message, "connection reset by peer");
    }

    #[test]
    fn test_classify_message_with_non_syntax_code() {
        let failure = classify_message(
            "Neo.ClientError.Procedure.ProcedureNotFound: There is no procedure with the name `apoc.meta.data`",
        );
        assert_eq!(failure.kind, FailureKind::Other);
        assert!(failure.is_procedure_missing());
    }

    #[test]
    fn test_return_columns_keeps_projection_order() {
        let cypher = "MATCH (d:Drug)-[:CAUSES]->(s:SideEffect) \
                      RETURN s.name AS side_effect, count(*) AS reports \
                      ORDER BY reports DESC LIMIT 5";
        assert_eq!(
            return_columns(cypher),
            Some(vec!["side_effect".to_string(), "reports".to_string()])
        );
    }

    #[test]
    fn test_return_columns_unaliased_and_distinct() {
        assert_eq!(
            return_columns("match (d:Drug) return distinct d.name, d.code"),
            Some(vec!["d.name".to_string(), "d.code".to_string()])
        );
        assert_eq!(
            return_columns("MATCH (d) RETURN d.name AS `drug name`;"),
            Some(vec!["drug name".to_string()])
        );
    }

    #[test]
    fn test_return_columns_ignores_nested_and_quoted_keywords() {
        let cypher = "CALL { MATCH (n) RETURN n LIMIT 1 } \
                      WITH n WHERE n.note <> 'RETURN x' \
                      RETURN collect({a: 1, b: 2}) AS maps, n.limit AS cap";
        assert_eq!(
            return_columns(cypher),
            Some(vec!["maps".to_string(), "cap".to_string()])
        );
    }

    #[test]
    fn test_return_columns_star_or_missing() {
        assert_eq!(return_columns("MATCH (n) RETURN *"), None);
        assert_eq!(return_columns("CREATE (n:Drug {name: 'x'})"), None);
    }

    #[test]
    fn test_header_for_empty_result_uses_declared_columns() {
        let declared = return_columns("MATCH (d:Drug {name: 'x'}) RETURN d.name AS name");
        assert_eq!(header(declared, None), vec!["name"]);
        assert!(header(None, None).is_empty());
    }

    #[test]
    fn test_header_falls_back_to_sorted_row_keys() {
        let mut record = Record::new();
        record.insert("b".into(), serde_json::json!(1));
        record.insert("a".into(), serde_json::json!(2));

        // Declared names do not match what the server returned
        let declared = Some(vec!["x".to_string()]);
        assert_eq!(header(declared, Some(&record)), vec!["a", "b"]);

        let declared = Some(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(header(declared, Some(&record)), vec!["b", "a"]);
    }
}
