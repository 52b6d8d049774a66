//! Schema extraction from the database's metadata facility
//!
//! Uses `apoc.meta.data()`. A server without APOC reports a missing
//! procedure, which is surfaced as [`Error::SchemaUnavailable`] rather than
//! an empty schema.

use super::models::*;
use crate::error::{Error, Result};
use crate::neo4j::{ExecutionFailure, GraphConnection, QueryParams, QueryResult};
use std::collections::{BTreeMap, BTreeSet};

/// Node labels with their non-relationship properties
pub const NODE_PROPERTIES_QUERY: &str = r#"
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE NOT type = "RELATIONSHIP" AND elementType = "node"
WITH label AS nodeLabel, collect(property) AS properties
RETURN nodeLabel AS label, properties
"#;

/// Relationship types with their properties
pub const REL_PROPERTIES_QUERY: &str = r#"
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE NOT type = "RELATIONSHIP" AND elementType = "relationship"
WITH label AS relType, collect(property) AS properties
RETURN relType AS label, properties
"#;

/// (source, relationship, target) triples; `other` lists every target label
pub const TOPOLOGY_QUERY: &str = r#"
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE type = "RELATIONSHIP" AND elementType = "node"
UNWIND other AS target
RETURN label AS source, property AS relationship, target
"#;

/// Run the three introspection queries and assemble a [`SchemaDescriptor`].
///
/// Uses one session for all three queries and releases it before returning.
pub async fn extract(connection: &dyn GraphConnection) -> Result<SchemaDescriptor> {
    let mut session = connection
        .open_session()
        .await
        .map_err(Error::connectivity)?;

    let params = QueryParams::new();
    let mut raw = Vec::with_capacity(3);
    for q in [NODE_PROPERTIES_QUERY, REL_PROPERTIES_QUERY, TOPOLOGY_QUERY] {
        match session.run(q, &params).await {
            Ok(result) => raw.push(result),
            Err(failure) => {
                session.close().await;
                return Err(introspection_error(failure));
            }
        }
    }
    session.close().await;

    let topology = raw.pop().unwrap_or_default();
    let rel_props = raw.pop().unwrap_or_default();
    let node_props = raw.pop().unwrap_or_default();

    let schema = SchemaDescriptor {
        node_types: parse_label_properties(&node_props)?
            .into_iter()
            .map(|(label, properties)| NodeType { label, properties })
            .collect(),
        relationship_types: parse_label_properties(&rel_props)?
            .into_iter()
            .map(|(rel_type, properties)| RelationshipType {
                rel_type,
                properties,
            })
            .collect(),
        topology: parse_topology(&topology)?,
    };

    tracing::info!(
        "Extracted schema: {} node types, {} relationship types, {} topology entries",
        schema.node_types.len(),
        schema.relationship_types.len(),
        schema.topology.len()
    );

    Ok(schema)
}

fn introspection_error(failure: ExecutionFailure) -> Error {
    if failure.is_procedure_missing() {
        Error::SchemaUnavailable(format!(
            "metadata procedure apoc.meta.data() is not available: {}",
            failure
        ))
    } else {
        Error::Connectivity(format!("introspection query failed: {}", failure))
    }
}

fn column(result: &QueryResult, name: &str) -> Result<usize> {
    result.column_index(name).ok_or_else(|| {
        Error::SchemaUnavailable(format!(
            "introspection result has no '{}' column (got {:?})",
            name, result.columns
        ))
    })
}

fn cell(row: &[serde_json::Value], idx: usize) -> Result<&serde_json::Value> {
    row.get(idx).ok_or_else(|| {
        Error::SchemaUnavailable(format!("introspection row is missing column {}", idx))
    })
}

fn as_str<'a>(value: &'a serde_json::Value, what: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        Error::SchemaUnavailable(format!("expected {} to be a string, got {}", what, value))
    })
}

/// Rows of (label, [property]) merged per label, sorted by label.
fn parse_label_properties(result: &QueryResult) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    if result.is_empty() {
        return Ok(out);
    }

    let label_idx = column(result, "label")?;
    let props_idx = column(result, "properties")?;

    for row in &result.rows {
        let label = as_str(cell(row, label_idx)?, "label")?;
        let props_value = cell(row, props_idx)?;
        let props = props_value.as_array().ok_or_else(|| {
            Error::SchemaUnavailable(format!(
                "expected properties of {} to be a list, got {}",
                label, props_value
            ))
        })?;

        let entry = out.entry(label.to_string()).or_default();
        for p in props {
            entry.insert(as_str(p, "property name")?.to_string());
        }
    }

    Ok(out)
}

fn parse_topology(result: &QueryResult) -> Result<Vec<TopologyEntry>> {
    if result.is_empty() {
        return Ok(Vec::new());
    }

    let source_idx = column(result, "source")?;
    let rel_idx = column(result, "relationship")?;
    let target_idx = column(result, "target")?;

    let mut entries = BTreeSet::new();
    for row in &result.rows {
        entries.insert(TopologyEntry::new(
            as_str(cell(row, source_idx)?, "source label")?,
            as_str(cell(row, rel_idx)?, "relationship type")?,
            as_str(cell(row, target_idx)?, "target label")?,
        ));
    }

    Ok(entries.into_iter().collect())
}
