//! Natural-language rendering of a [`SchemaDescriptor`]
//!
//! Pure function of its input so the output can be snapshot-tested.

use super::models::*;
use std::collections::BTreeSet;

const NONE_LINE: &str = "(none)";

/// Render the descriptor as the grounding block handed to the model.
///
/// Sections always appear in this order: node properties, relationship
/// properties, relationship topology, then the closing directive.
pub fn render(schema: &SchemaDescriptor) -> String {
    let mut out = String::new();
    out.push_str("This is the schema representation of the graph database.\n");

    out.push_str("Node properties are the following:\n");
    if schema.node_types.is_empty() {
        out.push_str(NONE_LINE);
        out.push('\n');
    }
    for node in &schema.node_types {
        out.push_str(&format!("{} {}\n", node.label, property_list(&node.properties)));
    }

    out.push_str("Relationship properties are the following:\n");
    if schema.relationship_types.is_empty() {
        out.push_str(NONE_LINE);
        out.push('\n');
    }
    for rel in &schema.relationship_types {
        out.push_str(&format!("{} {}\n", rel.rel_type, property_list(&rel.properties)));
    }

    out.push_str("The relationships are the following (they point from source to target node):\n");
    if schema.topology.is_empty() {
        out.push_str(NONE_LINE);
        out.push('\n');
    }
    for entry in &schema.topology {
        out.push_str(&format!(
            "(:{})-[:{}]->(:{})\n",
            entry.source, entry.relationship, entry.target
        ));
    }

    out.push_str(
        "Make sure to respect relationship types and directions. \
         Relationships are directed from source to target. \
         Use only the node labels, relationship types and properties listed above.",
    );
    out
}

fn property_list(properties: &BTreeSet<String>) -> String {
    let joined = properties
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", joined)
}
