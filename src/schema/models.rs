//! Property-graph schema description

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A node label and the properties seen on nodes carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub label: String,
    pub properties: BTreeSet<String>,
}

/// A relationship type and the properties seen on relationships of that type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipType {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: BTreeSet<String>,
}

/// One allowed connection: `(source)-[:relationship]->(target)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopologyEntry {
    pub source: String,
    pub relationship: String,
    pub target: String,
}

/// Structured schema of a live database.
///
/// Built once per session and replaced whole on refresh; never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub node_types: Vec<NodeType>,
    pub relationship_types: Vec<RelationshipType>,
    pub topology: Vec<TopologyEntry>,
}

impl NodeType {
    pub fn new<I, S>(label: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.to_string(),
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }
}

impl RelationshipType {
    pub fn new<I, S>(rel_type: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rel_type: rel_type.to_string(),
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }
}

impl TopologyEntry {
    pub fn new(source: &str, relationship: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            relationship: relationship.to_string(),
            target: target.to_string(),
        }
    }
}

impl SchemaDescriptor {
    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty() && self.relationship_types.is_empty() && self.topology.is_empty()
    }

    pub fn node_type(&self, label: &str) -> Option<&NodeType> {
        self.node_types.iter().find(|n| n.label == label)
    }

    pub fn relationship_type(&self, rel_type: &str) -> Option<&RelationshipType> {
        self.relationship_types
            .iter()
            .find(|r| r.rel_type == rel_type)
    }
}
