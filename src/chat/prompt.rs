//! System prompt composition

use super::types::ConversationTurn;

const TASK: &str = "Task: Generate Cypher queries to query a Neo4j graph database based on the provided schema definition.";

const INSTRUCTIONS: &[&str] = &[
    "Use only the provided relationship types and properties.",
    "Do not use any other relationship types or properties that are not provided.",
    "If you cannot generate a Cypher statement based on the provided schema, explain the reason to the user.",
    "Do not include any explanations or apologies in your responses.",
];

/// Build the system turn from a rendered schema block.
///
/// The task statement and the instructions are fixed text.
pub fn build_system_message(rendered_schema: &str) -> ConversationTurn {
    let mut content = String::with_capacity(rendered_schema.len() + 512);
    content.push_str(TASK);
    content.push_str("\nInstructions:\n");
    for line in INSTRUCTIONS {
        content.push_str(line);
        content.push('\n');
    }
    content.push_str("Schema:\n");
    content.push_str(rendered_schema);
    ConversationTurn::system(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::Role;

    #[test]
    fn test_system_message_contains_rules_and_schema() {
        let msg = build_system_message("Drug {code, name}");
        assert_eq!(msg.role, Role::System);
        assert!(msg.content.starts_with("Task: Generate Cypher"));
        for line in INSTRUCTIONS {
            assert!(msg.content.contains(line));
        }
        assert!(msg.content.ends_with("Schema:\nDrug {code, name}"));
    }

    #[test]
    fn test_rules_precede_schema() {
        let msg = build_system_message("SCHEMA_MARKER");
        let rules = msg.content.find("Use only the provided").unwrap();
        let schema = msg.content.find("SCHEMA_MARKER").unwrap();
        assert!(rules < schema);
    }
}
