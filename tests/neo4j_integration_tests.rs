//! Integration tests against a live Neo4j server
//!
//! These tests require Neo4j to be running; they skip themselves otherwise.
//! Run with: cargo test --test neo4j_integration_tests

use cypher_heal::neo4j::{
    FailureKind, GraphConnection, Neo4jConnection, ParamValue, QueryParams,
};
use cypher_heal::schema::extract;
use cypher_heal::translate::QueryExecutor;
use cypher_heal::{Config, Error};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Get test configuration from environment or use defaults
fn test_config() -> Config {
    Config {
        neo4j_uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".into()),
        neo4j_user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".into()),
        neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "neo4j".into()),
        neo4j_database: std::env::var("NEO4J_DATABASE").ok(),
        ..Config::default()
    }
}

/// Connect, or `None` when no server answers
async fn connect() -> Option<Arc<Neo4jConnection>> {
    let config = test_config();
    let connection = match Neo4jConnection::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
        config.neo4j_database.as_deref(),
    )
    .await
    {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("Neo4j not available at {}: {:#}", config.neo4j_uri, e);
            return None;
        }
    };

    let probe = QueryExecutor::new(Arc::new(connection.clone()))
        .execute("RETURN 1 AS n", &QueryParams::new())
        .await;
    if !matches!(probe, Ok(Ok(_))) {
        eprintln!("Neo4j not available at {}", config.neo4j_uri);
        return None;
    }
    Some(Arc::new(connection))
}

/// A label no other test run will collide with
fn scratch_label() -> String {
    format!("CypherHealTest_{}", Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_columns_follow_return_order() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };
    let executor = QueryExecutor::new(db);

    let result = executor
        .execute("RETURN 1 AS zeta, 'x' AS alpha, true AS mid", &QueryParams::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.columns, vec!["zeta", "alpha", "mid"]);
    assert_eq!(result.rows, vec![vec![json!(1), json!("x"), json!(true)]]);
}

#[tokio::test]
async fn test_empty_result_still_reports_header() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };
    let executor = QueryExecutor::new(db);
    let label = scratch_label();

    let result = executor
        .execute(
            &format!("MATCH (d:{} {{name: 'missing'}}) RETURN d.name AS name, d.code", label),
            &QueryParams::new(),
        )
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.columns, vec!["name", "d.code"]);
}

#[tokio::test]
async fn test_syntax_error_is_classified_as_syntax() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };
    let executor = QueryExecutor::new(db);

    let failure = executor
        .execute("MATCH (n) RETRN n", &QueryParams::new())
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Syntax);
    assert_eq!(
        failure.code.as_deref(),
        Some("Neo.ClientError.Statement.SyntaxError")
    );
    assert!(failure.message.contains("RETRN"));
}

#[tokio::test]
async fn test_missing_procedure_is_other_and_recognised() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };
    let executor = QueryExecutor::new(db);

    let failure = executor
        .execute("CALL cypherheal.does.not.exist()", &QueryParams::new())
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Other);
    assert!(failure.is_procedure_missing(), "got {:?}", failure);
}

#[tokio::test]
async fn test_extract_without_apoc_is_schema_unavailable() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };

    // Servers with APOC installed extract normally; without it the
    // missing procedure must surface as SchemaUnavailable.
    match extract(db.as_ref()).await {
        Ok(schema) => eprintln!(
            "APOC present: {} node types extracted",
            schema.node_types.len()
        ),
        Err(Error::SchemaUnavailable(message)) => {
            assert!(message.contains("apoc.meta.data"), "got {}", message)
        }
        Err(other) => panic!("expected SchemaUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_parameters_are_bound() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };
    let executor = QueryExecutor::new(db);

    let mut params = QueryParams::new();
    params.insert("name".into(), ParamValue::from("Aspirin"));
    params.insert("dose".into(), ParamValue::from(81i64));
    params.insert("ratio".into(), ParamValue::from(0.5f64));
    params.insert("otc".into(), ParamValue::from(true));
    params.insert(
        "aliases".into(),
        ParamValue::List(vec!["ASA".into(), "acetylsalicylic acid".into()]),
    );

    let result = executor
        .execute(
            "RETURN $name AS name, $dose AS dose, $ratio AS ratio, $otc AS otc, $aliases AS aliases",
            &params,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        result.rows[0],
        vec![
            json!("Aspirin"),
            json!(81),
            json!(0.5),
            json!(true),
            json!(["ASA", "acetylsalicylic acid"]),
        ]
    );
}

#[tokio::test]
async fn test_session_commits_on_success_and_rolls_back_on_failure() {
    let Some(db) = connect().await else {
        eprintln!("Skipping test: Neo4j not available");
        return;
    };
    let label = scratch_label();
    let count_query = format!("MATCH (n:{}) RETURN count(n) AS n", label);
    let params = QueryParams::new();

    // Successful work is visible to later sessions
    let mut session = db.open_session().await.unwrap();
    session
        .run(&format!("CREATE (:{} {{state: 'kept'}})", label), &params)
        .await
        .unwrap();
    session.close().await;

    // Work followed by a failure in the same session is discarded
    let mut session = db.open_session().await.unwrap();
    session
        .run(&format!("CREATE (:{} {{state: 'discarded'}})", label), &params)
        .await
        .unwrap();
    assert!(session.run("RETRN 1", &params).await.is_err());
    session.close().await;

    let executor = QueryExecutor::new(db.clone());
    let result = executor.execute(&count_query, &params).await.unwrap().unwrap();
    assert_eq!(result.rows, vec![vec![json!(1)]]);

    // Cleanup
    executor
        .execute(&format!("MATCH (n:{}) DELETE n", label), &params)
        .await
        .unwrap()
        .unwrap();
}
