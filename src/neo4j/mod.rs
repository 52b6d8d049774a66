//! Neo4j connection, sessions and result models

pub mod client;
pub mod mock;
pub mod models;
pub mod traits;

pub use client::Neo4jConnection;
pub use mock::MockGraphConnection;
pub use models::*;
pub use traits::{GraphConnection, GraphSession};
