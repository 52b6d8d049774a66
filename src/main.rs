//! Cypher Heal - command-line entry point
//!
//! Ask a question against a Neo4j database, or print the schema the model sees.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cypher_heal::{Answer, Config, QueryResult, TranslationSession};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cypher-heal")]
#[command(about = "Translate questions into Cypher and run them against Neo4j")]
struct Cli {
    /// Path to the YAML config file (default: ./config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a question, run it, and print the rows
    Ask {
        /// The question in natural language
        question: String,
    },

    /// Print the rendered schema sent to the model
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cypher_heal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let session = TranslationSession::connect(&config).await?;

    match cli.command {
        Commands::Ask { question } => run_ask(&session, &question).await,
        Commands::Schema => {
            println!("{}", session.schema_text().await);
            Ok(())
        }
    }
}

async fn run_ask(session: &TranslationSession, question: &str) -> Result<()> {
    match session.answer(question).await? {
        Answer::Success { query, result } => {
            println!("{}\n", query);
            print_table(&result);
            Ok(())
        }
        Answer::HealingExhausted(exhausted) => {
            for attempt in &exhausted.attempts {
                eprintln!("{}", attempt.candidate_query);
            }
            anyhow::bail!("{}", exhausted)
        }
    }
}

fn print_table(result: &QueryResult) {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(&result.columns));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        println!("{}", line(row));
    }
    println!("({} rows)", result.len());
}

fn render_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
