use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_qa_core::{
    build_ingestion_pipeline, build_query_pipeline, build_store, EngineConfig, VectorIndex,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant collection name
    #[arg(long, default_value = "document_qa_collection")]
    collection: String,

    /// Directory where raw uploaded PDFs are kept
    #[arg(long, default_value = "./data")]
    data_dir: String,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a PDF file, or every PDF under a folder, into the index.
    Ingest {
        /// PDF file or folder containing PDFs.
        #[arg(long)]
        path: String,
    },
    /// Ask a question grounded in the ingested documents.
    Ask {
        /// The question to answer.
        #[arg(long)]
        query: String,
        /// Number of chunks to retrieve as context.
        #[arg(long, default_value = "15")]
        top_k: usize,
    },
    /// Drop and recreate the collection. Destructive.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::from_env()?
        .with_qdrant_url(&cli.qdrant_url)
        .with_collection(&cli.collection)
        .with_data_dir(&cli.data_dir);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-qa boot"
    );

    match cli.command {
        Command::Ingest { path } => {
            let pipeline = build_ingestion_pipeline(&config);
            let target = Path::new(&path);

            if target.is_dir() {
                let report = pipeline
                    .ingest_folder_best_effort(target)
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

                for skipped in &report.skipped_files {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
                }
                for receipt in &report.receipts {
                    println!(
                        "{}: {} chunks (checksum {})",
                        receipt.source, receipt.chunk_count, receipt.checksum
                    );
                }
                println!(
                    "{} chunks ingested from {} file(s) at {}",
                    report.total_chunks(),
                    report.receipts.len(),
                    Utc::now().to_rfc3339()
                );
            } else {
                let receipt = pipeline
                    .ingest_file(target)
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;
                println!("{}: {} chunks ingested", receipt.source, receipt.chunk_count);
            }
        }
        Command::Ask { query, top_k } => {
            let mut config = config;
            config.n_results = top_k;

            let pipeline = build_query_pipeline(&config);
            let answer = pipeline
                .answer(&query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("{answer}");
        }
        Command::Reset => {
            let store = build_store(&config);
            store
                .reset()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("knowledge base reset");
        }
    }

    Ok(())
}
