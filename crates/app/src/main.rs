use chrono::Utc;
use clap::Parser;
use pdf_ingest_core::{
    ingest_folder, ChromaStore, Embedder, FeatureHashEmbedder, LopdfExtractor, SplitterConfig,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-ingest", version)]
struct Cli {
    /// Folder that contains PDFs recursively.
    #[arg(long, default_value = "./data")]
    folder: String,

    /// ChromaDB base URL
    #[arg(long, default_value = "http://localhost:8000")]
    chroma_url: String,

    /// ChromaDB collection name
    #[arg(long, default_value = "pdf_chunks")]
    collection: String,

    /// Maximum chunk size in characters
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Characters of overlap between consecutive chunks
    #[arg(long, default_value = "200")]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = SplitterConfig::new(cli.chunk_size, cli.chunk_overlap)
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let extractor = LopdfExtractor;
    let embedder = FeatureHashEmbedder::default();
    let store = ChromaStore::new(&cli.chroma_url, &cli.collection, embedder.dimensions());

    info!(
        version = app_version,
        folder = %cli.folder,
        collection = %cli.collection,
        "pdf-ingest boot"
    );

    let folder = std::path::Path::new(&cli.folder);
    info!(folder = %cli.folder, "scanning for pdf files");

    let report = ingest_folder(folder, &config, &extractor, &embedder, &store)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    for loaded in &report.loaded_files {
        info!(path = %loaded.display(), "loaded pdf");
    }

    if !report.skipped_files.is_empty() {
        warn!(
            "skipped_files={} for folder={}",
            report.skipped_files.len(),
            cli.folder
        );
        for skipped in &report.skipped_files {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
        }
    }

    info!(chunk_count = report.chunk_count, "created chunks");

    if report.chunk_count == 0 {
        println!("Created 0 chunks.");
        return Ok(());
    }

    println!(
        "{} chunks ingested into '{}' at {}",
        report.records_persisted,
        cli.collection,
        Utc::now().to_rfc3339()
    );

    Ok(())
}
